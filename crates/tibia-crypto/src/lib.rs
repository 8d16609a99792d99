//! Textbook RSA (no padding) and XTEA primitives used by the Tibia 7.72
//! handshake and per-session wire encryption.

mod rsa;
mod xtea;

pub use rsa::{RsaPrivateKey, RsaPublicKey};
pub use xtea::{xtea_decrypt, xtea_encrypt};

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    #[error("plaintext of {len} bytes exceeds the {keysize}-byte RSA key size")]
    InputTooLarge { len: usize, keysize: usize },
    #[error("ciphertext length {len} is not a multiple of the 8-byte XTEA block size")]
    MisalignedCiphertext { len: usize },
}

pub type Result<T> = std::result::Result<T, CryptoError>;
