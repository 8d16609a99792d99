use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decrypt failed: {0}")]
    Decrypt(#[from] tibia_crypto::CryptoError),
    #[error("decrypted plaintext shorter than the 2-byte inner length")]
    ShortPlaintext,
    #[error("malformed packet: inner length {inner_len} exceeds plaintext size {available}")]
    MalformedPacket { inner_len: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, TransportError>;
