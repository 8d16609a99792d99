use num_bigint::BigUint;
use num_traits::Zero;

use crate::{CryptoError, Result};

const PUBLIC_EXPONENT: u64 = 65537;

/// A 1024-bit (or similar) RSA public key used to encrypt a block toward a
/// peer. Only the modulus and fixed public exponent are needed.
#[derive(Clone)]
pub struct RsaPublicKey {
    n: BigUint,
    e: BigUint,
    keysize: usize,
}

/// An RSA private key used to decrypt a block addressed to this side. No
/// CRT parameters are kept; decryption is the textbook `c^D mod N`.
#[derive(Clone)]
pub struct RsaPrivateKey {
    n: BigUint,
    d: BigUint,
    keysize: usize,
}

fn keysize_bytes(n: &BigUint) -> usize {
    n.bits().div_ceil(8) as usize
}

impl RsaPublicKey {
    /// Builds a key from a decimal-string modulus; the exponent is fixed at
    /// 65537, matching every RSA key this protocol ever presents.
    pub fn from_decimal_modulus(modulus: &str) -> std::result::Result<Self, num_bigint::ParseBigIntError> {
        let n: BigUint = modulus.parse()?;
        let keysize = keysize_bytes(&n);
        Ok(Self {
            n,
            e: BigUint::from(PUBLIC_EXPONENT),
            keysize,
        })
    }

    pub fn keysize(&self) -> usize {
        self.keysize
    }

    /// Left-aligns `plaintext` into a `keysize`-byte buffer (zero-padded on
    /// the right), then computes `c = m^E mod N`, emitting exactly
    /// `keysize` bytes, big-endian, left-padded with zeros.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        if plaintext.len() > self.keysize {
            return Err(CryptoError::InputTooLarge {
                len: plaintext.len(),
                keysize: self.keysize,
            });
        }
        let mut padded = vec![0u8; self.keysize];
        padded[..plaintext.len()].copy_from_slice(plaintext);

        let m = BigUint::from_bytes_be(&padded);
        let c = m.modpow(&self.e, &self.n);
        Ok(to_fixed_be(&c, self.keysize))
    }
}

impl RsaPrivateKey {
    /// Builds a private key from decimal-string modulus and private
    /// exponent; the public exponent is not needed for decryption.
    pub fn from_decimal_components(
        modulus: &str,
        private_exponent: &str,
    ) -> std::result::Result<Self, num_bigint::ParseBigIntError> {
        let n: BigUint = modulus.parse()?;
        let d: BigUint = private_exponent.parse()?;
        let keysize = keysize_bytes(&n);
        Ok(Self { n, d, keysize })
    }

    pub fn keysize(&self) -> usize {
        self.keysize
    }

    /// Computes `m = c^D mod N` and emits exactly `keysize` bytes,
    /// big-endian, left-padded with zeros.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Vec<u8> {
        let c = BigUint::from_bytes_be(ciphertext);
        let m = if self.d.is_zero() {
            BigUint::zero()
        } else {
            c.modpow(&self.d, &self.n)
        };
        to_fixed_be(&m, self.keysize)
    }
}

fn to_fixed_be(v: &BigUint, keysize: usize) -> Vec<u8> {
    let raw = v.to_bytes_be();
    let mut out = vec![0u8; keysize];
    // `raw` never exceeds `keysize` bytes: v is always reduced mod a
    // modulus that fits in `keysize` bytes.
    let start = keysize - raw.len();
    out[start..].copy_from_slice(&raw);
    out
}
