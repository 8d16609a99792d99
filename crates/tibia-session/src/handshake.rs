//! Handshake envelope handling: decrypt the client's RSA-encrypted
//! credentials block with the proxy's own private key, validate the check
//! byte, and re-encrypt the same plaintext fields toward the real server's
//! public key so the reconstructed packet can be forwarded unmodified in
//! shape.

use tibia_codec::{ByteReader, ByteWriter};
use tibia_crypto::{RsaPrivateKey, RsaPublicKey};
use tibia_protocol::login::{self, GameCredentials, LoginCredentials};

use crate::error::{Result, SessionError};

/// Decrypts and re-encrypts the login portal's first client packet,
/// returning the reconstructed bytes to forward to the real server and the
/// XTEA session key extracted from the plaintext.
pub fn process_login_handshake(
    raw: &[u8],
    proxy_key: &RsaPrivateKey,
    backend_key: &RsaPublicKey,
) -> Result<(Vec<u8>, [u32; 4])> {
    let mut r = ByteReader::new(raw);
    let envelope = login::decode_login_envelope(&mut r);
    if let Some(e) = r.err() {
        return Err(SessionError::MalformedHandshake(e));
    }

    let plaintext = proxy_key.decrypt(&envelope.encrypted_block);
    let mut cr = ByteReader::new(&plaintext);
    let creds = login::decode_login_credentials(&mut cr);
    if creds.check != 0 {
        return Err(SessionError::InvalidHandshake(creds.check));
    }

    let mut cw = ByteWriter::new();
    login::encode_login_credentials(&mut cw, &creds);
    let plain_bytes = cw.finish().map_err(SessionError::MalformedHandshake)?;
    let new_block = backend_key.encrypt(&plain_bytes)?;

    let mut forward_envelope = envelope;
    forward_envelope.encrypted_block = new_block;
    let mut w = ByteWriter::new();
    login::encode_envelope(&mut w, &forward_envelope);
    let bytes = w.finish().map_err(SessionError::MalformedHandshake)?;

    Ok((bytes, creds.xtea_key))
}

/// Same as [`process_login_handshake`] for the game portal's first client
/// packet, whose RSA block additionally carries a gamemaster flag and
/// character name.
pub fn process_game_handshake(
    raw: &[u8],
    proxy_key: &RsaPrivateKey,
    backend_key: &RsaPublicKey,
) -> Result<(Vec<u8>, [u32; 4])> {
    let mut r = ByteReader::new(raw);
    let envelope = login::decode_game_envelope(&mut r);
    if let Some(e) = r.err() {
        return Err(SessionError::MalformedHandshake(e));
    }

    let plaintext = proxy_key.decrypt(&envelope.encrypted_block);
    let mut cr = ByteReader::new(&plaintext);
    let creds = login::decode_game_credentials(&mut cr);
    if creds.check != 0 {
        return Err(SessionError::InvalidHandshake(creds.check));
    }

    let mut cw = ByteWriter::new();
    login::encode_game_credentials(&mut cw, &creds);
    let plain_bytes = cw.finish().map_err(SessionError::MalformedHandshake)?;
    let new_block = backend_key.encrypt(&plain_bytes)?;

    let mut forward_envelope = envelope;
    forward_envelope.encrypted_block = new_block;
    let mut w = ByteWriter::new();
    login::encode_envelope(&mut w, &forward_envelope);
    let bytes = w.finish().map_err(SessionError::MalformedHandshake)?;

    Ok((bytes, creds.xtea_key))
}

/// Re-exported so callers that need to inspect the decoded credentials
/// directly (tests, diagnostics) don't have to reach into `tibia_protocol`.
pub type DecodedLoginCredentials = LoginCredentials;
pub type DecodedGameCredentials = GameCredentials;

#[cfg(test)]
mod tests {
    use super::*;
    use tibia_protocol::login::{HandshakeEnvelope, decode_login_credentials};

    fn toy_keypair() -> (RsaPrivateKey, RsaPublicKey) {
        // p=61, q=53, n=3233, phi=3120, e=17, d=2753 (textbook toy key).
        let private = RsaPrivateKey::from_decimal_components("3233", "2753").unwrap();
        let public = RsaPublicKey::from_decimal_modulus("3233").unwrap();
        (private, public)
    }

    #[test]
    fn rejects_nonzero_check_byte() {
        let (priv_key, pub_key) = toy_keypair();
        // Encrypt a credentials block with check=1 using the matching toy
        // exponent (17) rather than the production E=65537 which isn't
        // coprime-sane for this tiny modulus.
        let mut cw = ByteWriter::new();
        let creds = LoginCredentials {
            check: 1,
            xtea_key: [1, 2, 3, 4],
            account_number: 1,
            password: "x".into(),
        };
        login::encode_login_credentials(&mut cw, &creds);
        let plain = cw.finish().unwrap();

        let padded_len = priv_key.keysize();
        let mut padded = vec![0u8; padded_len];
        let n = plain.len().min(padded_len);
        padded[..n].copy_from_slice(&plain[..n]);
        let m: num_bigint::BigUint = num_bigint::BigUint::from_bytes_be(&padded);
        let c = m.modpow(&num_bigint::BigUint::from(17u32), &"3233".parse::<num_bigint::BigUint>().unwrap());
        let mut ciphertext = c.to_bytes_be();
        while ciphertext.len() < padded_len {
            ciphertext.insert(0, 0);
        }

        let envelope = HandshakeEnvelope {
            protocol: 1,
            client_os: 1,
            client_version: 772,
            client_signatures: None,
            encrypted_block: ciphertext,
        };
        let mut w = ByteWriter::new();
        login::encode_envelope(&mut w, &envelope);
        let raw = w.finish().unwrap();

        let err = process_login_handshake(&raw, &priv_key, &pub_key).unwrap_err();
        assert!(matches!(err, SessionError::InvalidHandshake(1)));
    }

    #[test]
    fn decodes_credentials_shape() {
        let creds = LoginCredentials {
            check: 0,
            xtea_key: [1, 2, 3, 4],
            account_number: 42,
            password: "secret".into(),
        };
        let mut w = ByteWriter::new();
        login::encode_login_credentials(&mut w, &creds);
        let bytes = w.finish().unwrap();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(decode_login_credentials(&mut r), creds);
    }
}
