//! Shared support code for the end-to-end scenarios in `tests/`: a toy RSA
//! keypair small enough to exercise real `tibia_crypto` math, and the
//! canned wire fixtures each scenario builds on. There is no subprocess or
//! real server here; every scenario drives `tibia_session` directly over
//! `tokio::io::duplex` pipes standing in for the two TCP halves.

use num_bigint::BigUint;

use tibia_crypto::{RsaPrivateKey, RsaPublicKey};
use tibia_protocol::login;

/// `p=61, q=53 => n=3233`. The matched public exponent for this modulus is
/// `17`, not the production `65537` (too large relative to `phi(n)` to be
/// coprime-sane for a toy key this small), so `encrypt_toy` below uses `17`
/// directly rather than going through `RsaPublicKey::encrypt`, which always
/// uses `65537`.
pub const TOY_MODULUS: &str = "3233";
pub const TOY_PRIVATE_EXPONENT: &str = "2753";
const TOY_PUBLIC_EXPONENT: u32 = 17;

pub fn toy_keypair() -> (RsaPrivateKey, RsaPublicKey) {
    (
        RsaPrivateKey::from_decimal_components(TOY_MODULUS, TOY_PRIVATE_EXPONENT).unwrap(),
        RsaPublicKey::from_decimal_modulus(TOY_MODULUS).unwrap(),
    )
}

/// Encrypts `plain` toward the toy keypair's public side using its matched
/// `e=17`, left-aligned and zero-padded to `keysize` bytes exactly like
/// `RsaPublicKey::encrypt`.
pub fn encrypt_toy(plain: &[u8], keysize: usize) -> Vec<u8> {
    let mut padded = vec![0u8; keysize];
    padded[..plain.len()].copy_from_slice(plain);
    let m = BigUint::from_bytes_be(&padded);
    let n: BigUint = TOY_MODULUS.parse().unwrap();
    let c = m.modpow(&BigUint::from(TOY_PUBLIC_EXPONENT), &n);
    let mut bytes = c.to_bytes_be();
    while bytes.len() < keysize {
        bytes.insert(0, 0);
    }
    bytes
}

/// Builds the bytes of a canned game-portal handshake packet: unencrypted
/// header plus an RSA block encrypted toward the toy keypair, carrying
/// `check=0`, the given XTEA key, and the given credentials.
pub fn build_game_handshake(xtea_key: [u32; 4], account_number: u32, password: &str) -> Vec<u8> {
    let (priv_key, _pub_key) = toy_keypair();
    let creds = login::GameCredentials {
        check: 0,
        xtea_key,
        gamemaster: false,
        account_number,
        character_name: "Hero".into(),
        password: password.into(),
    };
    let mut cw = tibia_codec::ByteWriter::new();
    login::encode_game_credentials(&mut cw, &creds);
    let plain = cw.finish().unwrap();
    let encrypted = encrypt_toy(&plain, priv_key.keysize());

    let envelope = login::HandshakeEnvelope {
        protocol: 1,
        client_os: 1,
        client_version: 772,
        client_signatures: None,
        encrypted_block: encrypted,
    };
    let mut ew = tibia_codec::ByteWriter::new();
    login::encode_envelope(&mut ew, &envelope);
    ew.finish().unwrap()
}

/// Builds the bytes of a canned login-portal handshake packet.
pub fn build_login_handshake(xtea_key: [u32; 4], account_number: u32, password: &str) -> Vec<u8> {
    let (priv_key, _pub_key) = toy_keypair();
    let creds = login::LoginCredentials {
        check: 0,
        xtea_key,
        account_number,
        password: password.into(),
    };
    let mut cw = tibia_codec::ByteWriter::new();
    login::encode_login_credentials(&mut cw, &creds);
    let plain = cw.finish().unwrap();
    let encrypted = encrypt_toy(&plain, priv_key.keysize());

    let envelope = login::HandshakeEnvelope {
        protocol: 1,
        client_os: 1,
        client_version: 772,
        client_signatures: Some((1, 2, 3)),
        encrypted_block: encrypted,
    };
    let mut ew = tibia_codec::ByteWriter::new();
    login::encode_envelope(&mut ew, &envelope);
    ew.finish().unwrap()
}

/// A `tibia_session::ProxyConfig` built on the toy keypair, for scenarios
/// that need a full config rather than just the RSA primitives.
pub fn test_proxy_config(
    registry: std::sync::Arc<tibia_assets::Registry>,
    world_name: impl Into<String>,
    motd_banner: impl Into<String>,
    proxy_public_ip: u32,
    proxy_game_port: u16,
) -> tibia_session::ProxyConfig {
    let (priv_key, pub_key) = toy_keypair();
    tibia_session::ProxyConfig {
        proxy_private_key: priv_key,
        backend_public_key: pub_key,
        registry,
        world_name: world_name.into(),
        motd_banner: motd_banner.into(),
        proxy_public_ip,
        proxy_game_port,
        dial_timeout: std::time::Duration::from_secs(5),
    }
}
