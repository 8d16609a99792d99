//! The per-connection session pipeline: handshake (RSA decrypt/re-encrypt,
//! dial the real backend, enable XTEA on both sides), login-portal reply
//! rewriting, and the game-portal S2C/C2S pump loops that run until either
//! side's transport fails.
//!
//! Every entry point is generic over the stream type so the same code
//! drives real `TcpStream` connections in production and `tokio::io::duplex`
//! pipes in tests (spec §8).

mod error;
mod handshake;
mod pump;
mod rewrite;

pub use error::{Result, SessionError};
pub use rewrite::rewrite_login_reply;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use tibia_assets::Registry;
use tibia_automation::{AutomationHost, AutomationModule};
use tibia_codec::{ByteReader, ByteWriter};
use tibia_crypto::{RsaPrivateKey, RsaPublicKey};
use tibia_protocol::login::{self, parse_login_result};
use tibia_transport::Endpoint;
use tibia_world::WorldState;

/// Everything a session needs that does not change per connection: the
/// proxy's own RSA keypair half, the real server's public key, the item
/// registry the protocol layer needs to decode item payloads, and the
/// banner/world identity this proxy presents to clients.
pub struct ProxyConfig {
    pub proxy_private_key: RsaPrivateKey,
    pub backend_public_key: RsaPublicKey,
    pub registry: Arc<Registry>,
    pub world_name: String,
    pub motd_banner: String,
    pub proxy_public_ip: u32,
    pub proxy_game_port: u16,
    pub dial_timeout: Duration,
}

impl ProxyConfig {
    #[cfg(test)]
    pub(crate) fn for_test(
        registry: Arc<Registry>,
        world_name: String,
        motd_banner: String,
        proxy_public_ip: u32,
        proxy_game_port: u16,
    ) -> Self {
        // A toy RSA keypair (p=61, q=53) big enough only to exercise the
        // handshake plumbing; never used outside this crate's own tests.
        Self {
            proxy_private_key: RsaPrivateKey::from_decimal_components("3233", "2753").unwrap(),
            backend_public_key: RsaPublicKey::from_decimal_modulus("3233").unwrap(),
            registry,
            world_name,
            motd_banner,
            proxy_public_ip,
            proxy_game_port,
            dial_timeout: Duration::from_secs(5),
        }
    }
}

async fn dial_backend<S, F, Fut>(dial: F, timeout: Duration) -> Result<S>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::io::Result<S>>,
{
    match tokio::time::timeout(timeout, dial()).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(SessionError::Io(e)),
        Err(_) => Err(SessionError::ConnectFailed),
    }
}

/// Drives one login-portal connection end to end: read the client's
/// handshake, decrypt/validate/re-encrypt it toward the backend, dial the
/// backend, relay its reply with the character list and MOTD rewritten to
/// point back at this proxy, then close both sides. A login connection
/// makes exactly one request/reply round trip (spec §4.7, §8.1, §8.2).
pub async fn run_login_session<S, F, Fut>(
    client_stream: S,
    config: Arc<ProxyConfig>,
    dial: F,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::io::Result<S>>,
{
    let client = Endpoint::new(client_stream, "client");

    let raw = client.read_message().await?;
    let (forward_bytes, xtea_key) = handshake::process_login_handshake(
        &raw,
        &config.proxy_private_key,
        &config.backend_public_key,
    )?;

    let server_stream = dial_backend(dial, config.dial_timeout).await?;
    let server = Endpoint::new(server_stream, "backend");
    server.write_message(&forward_bytes).await?;

    client.enable_xtea(xtea_key);
    server.enable_xtea(xtea_key);

    let reply_raw = server.read_message().await?;
    let mut r = ByteReader::new(&reply_raw);
    let mut result = parse_login_result(&mut r)?;
    rewrite::rewrite_login_reply(&mut result, &config);

    let mut w = ByteWriter::new();
    login::encode_login_result(&mut w, &result);
    let reply_bytes = w.finish().unwrap_or_default();
    client.write_message(&reply_bytes).await?;

    client.close().await;
    server.close().await;
    Ok(())
}

/// Drives one game-portal connection end to end: handshake, then spawn the
/// automation host and both pump loops and wait for the first terminal
/// error from either direction, tearing everything down once it arrives
/// (spec §4.7 steps 6-9, §7).
pub async fn run_game_session<S, F, Fut>(
    client_stream: S,
    config: Arc<ProxyConfig>,
    modules: Vec<Arc<dyn AutomationModule<S>>>,
    dial: F,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::io::Result<S>>,
{
    let client = Arc::new(Endpoint::new(client_stream, "client"));

    let raw = client.read_message().await?;
    let (forward_bytes, xtea_key) = handshake::process_game_handshake(
        &raw,
        &config.proxy_private_key,
        &config.backend_public_key,
    )?;

    let server_stream = dial_backend(dial, config.dial_timeout).await?;
    let server = Arc::new(Endpoint::new(server_stream, "backend"));
    server.write_message(&forward_bytes).await?;

    client.enable_xtea(xtea_key);
    server.enable_xtea(xtea_key);

    let world = Arc::new(WorldState::new());
    let automation: Arc<AutomationHost<S>> = Arc::new(AutomationHost::new());
    automation.start(modules, world.clone(), client.clone(), server.clone());

    let (err_tx, mut err_rx) = tokio::sync::mpsc::channel::<SessionError>(2);

    {
        let server = server.clone();
        let client = client.clone();
        let automation = automation.clone();
        let world = world.clone();
        let registry = config.registry.clone();
        let tx = err_tx.clone();
        tokio::spawn(async move {
            let err = pump::run_s2c_pump(server, client, automation, world, registry).await;
            let _ = tx.send(err).await;
        });
    }
    {
        let client = client.clone();
        let server = server.clone();
        let automation = automation.clone();
        let tx = err_tx.clone();
        tokio::spawn(async move {
            let err = pump::run_c2s_pump(client, server, automation).await;
            let _ = tx.send(err).await;
        });
    }
    drop(err_tx);

    let first_error = err_rx.recv().await;

    automation.stop().await;
    client.close().await;
    server.close().await;

    match first_error {
        Some(e) => {
            warn!("game session ended: {e}");
            Err(e)
        }
        None => {
            info!("game session ended: both pumps dropped their sender without error");
            Ok(())
        }
    }
}
