//! The two directional pump loops a running game session spawns once the
//! handshake has completed: S2C (server to client) and C2S (client to
//! server). Each loop reads one framed message, runs it through the
//! automation host's intercept hook, forwards it, and returns its first
//! terminal error to the caller; the session layer decides what to do
//! about that.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use tibia_assets::Registry;
use tibia_automation::AutomationHost;
use tibia_codec::ByteReader;
use tibia_protocol::{ParsingContext, ProtocolError, parse_s2c};
use tibia_transport::Endpoint;
use tibia_world::WorldState;

use crate::error::SessionError;

/// Reads from `server`, forwards to `client`. Every forwarded frame is also
/// handed to a detached task that parses it and applies the result to
/// `world`; a parse failure only logs (the forwarded bytes already went
/// out), it never stops the pump.
pub async fn run_s2c_pump<S>(
    server: Arc<Endpoint<S>>,
    client: Arc<Endpoint<S>>,
    automation: Arc<AutomationHost<S>>,
    world: Arc<WorldState>,
    registry: Arc<Registry>,
) -> SessionError
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    loop {
        let raw = match server.read_message().await {
            Ok(raw) => raw,
            Err(e) => return e.into(),
        };

        let forward = automation.intercept_s2c(&raw);
        if let Err(e) = client.write_message(&forward).await {
            return e.into();
        }

        let world = world.clone();
        let registry = registry.clone();
        tokio::spawn(async move {
            apply_s2c_frame(&raw, &world, &registry);
        });
    }
}

fn apply_s2c_frame(raw: &[u8], world: &WorldState, registry: &Registry) {
    let Some((&opcode, payload)) = raw.split_first() else {
        return;
    };
    let ctx = ParsingContext::new(world.player_position());
    let mut r = ByteReader::new(payload);
    match parse_s2c(opcode, &mut r, registry, &ctx) {
        Ok(msg) => world.apply(&msg),
        Err(ProtocolError::UnknownOpcode(op)) => {
            debug!(opcode = op, "unknown s2c opcode, world state left untouched");
        }
        Err(e) => warn!("malformed s2c packet, world state left untouched: {e}"),
    }
}

/// Reads from `client`, forwards to `server`.
pub async fn run_c2s_pump<S>(
    client: Arc<Endpoint<S>>,
    server: Arc<Endpoint<S>>,
    automation: Arc<AutomationHost<S>>,
) -> SessionError
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    loop {
        let raw = match client.read_message().await {
            Ok(raw) => raw,
            Err(e) => return e.into(),
        };

        let forward = automation.intercept_c2s(&raw);
        if let Err(e) = server.write_message(&forward).await {
            return e.into();
        }
    }
}
