//! `light_hack`: the bundled example automation module. Waits for the
//! player id to show up in the world snapshot (i.e. for `GameLogin` to
//! have been observed), then injects one `CreatureLight` packet for that
//! id carrying a configured level/color and exits, demonstrating the
//! `AutomationModule` trait with a fully-specified end-to-end scenario.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use tibia_codec::{ByteWriter, Encode};
use tibia_protocol::{CreatureLightMsg, s2c};

use crate::{AutomationModule, ModuleContext};

#[derive(Debug, Clone, Copy)]
pub struct LightHackConfig {
    pub level: u8,
    pub color: u8,
}

pub struct LightHackModule {
    config: LightHackConfig,
}

impl LightHackModule {
    pub fn new(config: LightHackConfig) -> Self {
        Self { config }
    }
}

struct CreatureLightPacket(CreatureLightMsg);

impl Encode for CreatureLightPacket {
    fn encode(&self, w: &mut ByteWriter) {
        w.write_u8(s2c::CREATURE_LIGHT);
        self.0.encode(w);
    }
}

impl<S> AutomationModule<S> for LightHackModule
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn name(&self) -> &'static str {
        "light_hack"
    }

    fn spawn(self: Arc<Self>, mut ctx: ModuleContext<S>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut poll = tokio::time::interval(Duration::from_millis(20));
            loop {
                tokio::select! {
                    _ = ctx.stop.recv() => return,
                    _ = poll.tick() => {
                        let snapshot = ctx.world.capture_frame();
                        if snapshot.player.id == 0 {
                            continue;
                        }
                        let packet = CreatureLightPacket(CreatureLightMsg {
                            creature_id: snapshot.player.id,
                            light_level: self.config.level,
                            color: self.config.color,
                        });
                        match ctx.client.send_packet(&packet).await {
                            Ok(()) => info!(
                                player_id = snapshot.player.id,
                                "light_hack injected CreatureLight"
                            ),
                            Err(e) => warn!("light_hack failed to inject CreatureLight: {e}"),
                        }
                        return;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;
    use tokio::sync::broadcast;

    #[tokio::test]
    async fn injects_creature_light_once_player_id_is_known() {
        let (client_stream, mut client_peer) = duplex(1024);
        let (server_stream, _server_peer) = duplex(64);
        let client = Arc::new(tibia_transport::Endpoint::new(client_stream, "client"));
        let server = Arc::new(tibia_transport::Endpoint::new(server_stream, "server"));
        let world = Arc::new(tibia_world::WorldState::new());
        world.set_player_id(42);

        let (stop_tx, stop_rx) = broadcast::channel(1);
        let ctx = ModuleContext {
            world,
            client,
            server,
            stop: stop_rx,
        };

        let module = Arc::new(LightHackModule::new(LightHackConfig {
            level: 0xFF,
            color: 0xD7,
        }));
        let handle = AutomationModule::spawn(module, ctx);

        let got = tokio::time::timeout(
            Duration::from_millis(200),
            tibia_transport::read_message(&mut client_peer, None),
        )
        .await
        .expect("timed out waiting for injected packet")
        .unwrap();

        assert_eq!(got[0], s2c::CREATURE_LIGHT);
        drop(stop_tx);
        let _ = handle.await;
    }
}
