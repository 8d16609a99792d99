//! Automation module lifecycle: the `AutomationModule` trait long-running
//! modules implement, the `AutomationHost` that starts/stops them and fans
//! a single stop signal out to all of them, and the synchronous S2C/C2S
//! intercept hooks the session pumps call on every framed message.

mod light_hack;

pub use light_hack::{LightHackConfig, LightHackModule};

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use tibia_transport::Endpoint;
use tibia_world::WorldState;

/// Everything a module needs to read the world and inject packets: the
/// world-state handle (modules call `capture_frame` on it, never mutate
/// directly), both session endpoints to write synthetic packets through,
/// and a stop-signal receiver that fires when the session tears down.
pub struct ModuleContext<S> {
    pub world: Arc<WorldState>,
    pub client: Arc<Endpoint<S>>,
    pub server: Arc<Endpoint<S>>,
    pub stop: broadcast::Receiver<()>,
}

/// A long-running automation task. `spawn` must return immediately,
/// handing back the `JoinHandle` of a task it has already started with
/// `tokio::spawn`; the module itself decides whether it loops on a tick,
/// runs once, or reacts to world-state changes.
pub trait AutomationModule<S>: Send + Sync + 'static
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn name(&self) -> &'static str;
    fn spawn(self: Arc<Self>, ctx: ModuleContext<S>) -> JoinHandle<()>;
}

/// Owns the stop broadcast channel and the join handles of every module
/// started for a session. Dropping the host without calling `stop` leaves
/// modules running until their own stop-receiver fires (they were handed
/// one at `start` time regardless).
pub struct AutomationHost<S> {
    stop_tx: broadcast::Sender<()>,
    handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
    _marker: std::marker::PhantomData<fn(S)>,
}

impl<S> Default for AutomationHost<S> {
    fn default() -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            stop_tx,
            handles: std::sync::Mutex::new(Vec::new()),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<S> AutomationHost<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts every module, each getting its own stop-receiver subscribed
    /// off this host's broadcast sender.
    pub fn start(
        &self,
        modules: Vec<Arc<dyn AutomationModule<S>>>,
        world: Arc<WorldState>,
        client: Arc<Endpoint<S>>,
        server: Arc<Endpoint<S>>,
    ) {
        let mut handles = self.handles.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for module in modules {
            debug!(module = module.name(), "starting automation module");
            let ctx = ModuleContext {
                world: world.clone(),
                client: client.clone(),
                server: server.clone(),
                stop: self.stop_tx.subscribe(),
            };
            handles.push(module.spawn(ctx));
        }
    }

    /// Called on every framed S2C message between read and write. Must
    /// return synchronously; this default implementation is pure
    /// passthrough since no bundled module rewrites in-flight traffic.
    pub fn intercept_s2c(&self, raw: &[u8]) -> Vec<u8> {
        raw.to_vec()
    }

    /// Called on every framed C2S message between read and write.
    pub fn intercept_c2s(&self, raw: &[u8]) -> Vec<u8> {
        raw.to_vec()
    }

    /// Fans the stop signal out to every module (closing/broadcasting on
    /// the channel) and waits for each one's task to finish.
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(());
        let handles = {
            let mut guard = self.handles.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };
        for handle in handles {
            let _ = handle.await;
        }
    }
}
