use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::Mutex as AsyncMutex;

use tibia_codec::{ByteWriter, Encode};

use crate::error::Result;
use crate::frame::{read_message, write_message};

/// Shared XTEA enablement state between an endpoint's read and write
/// halves. `enable_xtea` must be called once, atomically flipping both
/// sides from plain framing to encrypted framing.
struct XteaState {
    enabled: AtomicBool,
    key: std::sync::Mutex<[u32; 4]>,
}

impl XteaState {
    fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            key: std::sync::Mutex::new([0; 4]),
        }
    }

    fn enable(&self, key: [u32; 4]) {
        *self.key.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = key;
        self.enabled.store(true, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Option<[u32; 4]> {
        if self.enabled.load(Ordering::SeqCst) {
            Some(*self.key.lock().unwrap_or_else(std::sync::PoisonError::into_inner))
        } else {
            None
        }
    }
}

/// One side of a session's bidirectional transport. Both halves sit
/// behind an async mutex so the whole endpoint can live in an `Arc`: the
/// pump that drives this side holds the only caller of `read_message` (the
/// lock is never contended there), while `write_message`/`send_packet` are
/// shared with automation modules that inject packets out of band; the
/// mutex there is what keeps a pump's forwarded frame and a module's
/// injected frame from interleaving bytes.
pub struct Endpoint<S> {
    read_half: AsyncMutex<ReadHalf<S>>,
    write_half: AsyncMutex<WriteHalf<S>>,
    xtea: Arc<XteaState>,
    label: String,
}

impl<S> Endpoint<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, label: impl Into<String>) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            read_half: AsyncMutex::new(read_half),
            write_half: AsyncMutex::new(write_half),
            xtea: Arc::new(XteaState::new()),
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Enables XTEA on both this endpoint's read and write paths. Must be
    /// called before the second framed message is exchanged.
    pub fn enable_xtea(&self, key: [u32; 4]) {
        self.xtea.enable(key);
    }

    /// Reads one framed message. Only the session's pump task for this
    /// side is expected to call this; the lock exists so the endpoint can
    /// be shared via `Arc` rather than requiring unique ownership.
    pub async fn read_message(&self) -> Result<Vec<u8>> {
        let mut read_half = self.read_half.lock().await;
        read_message(&mut *read_half, self.xtea.snapshot()).await
    }

    /// Writes one framed message, serialized against any concurrent
    /// `send_packet`/`write_message` call on this same endpoint.
    pub async fn write_message(&self, payload: &[u8]) -> Result<()> {
        let mut write_half = self.write_half.lock().await;
        write_message(&mut *write_half, payload, self.xtea.snapshot()).await
    }

    /// Encodes `packet` and writes it as one framed message.
    pub async fn send_packet<T: Encode>(&self, packet: &T) -> Result<()> {
        let mut writer = ByteWriter::new();
        packet.encode(&mut writer);
        // A packet built from in-memory fields cannot latch a codec error;
        // an empty buffer would only happen for a type that writes nothing.
        let bytes = writer.finish().unwrap_or_default();
        self.write_message(&bytes).await
    }

    /// Shuts down the write half. A peer blocked on a pending read sees EOF
    /// once its paired socket closes, so this is what unblocks the other
    /// side's pump loop during teardown.
    pub async fn close(&self) {
        use tokio::io::AsyncWriteExt;
        let mut write_half = self.write_half.lock().await;
        let _ = write_half.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_packet_roundtrips_through_read_message() {
        struct Ping;
        impl Encode for Ping {
            fn encode(&self, w: &mut ByteWriter) {
                w.write_u8(0x1E);
            }
        }

        let (client_stream, server_stream) = tokio::io::duplex(1024);
        let client = Endpoint::new(client_stream, "client");
        let server = Endpoint::new(server_stream, "server");

        client.send_packet(&Ping).await.unwrap();
        let got = server.read_message().await.unwrap();
        assert_eq!(got, vec![0x1E]);
    }

    #[tokio::test]
    async fn enable_xtea_affects_both_directions() {
        let key = [9, 8, 7, 6];
        let (client_stream, server_stream) = tokio::io::duplex(1024);
        let client = Endpoint::new(client_stream, "client");
        let server = Endpoint::new(server_stream, "server");

        client.enable_xtea(key);
        server.enable_xtea(key);

        client.write_message(b"hello").await.unwrap();
        let got = server.read_message().await.unwrap();
        assert_eq!(got, b"hello");
    }
}
