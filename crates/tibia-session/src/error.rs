use thiserror::Error;

/// The session layer's own error enum. Wraps every lower-layer error via
/// `#[from]` and classifies each into the terminal/recoverable split §7
/// describes through [`SessionError::is_terminal`].
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] tibia_transport::TransportError),
    #[error("protocol error: {0}")]
    Protocol(#[from] tibia_protocol::ProtocolError),
    #[error("decrypt failed: {0}")]
    Decrypt(#[from] tibia_crypto::CryptoError),
    #[error("invalid handshake: check byte was {0:#04X}, expected 0x00")]
    InvalidHandshake(u8),
    #[error("malformed handshake payload: {0}")]
    MalformedHandshake(tibia_codec::CodecError),
    #[error("failed to connect to backend within the dial timeout")]
    ConnectFailed,
    #[error("backend io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Every kind this layer can produce is terminal for the session it
    /// occurred in. Recoverable errors (`UnknownOpcode`, `MalformedPacket`)
    /// are handled inside the pump/parse loop and never surface as a
    /// `SessionError` at all.
    pub fn is_terminal(&self) -> bool {
        true
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
