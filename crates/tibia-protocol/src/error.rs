use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("unknown opcode {0:#04X}")]
    UnknownOpcode(u8),
    #[error("malformed packet: {0}")]
    Malformed(#[from] tibia_codec::CodecError),
    #[error("unknown creature marker {0:#06X}")]
    UnknownCreatureMarker(u16),
    #[error("malformed MOTD payload: missing id/message separator")]
    MalformedMotd,
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
