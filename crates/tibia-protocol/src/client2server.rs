//! C2S messages. Only the look-at request is interpreted; everything else
//! passes through untouched.

use tibia_codec::{ByteReader, ByteWriter};

use crate::domain::Position;
use crate::opcodes::c2s;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookAtMsg {
    pub pos: Position,
    pub item_id: u16,
    pub stack_pos: u8,
}

impl LookAtMsg {
    pub fn decode(r: &mut ByteReader<'_>) -> Self {
        Self {
            pos: Position {
                x: r.read_u16(),
                y: r.read_u16(),
                z: r.read_u8(),
            },
            item_id: r.read_u16(),
            stack_pos: r.read_u8(),
        }
    }

    pub fn encode(&self, w: &mut ByteWriter) {
        w.write_u8(c2s::LOOK_REQUEST);
        w.write_u16(self.pos.x);
        w.write_u16(self.pos.y);
        w.write_u8(self.pos.z);
        w.write_u16(self.item_id);
        w.write_u8(self.stack_pos);
    }
}

/// A client-to-server message, recognized or forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum C2SMessage {
    LookAt(LookAtMsg),
    /// Any other opcode, including its leading opcode byte, forwarded as-is.
    Other(Vec<u8>),
}

/// Parses a raw C2S frame (opcode byte followed by payload). Never fails:
/// an opcode this implementation does not interpret is classified `Other`
/// and carries the whole frame for unmodified forwarding.
pub fn parse_c2s(raw: &[u8]) -> C2SMessage {
    let Some((&opcode, payload)) = raw.split_first() else {
        return C2SMessage::Other(raw.to_vec());
    };

    if opcode == c2s::LOOK_REQUEST {
        let mut r = ByteReader::new(payload);
        let msg = LookAtMsg::decode(&mut r);
        if r.is_ok() {
            return C2SMessage::LookAt(msg);
        }
    }

    C2SMessage::Other(raw.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_look_at_request() {
        let raw = [0x8C, 0x69, 0x7D, 0xE5, 0x7D, 0x07, 0xBA, 0x11, 0x01];
        let parsed = parse_c2s(&raw);
        assert_eq!(
            parsed,
            C2SMessage::LookAt(LookAtMsg {
                pos: Position {
                    x: 0x7D69,
                    y: 0x7DE5,
                    z: 7
                },
                item_id: 0x11BA,
                stack_pos: 1,
            })
        );
    }

    #[test]
    fn unknown_opcode_passes_through() {
        let raw = [0x01, 0x02, 0x03];
        assert_eq!(parse_c2s(&raw), C2SMessage::Other(raw.to_vec()));
    }
}
