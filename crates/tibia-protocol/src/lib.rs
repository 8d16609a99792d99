//! Typed codec for the Tibia 7.72 game and login protocols: message shapes,
//! opcode tables, the run-length-encoded map-slice decoder, and the
//! RSA-block handshake envelope. Crypto operations on that envelope live in
//! the session crate, which owns the key material; this crate only knows
//! the plaintext shapes on either side of them.

mod client2server;
mod common;
mod domain;
mod error;
mod map;
mod messages;
mod opcodes;
mod parser;

pub mod login;

pub use client2server::{C2SMessage, LookAtMsg, parse_c2s};
pub use common::{ParsingContext, read_item, write_item};
pub use domain::{
    Container, Direction, EquipmentSlot, Item, Player, Position, SKILL_COUNT, Skill, Tile,
};
pub use error::{ProtocolError, Result};
pub use map::{parse_map_description, parse_map_slice};
pub use messages::*;
pub use opcodes::{MAP_HEIGHT, MAP_WIDTH, c2s, creature_marker, login as login_opcodes, s2c};
pub use parser::{encode_s2c, parse_s2c};
