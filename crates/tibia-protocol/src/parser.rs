//! Top-level opcode dispatch for the game protocol: turns an opcode byte
//! plus the remainder of a frame into a typed [`S2CMessage`].

use tibia_assets::Registry;
use tibia_codec::{ByteReader, ByteWriter, Decode, Encode};

use crate::common::{ParsingContext, read_item, write_item};
use crate::domain::{Direction, EquipmentSlot, Item, Position};
use crate::error::{ProtocolError, Result};
use crate::map::{self, is_creature_marker};
use crate::messages::*;
use crate::opcodes::s2c;

/// Parses one S2C message. `ctx` carries state the parser needs across
/// packets (currently just the player's last known position, for
/// directional map slices); callers update it from the messages that flow
/// back out (see [`crate::domain`]).
pub fn parse_s2c(
    opcode: u8,
    r: &mut ByteReader<'_>,
    registry: &Registry,
    ctx: &ParsingContext,
) -> Result<S2CMessage> {
    let msg = match opcode {
        s2c::LOGIN_SUCCESSFUL => S2CMessage::GameLogin(GameLoginMsg::decode(r)),
        s2c::PING => S2CMessage::Ping,
        s2c::SERVER_CLOSED => S2CMessage::ServerClosed(ServerClosedMsg::decode(r)),
        s2c::MAP_DESCRIPTION => {
            S2CMessage::MapDescription(map::parse_map_description(r, registry)?)
        }
        s2c::MAP_SLICE_NORTH => decode_map_slice(r, Direction::North, ctx, registry)?,
        s2c::MAP_SLICE_EAST => decode_map_slice(r, Direction::East, ctx, registry)?,
        s2c::MAP_SLICE_SOUTH => decode_map_slice(r, Direction::South, ctx, registry)?,
        s2c::MAP_SLICE_WEST => decode_map_slice(r, Direction::West, ctx, registry)?,
        s2c::MOVE_CREATURE => S2CMessage::MoveCreature(decode_move_creature(r)),
        s2c::ADD_TILE_THING => S2CMessage::AddTileThing(decode_add_tile_thing(r, registry)?),
        s2c::UPDATE_TILE_ITEM => S2CMessage::UpdateTileItem(decode_update_tile_item(r, registry)),
        s2c::REMOVE_TILE_THING => decode_remove_tile_thing(r),
        s2c::MAGIC_EFFECT => S2CMessage::MagicEffect(MagicEffectMsg::decode(r)),
        s2c::WORLD_LIGHT => S2CMessage::WorldLight(WorldLightMsg::decode(r)),
        s2c::CREATURE_LIGHT => S2CMessage::CreatureLight(CreatureLightMsg::decode(r)),
        s2c::CREATURE_HEALTH => S2CMessage::CreatureHealth(CreatureHealthMsg::decode(r)),
        s2c::ADD_INVENTORY_ITEM => {
            S2CMessage::AddInventoryItem(decode_add_inventory_item(r, registry))
        }
        s2c::REMOVE_INVENTORY_ITEM => {
            S2CMessage::RemoveInventoryItem(RemoveInventoryItemMsg::decode(r))
        }
        s2c::OPEN_CONTAINER => S2CMessage::OpenContainer(decode_open_container(r, registry)),
        s2c::CLOSE_CONTAINER => S2CMessage::CloseContainer(CloseContainerMsg::decode(r)),
        s2c::ADD_CONTAINER_ITEM => {
            S2CMessage::AddContainerItem(decode_add_container_item(r, registry))
        }
        s2c::UPDATE_CONTAINER_ITEM => {
            S2CMessage::UpdateContainerItem(decode_update_container_item(r, registry))
        }
        s2c::REMOVE_CONTAINER_ITEM => {
            S2CMessage::RemoveContainerItem(RemoveContainerItemMsg::decode(r))
        }
        s2c::PLAYER_STATS => S2CMessage::PlayerStats(PlayerStatsMsg::decode(r)),
        s2c::PLAYER_SKILLS => S2CMessage::PlayerSkills(decode_player_skills(r)),
        s2c::PLAYER_ICONS => S2CMessage::PlayerIcons(PlayerIconsMsg::decode(r)),
        other => return Err(ProtocolError::UnknownOpcode(other)),
    };

    if let Some(e) = r.err() {
        return Err(ProtocolError::Malformed(e));
    }
    Ok(msg)
}

pub fn encode_s2c(w: &mut ByteWriter, msg: &S2CMessage, registry: &Registry) {
    w.write_u8(msg.opcode());
    match msg {
        S2CMessage::GameLogin(m) => m.encode(w),
        S2CMessage::Ping => {}
        S2CMessage::ServerClosed(m) => m.encode(w),
        S2CMessage::MapDescription(_) | S2CMessage::MapSlice { .. } => {
            // Map volumes are forwarded verbatim by the session pump rather
            // than re-encoded (see §4.5); this variant is never constructed
            // from scratch by this crate's own callers.
        }
        S2CMessage::MoveCreature(m) => encode_move_creature(w, m),
        S2CMessage::AddTileThing(m) => encode_add_tile_thing(w, m, registry),
        S2CMessage::UpdateTileItem(m) => encode_update_tile_item(w, m, registry),
        S2CMessage::RemoveTileThing(m) => m.encode(w),
        S2CMessage::RemoveTileCreature(m) => {
            w.write_u16(Position::VIRTUAL_X);
            w.write_u32(m.creature_id);
        }
        S2CMessage::MagicEffect(m) => m.encode(w),
        S2CMessage::WorldLight(m) => m.encode(w),
        S2CMessage::CreatureLight(m) => m.encode(w),
        S2CMessage::CreatureHealth(m) => m.encode(w),
        S2CMessage::AddInventoryItem(m) => {
            m.slot.encode(w);
            write_item(w, &m.item, registry);
        }
        S2CMessage::RemoveInventoryItem(m) => m.encode(w),
        S2CMessage::OpenContainer(m) => encode_open_container(w, m, registry),
        S2CMessage::CloseContainer(m) => m.encode(w),
        S2CMessage::AddContainerItem(m) => {
            w.write_u8(m.container_id);
            write_item(w, &m.item, registry);
        }
        S2CMessage::UpdateContainerItem(m) => {
            w.write_u8(m.container_id);
            w.write_u8(m.slot);
            write_item(w, &m.item, registry);
        }
        S2CMessage::RemoveContainerItem(m) => m.encode(w),
        S2CMessage::PlayerStats(m) => m.encode(w),
        S2CMessage::PlayerSkills(m) => {
            for skill in m.skills {
                skill.encode(w);
            }
        }
        S2CMessage::PlayerIcons(m) => m.encode(w),
    }
}

fn decode_map_slice(
    r: &mut ByteReader<'_>,
    direction: Direction,
    ctx: &ParsingContext,
    registry: &Registry,
) -> Result<S2CMessage> {
    let volume = map::parse_map_slice(r, ctx.player_position, direction, registry)?;
    Ok(S2CMessage::MapSlice { direction, volume })
}

fn decode_move_creature(r: &mut ByteReader<'_>) -> MoveCreatureMsg {
    let peek = r.peek_u16();
    if peek == Position::VIRTUAL_X {
        r.skip(2); // consume the 0xFFFF marker
        let creature_id = r.read_u32();
        let to_pos = read_position(r);
        MoveCreatureMsg {
            known_source_position: false,
            from_pos: Position::default(),
            from_stack_pos: -1,
            creature_id,
            to_pos,
        }
    } else {
        let from_pos = read_position(r);
        let from_stack_pos = r.read_u8() as i8;
        let to_pos = read_position(r);
        MoveCreatureMsg {
            known_source_position: true,
            from_pos,
            from_stack_pos,
            creature_id: 0,
            to_pos,
        }
    }
}

fn encode_move_creature(w: &mut ByteWriter, m: &MoveCreatureMsg) {
    if m.known_source_position {
        write_position(w, m.from_pos);
        w.write_u8(m.from_stack_pos as u8);
    } else {
        w.write_u16(Position::VIRTUAL_X);
        w.write_u32(m.creature_id);
    }
    write_position(w, m.to_pos);
}

fn decode_add_tile_thing(r: &mut ByteReader<'_>, registry: &Registry) -> Result<AddTileThingMsg> {
    let pos = read_position(r);
    let peek = r.peek_u16();
    let item = if is_creature_marker(peek) {
        map::read_creature_record(r)?;
        Item::default()
    } else {
        read_item(r, registry)
    };
    Ok(AddTileThingMsg { pos, item })
}

fn encode_add_tile_thing(w: &mut ByteWriter, m: &AddTileThingMsg, registry: &Registry) {
    write_position(w, m.pos);
    write_item(w, &m.item, registry);
}

fn decode_update_tile_item(r: &mut ByteReader<'_>, registry: &Registry) -> UpdateTileItemMsg {
    let position = read_position(r);
    // The stack-position byte here can, on some servers, actually address a
    // creature rather than an item slot (see §4.4); not special-cased.
    let stack_pos = r.read_u8();
    let item = read_item(r, registry);
    UpdateTileItemMsg {
        position,
        stack_pos,
        item,
    }
}

fn encode_update_tile_item(w: &mut ByteWriter, m: &UpdateTileItemMsg, registry: &Registry) {
    write_position(w, m.position);
    w.write_u8(m.stack_pos);
    write_item(w, &m.item, registry);
}

fn decode_remove_tile_thing(r: &mut ByteReader<'_>) -> S2CMessage {
    if r.peek_u16() == Position::VIRTUAL_X {
        r.skip(2); // consume the 0xFFFF marker
        S2CMessage::RemoveTileCreature(RemoveTileCreatureMsg {
            creature_id: r.read_u32(),
        })
    } else {
        S2CMessage::RemoveTileThing(RemoveTileThingMsg::decode(r))
    }
}

fn decode_add_inventory_item(r: &mut ByteReader<'_>, registry: &Registry) -> AddInventoryItemMsg {
    let slot = EquipmentSlot::decode(r);
    let item = read_item(r, registry);
    AddInventoryItemMsg { slot, item }
}

fn decode_open_container(r: &mut ByteReader<'_>, registry: &Registry) -> OpenContainerMsg {
    let container_id = r.read_u8();
    let container_item = read_item(r, registry);
    let container_name = r.read_string();
    let capacity = r.read_u8();
    let has_parent = r.read_bool();
    let count = r.read_u8();
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        items.push(read_item(r, registry));
    }
    OpenContainerMsg {
        container_id,
        container_item,
        container_name,
        capacity,
        has_parent,
        items,
    }
}

fn encode_open_container(w: &mut ByteWriter, m: &OpenContainerMsg, registry: &Registry) {
    w.write_u8(m.container_id);
    write_item(w, &m.container_item, registry);
    w.write_string(&m.container_name);
    w.write_u8(m.capacity);
    w.write_bool(m.has_parent);
    w.write_u8(m.items.len() as u8);
    for item in &m.items {
        write_item(w, item, registry);
    }
}

fn decode_add_container_item(r: &mut ByteReader<'_>, registry: &Registry) -> AddContainerItemMsg {
    AddContainerItemMsg {
        container_id: r.read_u8(),
        item: read_item(r, registry),
    }
}

fn decode_update_container_item(
    r: &mut ByteReader<'_>,
    registry: &Registry,
) -> UpdateContainerItemMsg {
    let container_id = r.read_u8();
    let slot = r.read_u8();
    let item = read_item(r, registry);
    UpdateContainerItemMsg {
        container_id,
        slot,
        item,
    }
}

fn decode_player_skills(r: &mut ByteReader<'_>) -> PlayerSkillsMsg {
    let mut skills = [crate::domain::Skill::default(); crate::domain::SKILL_COUNT];
    for skill in &mut skills {
        *skill = crate::domain::Skill::decode(r);
    }
    PlayerSkillsMsg { skills }
}

fn read_position(r: &mut ByteReader<'_>) -> Position {
    Position {
        x: r.read_u16(),
        y: r.read_u16(),
        z: r.read_u8(),
    }
}

fn write_position(w: &mut ByteWriter, pos: Position) {
    w.write_u16(pos.x);
    w.write_u16(pos.y);
    w.write_u8(pos.z);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        Registry::empty()
    }

    #[test]
    fn move_creature_known_source_position() {
        let mut w = ByteWriter::new();
        write_position(&mut w, Position { x: 100, y: 100, z: 7 });
        w.write_u8(1);
        write_position(&mut w, Position { x: 101, y: 100, z: 7 });
        let bytes = w.finish().unwrap();

        let mut r = ByteReader::new(&bytes);
        let msg = decode_move_creature(&mut r);
        assert!(msg.known_source_position);
        assert_eq!(msg.from_pos, Position { x: 100, y: 100, z: 7 });
        assert_eq!(msg.from_stack_pos, 1);
        assert_eq!(msg.to_pos, Position { x: 101, y: 100, z: 7 });
    }

    #[test]
    fn move_creature_unknown_source_position() {
        // Spec §8 scenario 6: `6D FF FF 2A 00 00 00 80 7D 82 7D 07` (opcode
        // already dispatched) decodes to CreatureID=42, To=(0x7D80,0x7D82,7).
        let bytes = [
            0xFF, 0xFF, 0x2A, 0x00, 0x00, 0x00, 0x80, 0x7D, 0x82, 0x7D, 0x07,
        ];

        let mut r = ByteReader::new(&bytes);
        let msg = decode_move_creature(&mut r);
        assert!(!msg.known_source_position);
        assert_eq!(msg.from_stack_pos, -1);
        assert_eq!(msg.creature_id, 42);
        assert_eq!(msg.to_pos, Position { x: 0x7D80, y: 0x7D82, z: 7 });
    }

    #[test]
    fn remove_tile_thing_discriminates_on_marker() {
        let mut w = ByteWriter::new();
        w.write_u16(Position::VIRTUAL_X);
        w.write_u32(7);
        let bytes = w.finish().unwrap();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(
            decode_remove_tile_thing(&mut r),
            S2CMessage::RemoveTileCreature(RemoveTileCreatureMsg { creature_id: 7 })
        );

        let mut w = ByteWriter::new();
        write_position(&mut w, Position { x: 5, y: 5, z: 7 });
        w.write_u8(2);
        let bytes = w.finish().unwrap();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(
            decode_remove_tile_thing(&mut r),
            S2CMessage::RemoveTileThing(RemoveTileThingMsg {
                pos: Position { x: 5, y: 5, z: 7 },
                stack_pos: 2,
            })
        );
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let bytes: [u8; 0] = [];
        let mut r = ByteReader::new(&bytes);
        let ctx = ParsingContext::default();
        let registry = registry();
        let err = parse_s2c(0xFF, &mut r, &registry, &ctx).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownOpcode(0xFF)));
    }
}
