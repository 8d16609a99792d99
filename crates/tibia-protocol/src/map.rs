//! The run-length-encoded 3D map-slice decoder, the hardest parser in this
//! protocol. Decodes a volume of tiles for either a full `MapDescription`
//! (an 18x14 viewport around the player) or a single-row/column directional
//! `MapSlice` revealing the newly visible edge after the player moves.

use tibia_assets::Registry;
use tibia_codec::ByteReader;

use crate::common::read_item;
use crate::domain::{Direction, Item, Position, Tile};
use crate::error::{ProtocolError, Result};
use crate::messages::MapVolume;
use crate::opcodes::{MAP_HEIGHT, MAP_WIDTH, creature_marker};

/// Parses the full 18x14 map description that follows a player's position
/// in a `MapDescription` (0x64) packet.
pub fn parse_map_description(
    r: &mut ByteReader<'_>,
    registry: &Registry,
) -> Result<MapVolume> {
    let player_pos = Position {
        x: r.read_u16(),
        y: r.read_u16(),
        z: r.read_u8(),
    };
    let base = base_coords(player_pos, MAP_WIDTH, MAP_HEIGHT);
    let tiles = parse_volume(r, player_pos, base, MAP_WIDTH, MAP_HEIGHT, registry)?;
    Ok(MapVolume {
        player_pos,
        tiles,
    })
}

/// Parses a directional slice (0x65-0x68): a 1-wide or 1-tall strip
/// revealing the row/column the player just walked into.
pub fn parse_map_slice(
    r: &mut ByteReader<'_>,
    ctx_player_position: Position,
    direction: Direction,
    registry: &Registry,
) -> Result<MapVolume> {
    let mut shifted = ctx_player_position;
    let (width, height) = match direction {
        Direction::North => {
            shifted.y = shifted.y.wrapping_sub(1);
            (MAP_WIDTH, 1)
        }
        Direction::South => {
            shifted.y = shifted.y.wrapping_add(1);
            (MAP_WIDTH, 1)
        }
        Direction::West => {
            shifted.x = shifted.x.wrapping_sub(1);
            (1, MAP_HEIGHT)
        }
        Direction::East => {
            shifted.x = shifted.x.wrapping_add(1);
            (1, MAP_HEIGHT)
        }
    };

    let base = base_coords(shifted, width, height);
    let tiles = parse_volume(r, shifted, base, width, height, registry)?;
    Ok(MapVolume {
        player_pos: shifted,
        tiles,
    })
}

/// The origin tile coordinate for a volume of `width`x`height` centered (as
/// closely as an even dimension allows) on `pos`. An axis clamped to size 1
/// is not offset at all; it already denotes the exact row/column `pos`
/// shifted into.
fn base_coords(pos: Position, width: usize, height: usize) -> (i32, i32) {
    let basex = if width == 1 {
        pos.x as i32
    } else {
        pos.x as i32 - (width / 2) as i32 + 1
    };
    let basey = if height == 1 {
        pos.y as i32
    } else {
        pos.y as i32 - (height / 2) as i32 + 1
    };
    (basex, basey)
}

fn floor_range(pz: u8) -> (i32, i32, i32) {
    if pz > 7 {
        (((pz as i32) - 2).max(0), pz as i32 + 2, 1)
    } else {
        (7, 0, -1)
    }
}

fn parse_volume(
    r: &mut ByteReader<'_>,
    pos: Position,
    base: (i32, i32),
    width: usize,
    height: usize,
    registry: &Registry,
) -> Result<Vec<Tile>> {
    let mut tiles = Vec::with_capacity(width * height);
    let (start_z, end_z, step) = floor_range(pos.z);
    let tiles_per_floor = width * height;

    let mut current_z = start_z;
    let mut processed = 0usize;

    loop {
        let offset_z = pos.z as i32 - current_z;

        let token = r.peek_u16();
        if let Some(e) = r.err() {
            return Err(ProtocolError::Malformed(e));
        }

        if token >= 0xFF00 {
            r.skip(2);
            let skip_count = (token & 0xFF) as usize + 1;
            processed += skip_count;
        } else {
            let nx = processed / height;
            let ny = processed % height;
            let tile_pos = Position {
                x: (base.0 + nx as i32 + offset_z) as u16,
                y: (base.1 + ny as i32 + offset_z) as u16,
                z: current_z as u8,
            };
            let tile = parse_tile(r, tile_pos, registry)?;
            tiles.push(tile);
            processed += 1;
        }

        while processed >= tiles_per_floor {
            if current_z == end_z {
                return Ok(tiles);
            }
            processed -= tiles_per_floor;
            current_z += step;
        }
    }
}

fn parse_tile(r: &mut ByteReader<'_>, pos: Position, registry: &Registry) -> Result<Tile> {
    let ground = read_item(r, registry);
    let mut items = Vec::with_capacity(4);

    loop {
        let next = r.peek_u16();
        if r.err().is_some() || next >= 0xFF00 {
            break;
        }

        if is_creature_marker(next) {
            read_creature_record(r)?;
            continue;
        }

        items.push(read_item(r, registry));
    }

    if let Some(e) = r.err() {
        return Err(ProtocolError::Malformed(e));
    }

    Ok(Tile {
        position: pos,
        ground,
        items,
    })
}

/// Consumes a creature-on-tile record for wire synchronization; the
/// creature itself is not modeled. Shared with the standalone tile-thing
/// parsers in [`crate::parser`], which hit the same two markers outside
/// the RLE map volume.
pub(crate) fn read_creature_record(r: &mut ByteReader<'_>) -> Result<()> {
    let marker = r.read_u16();

    match marker {
        creature_marker::KNOWN => {
            r.read_u32(); // id
        }
        creature_marker::UNKNOWN => {
            r.read_u32(); // id being evicted from the known-creatures list
            r.read_u32(); // id
            r.read_string(); // name
        }
        other => return Err(ProtocolError::UnknownCreatureMarker(other)),
    }

    r.read_u8(); // health percent
    r.read_u8(); // direction
    read_outfit(r);
    r.read_u8(); // light level
    r.read_u8(); // light color
    r.read_u16(); // speed
    r.read_u8(); // skull
    r.read_u8(); // party shield

    r.err().map_or(Ok(()), |e| Err(ProtocolError::Malformed(e)))
}

pub(crate) fn is_creature_marker(token: u16) -> bool {
    token == creature_marker::UNKNOWN || token == creature_marker::KNOWN
}

fn read_outfit(r: &mut ByteReader<'_>) {
    let look_type = r.read_u16();
    if look_type != 0 {
        r.read_u8(); // head
        r.read_u8(); // body
        r.read_u8(); // legs
        r.read_u8(); // feet
    } else {
        r.read_u16(); // item look id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A token whose high byte is 0xFF denotes a run of `(low byte) + 1`
    /// empty tile slots; this is its low/high byte pair.
    fn skip_token(count: u16) -> [u8; 2] {
        let low = (count - 1) as u8;
        [low, 0xFF]
    }

    #[test]
    fn decodes_single_tile_with_one_extra_item() {
        // A 2x2, single-player-floor volume: ground 100, one extra item 0,
        // then a single run-length token skipping the other 31 slots across
        // the remaining 7 underground floors.
        let mut bytes = vec![0x64, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&skip_token(31));

        let mut r = ByteReader::new(&bytes);
        let registry = Registry::empty();
        let base_pos = Position { x: 5, y: 5, z: 7 };
        let tiles = parse_volume(&mut r, base_pos, (5, 5), 2, 2, &registry).unwrap();

        assert_eq!(tiles.len(), 1);
        let tile = &tiles[0];
        assert_eq!(tile.position, Position { x: 5, y: 5, z: 7 });
        assert_eq!(tile.ground.id, 100);
        assert_eq!(tile.items, vec![Item::new(0)]);
    }

    #[test]
    fn unrecognized_marker_value_is_read_as_a_plain_item() {
        // 0x0090 doesn't match any creature-marker constant, so the tile
        // parser treats it as an ordinary item id rather than erroring.
        let mut bytes = vec![5, 0, 0x90, 0x00];
        bytes.extend_from_slice(&skip_token(1));
        let mut r = ByteReader::new(&bytes);
        let registry = Registry::empty();
        let tile = parse_tile(&mut r, Position::default(), &registry).unwrap();
        assert_eq!(tile.items, vec![Item::new(0x90)]);
    }

    #[test]
    fn read_creature_record_rejects_unknown_marker() {
        let marker_bytes = [0x90, 0x00];
        let mut r = ByteReader::new(&marker_bytes);
        let err = read_creature_record(&mut r).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCreatureMarker(0x90)));
    }

    #[test]
    fn directional_slice_base_uses_shifted_axis_unoffset() {
        // West: width=1, so basex is exactly Px-1 (no centering offset); a
        // surface Z keeps the player's own floor first in iteration order,
        // so the one real tile lands with no perspective offset applied.
        let mut bytes = vec![0x09, 0x00];
        bytes.extend_from_slice(&skip_token(111));
        let mut r = ByteReader::new(&bytes);
        let registry = Registry::empty();
        let ctx_pos = Position { x: 10, y: 10, z: 7 };
        let volume = parse_map_slice(&mut r, ctx_pos, Direction::West, &registry).unwrap();
        assert_eq!(volume.player_pos, Position { x: 9, y: 10, z: 7 });
        assert_eq!(volume.tiles[0].position, Position { x: 9, y: 4, z: 7 });
    }
}
