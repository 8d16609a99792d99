//! Shared readers/writers used by more than one message type: items (which
//! need the asset registry to decide whether a count byte follows) and the
//! parsing context a directional map slice needs to know the player's
//! current position.

use tibia_assets::Registry;
use tibia_codec::{ByteReader, ByteWriter};

use crate::domain::{Item, Position};

/// Reads an item: a `u16` id, followed by a count byte only when the asset
/// registry reports the item as stackable or fluid-like.
pub fn read_item(r: &mut ByteReader<'_>, registry: &Registry) -> Item {
    let id = r.read_u16();
    let attrs = registry.get(id);
    if attrs.is_stackable || attrs.is_fluid {
        Item {
            id,
            count: r.read_u8(),
            has_count: true,
        }
    } else {
        Item::new(id)
    }
}

pub fn write_item(w: &mut ByteWriter, item: &Item, registry: &Registry) {
    w.write_u16(item.id);
    let attrs = registry.get(item.id);
    if attrs.is_stackable || attrs.is_fluid {
        w.write_u8(item.count);
    }
}

/// State the game-protocol parser must carry across packets within one
/// session: currently just the player's last known position, which a
/// directional map slice needs in order to compute its base coordinate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParsingContext {
    pub player_position: Position,
}

impl ParsingContext {
    pub fn new(player_position: Position) -> Self {
        Self { player_position }
    }
}
