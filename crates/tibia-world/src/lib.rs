//! Thread-safe world-state model: a single struct behind a reader/writer
//! lock, fed mutations from the session's S2C parse task and read either
//! field-at-a-time or as an atomically captured [`WorldSnapshot`] by
//! automation modules.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::warn;

use tibia_protocol::{Container, Item, Player, Position, S2CMessage, Tile};

/// Equipment index 0 is reserved and never written; valid slots are 1-10.
pub const EQUIPMENT_SLOTS: usize = 11;

/// An immutable value copy of [`WorldState`], produced atomically by
/// [`WorldState::capture_frame`]. Automation modules reason over this
/// instead of the live, lock-guarded state so a tick never observes a
/// half-applied mutation.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    pub player: Player,
    pub equipment: [Option<Item>; EQUIPMENT_SLOTS],
    pub containers: HashMap<u8, Container>,
    pub map: HashMap<Position, Tile>,
}

#[derive(Default)]
struct Inner {
    player: Player,
    equipment: [Option<Item>; EQUIPMENT_SLOTS],
    containers: HashMap<u8, Container>,
    map: HashMap<Position, Tile>,
}

/// The per-session world model. Mutations take the exclusive lock;
/// [`capture_frame`](WorldState::capture_frame) is the ordering point: it
/// takes the exclusive lock once and deep-copies every field, so readers
/// never observe a frame straddling two mutations. The lock is never held
/// across an `.await`.
#[derive(Default)]
pub struct WorldState {
    inner: RwLock<Inner>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_player_id(&self, id: u32) {
        self.inner.write().player.id = id;
    }

    pub fn set_player_pos(&self, pos: Position) {
        self.inner.write().player.position = pos;
    }

    pub fn set_player_name(&self, name: impl Into<String>) {
        self.inner.write().player.name = name.into();
    }

    pub fn player_position(&self) -> Position {
        self.inner.read().player.position
    }

    /// Sets equipment slot 1-10. Slot 0 (`None`) is reserved and silently
    /// ignored, matching the invariant that it is never written.
    pub fn set_equipment(&self, slot: u8, item: Item) {
        if !(1..EQUIPMENT_SLOTS as u8).contains(&slot) {
            return;
        }
        self.inner.write().equipment[slot as usize] = Some(item);
    }

    pub fn clear_equipment(&self, slot: u8) {
        if !(1..EQUIPMENT_SLOTS as u8).contains(&slot) {
            return;
        }
        self.inner.write().equipment[slot as usize] = None;
    }

    /// Opening reuses indices 0-15; an existing container at the same
    /// index is simply overwritten.
    pub fn open_container(&self, container: Container) {
        let mut inner = self.inner.write();
        inner.containers.insert(container.id, container);
    }

    pub fn close_container(&self, id: u8) {
        self.inner.write().containers.remove(&id);
    }

    /// Prepends `item` to the container's item list (newest-first).
    /// Out-of-range container ids are silently ignored: mid-stream races
    /// where the container closed before this update arrived are expected.
    pub fn add_container_item(&self, id: u8, item: Item) {
        let mut inner = self.inner.write();
        if let Some(c) = inner.containers.get_mut(&id) {
            c.items.insert(0, item);
        }
    }

    pub fn update_container_item(&self, id: u8, slot: u8, item: Item) {
        let mut inner = self.inner.write();
        if let Some(c) = inner.containers.get_mut(&id) {
            if let Some(slot_item) = c.items.get_mut(slot as usize) {
                *slot_item = item;
            }
        }
    }

    /// Removes the item at `slot`, shifting the tail left. Out-of-range
    /// slots are silently ignored.
    pub fn remove_container_item(&self, id: u8, slot: u8) {
        let mut inner = self.inner.write();
        if let Some(c) = inner.containers.get_mut(&id) {
            if (slot as usize) < c.items.len() {
                c.items.remove(slot as usize);
            }
        }
    }

    /// Replaces every tile carried by a decoded map volume, keyed by
    /// position.
    pub fn set_tiles(&self, tiles: impl IntoIterator<Item = Tile>) {
        let mut inner = self.inner.write();
        for tile in tiles {
            inner.map.insert(tile.position, tile);
        }
    }

    /// Updates the item at `stack_pos` on the tile at `pos`. Stack position
    /// 0 addresses the ground item; 1.. addresses `items[stack_pos - 1]`.
    /// A tile or stack position this implementation has not observed yet is
    /// silently ignored, mirroring the container mutators' tolerance for
    /// mid-stream desync.
    pub fn update_tile_item(&self, pos: Position, stack_pos: u8, item: Item) {
        let mut inner = self.inner.write();
        let Some(tile) = inner.map.get_mut(&pos) else {
            return;
        };
        if stack_pos == 0 {
            tile.ground = item;
        } else if let Some(slot) = tile.items.get_mut(stack_pos as usize - 1) {
            *slot = item;
        }
    }

    fn add_tile_item(&self, pos: Position, item: Item) {
        let mut inner = self.inner.write();
        inner
            .map
            .entry(pos)
            .or_insert_with(|| Tile {
                position: pos,
                ground: item,
                items: Vec::new(),
            })
            .items
            .push(item);
    }

    fn remove_tile_item(&self, pos: Position, stack_pos: u8) {
        let mut inner = self.inner.write();
        let Some(tile) = inner.map.get_mut(&pos) else {
            return;
        };
        if stack_pos > 0 {
            let idx = stack_pos as usize - 1;
            if idx < tile.items.len() {
                tile.items.remove(idx);
            }
        }
    }

    /// Applies a typed S2C message to the world state. The single
    /// integration point the session's parse task calls; keeps per-opcode
    /// world-update logic out of the session crate.
    pub fn apply(&self, msg: &S2CMessage) {
        match msg {
            S2CMessage::GameLogin(m) => self.set_player_id(m.player_id),
            S2CMessage::MapDescription(volume) => {
                self.set_player_pos(volume.player_pos);
                self.set_tiles(volume.tiles.iter().cloned());
            }
            S2CMessage::MapSlice { volume, .. } => {
                self.set_tiles(volume.tiles.iter().cloned());
            }
            S2CMessage::AddTileThing(m) => self.add_tile_item(m.pos, m.item),
            S2CMessage::UpdateTileItem(m) => {
                self.update_tile_item(m.position, m.stack_pos, m.item);
            }
            S2CMessage::RemoveTileThing(m) => self.remove_tile_item(m.pos, m.stack_pos),
            S2CMessage::RemoveTileCreature(_) | S2CMessage::MoveCreature(_) => {
                // Creatures are not tracked by this world model (spec §4.5);
                // these only matter for wire synchronization upstream.
            }
            S2CMessage::AddInventoryItem(m) => self.set_equipment(m.slot.as_u8(), m.item),
            S2CMessage::RemoveInventoryItem(m) => self.clear_equipment(m.slot.as_u8()),
            S2CMessage::OpenContainer(m) => self.open_container(Container {
                id: m.container_id,
                item_id: m.container_item.id,
                name: m.container_name.clone(),
                capacity: m.capacity,
                has_parent: m.has_parent,
                items: m.items.clone(),
            }),
            S2CMessage::CloseContainer(m) => self.close_container(m.container_id),
            S2CMessage::AddContainerItem(m) => self.add_container_item(m.container_id, m.item),
            S2CMessage::UpdateContainerItem(m) => {
                self.update_container_item(m.container_id, m.slot, m.item);
            }
            S2CMessage::RemoveContainerItem(m) => {
                self.remove_container_item(m.container_id, m.slot);
            }
            other => {
                warn!(opcode = other.opcode(), "no world-state mutation for this message");
            }
        }
    }

    /// Atomically captures a deep copy of every field. This is the
    /// ordering point: the exclusive lock is taken once, so the returned
    /// snapshot can never straddle two concurrent mutations.
    pub fn capture_frame(&self) -> WorldSnapshot {
        let inner = self.inner.read();
        WorldSnapshot {
            player: inner.player.clone(),
            equipment: inner.equipment,
            containers: inner.containers.clone(),
            map: inner.map.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tibia_protocol::{EquipmentSlot, GameLoginMsg, OpenContainerMsg};

    #[test]
    fn equipment_slot_zero_is_never_written() {
        let state = WorldState::new();
        state.set_equipment(0, Item::new(5));
        let snap = state.capture_frame();
        assert_eq!(snap.equipment[0], None);
    }

    #[test]
    fn container_items_prepend_and_shift_on_remove() {
        let state = WorldState::new();
        state.open_container(Container {
            id: 1,
            item_id: 10,
            name: "Bag".into(),
            capacity: 8,
            has_parent: false,
            items: vec![Item::new(100)],
        });
        state.add_container_item(1, Item::new(200));
        let snap = state.capture_frame();
        assert_eq!(
            snap.containers[&1].items,
            vec![Item::new(200), Item::new(100)]
        );

        state.remove_container_item(1, 0);
        let snap = state.capture_frame();
        assert_eq!(snap.containers[&1].items, vec![Item::new(100)]);
    }

    #[test]
    fn container_mutation_on_unknown_id_is_ignored() {
        let state = WorldState::new();
        state.add_container_item(9, Item::new(1));
        state.update_container_item(9, 0, Item::new(2));
        state.remove_container_item(9, 0);
        let snap = state.capture_frame();
        assert!(snap.containers.is_empty());
    }

    #[test]
    fn apply_game_login_sets_player_id() {
        let state = WorldState::new();
        state.apply(&S2CMessage::GameLogin(GameLoginMsg {
            player_id: 42,
            beat_duration: 50,
            can_report_bugs: false,
        }));
        assert_eq!(state.capture_frame().player.id, 42);
    }

    #[test]
    fn apply_open_container_then_close_removes_it() {
        let state = WorldState::new();
        state.apply(&S2CMessage::OpenContainer(OpenContainerMsg {
            container_id: 3,
            container_item: Item::new(99),
            container_name: "Chest".into(),
            capacity: 20,
            has_parent: false,
            items: vec![],
        }));
        assert!(state.capture_frame().containers.contains_key(&3));

        state.apply(&S2CMessage::CloseContainer(
            tibia_protocol::CloseContainerMsg { container_id: 3 },
        ));
        assert!(!state.capture_frame().containers.contains_key(&3));
    }

    #[test]
    fn equipment_roundtrips_through_add_and_remove() {
        let state = WorldState::new();
        state.apply(&S2CMessage::AddInventoryItem(
            tibia_protocol::AddInventoryItemMsg {
                slot: EquipmentSlot::Head,
                item: Item::new(7),
            },
        ));
        assert_eq!(
            state.capture_frame().equipment[EquipmentSlot::Head.as_u8() as usize],
            Some(Item::new(7))
        );

        state.apply(&S2CMessage::RemoveInventoryItem(
            tibia_protocol::RemoveInventoryItemMsg {
                slot: EquipmentSlot::Head,
            },
        ));
        assert_eq!(
            state.capture_frame().equipment[EquipmentSlot::Head.as_u8() as usize],
            None
        );
    }

    #[test]
    fn capture_frame_is_a_coherent_copy() {
        let state = WorldState::new();
        state.set_player_name("Hero");
        state.set_player_id(1);
        let snap = state.capture_frame();
        assert_eq!(snap.player.name, "Hero");
        assert_eq!(snap.player.id, 1);
    }
}
