//! Core value types shared by every game-protocol message.

use tibia_codec::{ByteReader, ByteWriter, Decode, Encode};

/// A map coordinate. `X == 0xFFFF` marks a *virtual* position addressing
/// inventory or container contents instead of a map tile (see
/// [`Position::is_virtual`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Encode, Decode)]
pub struct Position {
    pub x: u16,
    pub y: u16,
    pub z: u8,
}

impl Position {
    pub const VIRTUAL_X: u16 = 0xFFFF;

    pub fn is_virtual(self) -> bool {
        self.x == Self::VIRTUAL_X
    }

    /// For a virtual position, the equipment slot it addresses (`y < 64`)
    /// or `None` if it addresses a container instead.
    pub fn equipment_slot(self) -> Option<u8> {
        (self.is_virtual() && self.y < 64).then_some(self.y as u8)
    }

    /// For a virtual position, the container index it addresses (`y >= 64`).
    pub fn container_index(self) -> Option<u8> {
        (self.is_virtual() && self.y >= 64).then_some((self.y - 64) as u8)
    }
}

/// A single item occurrence on the wire. `has_count` mirrors whether the
/// asset registry reported the item as stackable or fluid-like at parse
/// time, and therefore whether a trailing count byte accompanies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Item {
    pub id: u16,
    pub count: u8,
    pub has_count: bool,
}

impl Item {
    pub fn new(id: u16) -> Self {
        Self {
            id,
            count: 0,
            has_count: false,
        }
    }
}

/// A tile's ground item plus anything stacked on top of it, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub position: Position,
    pub ground: Item,
    pub items: Vec<Item>,
}

/// An opened container window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: u8,
    pub item_id: u16,
    pub name: String,
    pub capacity: u8,
    pub has_parent: bool,
    pub items: Vec<Item>,
}

/// Named equipment slots. Slot 0 (`None`) is reserved and never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipmentSlot {
    None,
    Head,
    Neck,
    Backpack,
    Armor,
    Right,
    Left,
    Legs,
    Feet,
    Ring,
    Ammo,
}

impl EquipmentSlot {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Head,
            2 => Self::Neck,
            3 => Self::Backpack,
            4 => Self::Armor,
            5 => Self::Right,
            6 => Self::Left,
            7 => Self::Legs,
            8 => Self::Feet,
            9 => Self::Ring,
            10 => Self::Ammo,
            _ => Self::None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Head => 1,
            Self::Neck => 2,
            Self::Backpack => 3,
            Self::Armor => 4,
            Self::Right => 5,
            Self::Left => 6,
            Self::Legs => 7,
            Self::Feet => 8,
            Self::Ring => 9,
            Self::Ammo => 10,
        }
    }
}

impl Encode for EquipmentSlot {
    fn encode(&self, w: &mut ByteWriter) {
        w.write_u8(self.as_u8());
    }
}

impl Decode for EquipmentSlot {
    fn decode(r: &mut ByteReader<'_>) -> Self {
        Self::from_u8(r.read_u8())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

pub const SKILL_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct Skill {
    pub level: u8,
    pub percent: u8,
}
