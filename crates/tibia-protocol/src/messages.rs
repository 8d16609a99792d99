//! Typed game-protocol (post-login) message variants, one per S2C opcode
//! this implementation understands, plus their C2S counterpart.

use tibia_codec::{ByteWriter, Decode, Encode};

use crate::domain::{EquipmentSlot, Item, Position, SKILL_COUNT, Skill};
use crate::opcodes::s2c;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct GameLoginMsg {
    pub player_id: u32,
    pub beat_duration: u16,
    pub can_report_bugs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PingMsg;

impl Encode for PingMsg {
    fn encode(&self, _w: &mut ByteWriter) {}
}

impl Decode for PingMsg {
    fn decode(_r: &mut tibia_codec::ByteReader<'_>) -> Self {
        Self
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct ServerClosedMsg {
    pub reason: String,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct LoginQueueMsg {
    pub message: String,
    pub retry_time_seconds: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct MagicEffectMsg {
    pub pos: Position,
    pub effect_type: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct WorldLightMsg {
    pub light_level: u8,
    pub color: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct CreatureLightMsg {
    pub creature_id: u32,
    pub light_level: u8,
    pub color: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct CreatureHealthMsg {
    pub creature_id: u32,
    pub health_percent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct PlayerIconsMsg {
    pub icons: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveTileCreatureMsg {
    pub creature_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct RemoveTileThingMsg {
    pub pos: Position,
    pub stack_pos: u8,
}

/// `known_source_position` selects which branch is meaningful: when true,
/// `from_pos`/`from_stack_pos` carry the source tile; when false,
/// `creature_id` does, and `from_stack_pos` is `-1`, `creature_id` is `0` in
/// the other branch. Mirrors the wire's two mutually exclusive shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCreatureMsg {
    pub known_source_position: bool,
    pub from_pos: Position,
    pub from_stack_pos: i8,
    pub creature_id: u32,
    pub to_pos: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddTileThingMsg {
    pub pos: Position,
    /// Zero item when the wire carried a creature record instead (consumed
    /// for synchronization but not represented here; see §4.4).
    pub item: Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateTileItemMsg {
    pub position: Position,
    // The stack-position byte this reads can, on some servers, actually
    // address a creature rather than an item slot; not special-cased here.
    pub stack_pos: u8,
    pub item: Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddInventoryItemMsg {
    pub slot: EquipmentSlot,
    pub item: Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct RemoveInventoryItemMsg {
    pub slot: EquipmentSlot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenContainerMsg {
    pub container_id: u8,
    pub container_item: Item,
    pub container_name: String,
    pub capacity: u8,
    pub has_parent: bool,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct CloseContainerMsg {
    pub container_id: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddContainerItemMsg {
    pub container_id: u8,
    pub item: Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct RemoveContainerItemMsg {
    pub container_id: u8,
    pub slot: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateContainerItemMsg {
    pub container_id: u8,
    pub slot: u8,
    pub item: Item,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSkillsMsg {
    pub skills: [Skill; SKILL_COUNT],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct PlayerStatsMsg {
    pub health: u16,
    pub max_health: u16,
    pub free_capacity: u16,
    pub experience: u32,
    pub level: u16,
    pub level_percent: u8,
    pub mana: u16,
    pub max_mana: u16,
    pub magic_level: u8,
    pub magic_level_percent: u8,
    pub soul: u8,
}

/// The RLE-decoded tile volume shared by `MapDescription` and the four
/// directional `MapSlice*` opcodes; see [`crate::map`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapVolume {
    pub player_pos: Position,
    pub tiles: Vec<crate::domain::Tile>,
}

/// Every S2C game-protocol message this implementation parses into a typed
/// shape. An opcode absent from this enum is forwarded untouched by the
/// session pump and never reaches here (see [`crate::parser::parse_s2c`]).
#[derive(Debug, Clone, PartialEq)]
pub enum S2CMessage {
    GameLogin(GameLoginMsg),
    Ping,
    ServerClosed(ServerClosedMsg),
    MapDescription(MapVolume),
    MapSlice {
        direction: crate::domain::Direction,
        volume: MapVolume,
    },
    MoveCreature(MoveCreatureMsg),
    AddTileThing(AddTileThingMsg),
    UpdateTileItem(UpdateTileItemMsg),
    RemoveTileThing(RemoveTileThingMsg),
    RemoveTileCreature(RemoveTileCreatureMsg),
    MagicEffect(MagicEffectMsg),
    WorldLight(WorldLightMsg),
    CreatureLight(CreatureLightMsg),
    CreatureHealth(CreatureHealthMsg),
    AddInventoryItem(AddInventoryItemMsg),
    RemoveInventoryItem(RemoveInventoryItemMsg),
    OpenContainer(OpenContainerMsg),
    CloseContainer(CloseContainerMsg),
    AddContainerItem(AddContainerItemMsg),
    UpdateContainerItem(UpdateContainerItemMsg),
    RemoveContainerItem(RemoveContainerItemMsg),
    PlayerStats(PlayerStatsMsg),
    PlayerSkills(PlayerSkillsMsg),
    PlayerIcons(PlayerIconsMsg),
}

impl S2CMessage {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::GameLogin(_) => s2c::LOGIN_SUCCESSFUL,
            Self::Ping => s2c::PING,
            Self::ServerClosed(_) => s2c::SERVER_CLOSED,
            Self::MapDescription(_) => s2c::MAP_DESCRIPTION,
            Self::MapSlice { direction, .. } => match direction {
                crate::domain::Direction::North => s2c::MAP_SLICE_NORTH,
                crate::domain::Direction::East => s2c::MAP_SLICE_EAST,
                crate::domain::Direction::South => s2c::MAP_SLICE_SOUTH,
                crate::domain::Direction::West => s2c::MAP_SLICE_WEST,
            },
            Self::MoveCreature(_) => s2c::MOVE_CREATURE,
            Self::AddTileThing(_) => s2c::ADD_TILE_THING,
            Self::UpdateTileItem(_) => s2c::UPDATE_TILE_ITEM,
            Self::RemoveTileThing(_) | Self::RemoveTileCreature(_) => s2c::REMOVE_TILE_THING,
            Self::MagicEffect(_) => s2c::MAGIC_EFFECT,
            Self::WorldLight(_) => s2c::WORLD_LIGHT,
            Self::CreatureLight(_) => s2c::CREATURE_LIGHT,
            Self::CreatureHealth(_) => s2c::CREATURE_HEALTH,
            Self::AddInventoryItem(_) => s2c::ADD_INVENTORY_ITEM,
            Self::RemoveInventoryItem(_) => s2c::REMOVE_INVENTORY_ITEM,
            Self::OpenContainer(_) => s2c::OPEN_CONTAINER,
            Self::CloseContainer(_) => s2c::CLOSE_CONTAINER,
            Self::AddContainerItem(_) => s2c::ADD_CONTAINER_ITEM,
            Self::UpdateContainerItem(_) => s2c::UPDATE_CONTAINER_ITEM,
            Self::RemoveContainerItem(_) => s2c::REMOVE_CONTAINER_ITEM,
            Self::PlayerStats(_) => s2c::PLAYER_STATS,
            Self::PlayerSkills(_) => s2c::PLAYER_SKILLS,
            Self::PlayerIcons(_) => s2c::PLAYER_ICONS,
        }
    }
}
