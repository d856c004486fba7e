//! Battle tracker data model.
//!
//! Contains the types for a tracked encounter: battles, creatures,
//! ability scores, the grid map with its terrain, and summaries for
//! cheap listings.

use crate::undo::BattleAction;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for battles.
///
/// Stored as an opaque string so callers may supply their own ids;
/// generated ids are UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BattleId(pub String);

impl BattleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for BattleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BattleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for creatures within a battle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureId(pub String);

impl CreatureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for CreatureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CreatureId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Ability scores container. Scores range 1 to 30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl AbilityScores {
    pub fn new(str: u8, dex: u8, con: u8, int: u8, wis: u8, cha: u8) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn get(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    /// Ability modifier: score 8-9 = -1, 10-11 = 0, 12-13 = +1, etc.
    /// Floor division handles scores below 10 correctly.
    pub fn modifier(&self, ability: Ability) -> i8 {
        let score = self.get(ability) as i8;
        (score - 10).div_euclid(2)
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

// ============================================================================
// Creatures
// ============================================================================

/// Creature size category, which determines grid footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CreatureSize {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
}

impl CreatureSize {
    /// Edge length of the occupied square, in grid cells.
    ///
    /// A creature occupies `grid_size x grid_size` cells anchored at its
    /// position (top-left cell).
    pub fn grid_size(&self) -> i32 {
        match self {
            CreatureSize::Tiny | CreatureSize::Small | CreatureSize::Medium => 1,
            CreatureSize::Large => 2,
            CreatureSize::Huge => 3,
            CreatureSize::Gargantuan => 4,
        }
    }

    /// Melee reach in feet.
    pub fn reach(&self) -> u32 {
        match self {
            CreatureSize::Tiny => 0,
            CreatureSize::Small | CreatureSize::Medium | CreatureSize::Large => 5,
            CreatureSize::Huge => 10,
            CreatureSize::Gargantuan => 15,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CreatureSize::Tiny => "Tiny",
            CreatureSize::Small => "Small",
            CreatureSize::Medium => "Medium",
            CreatureSize::Large => "Large",
            CreatureSize::Huge => "Huge",
            CreatureSize::Gargantuan => "Gargantuan",
        }
    }
}

impl fmt::Display for CreatureSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An ongoing status effect on a creature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Remaining duration in rounds, if tracked.
    #[serde(default)]
    pub duration: Option<u32>,
    /// Whether the effect requires concentration.
    #[serde(default)]
    pub concentration: bool,
}

impl StatusEffect {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            duration: None,
            concentration: false,
        }
    }
}

/// One combatant in a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub id: CreatureId,
    pub name: String,
    /// Current hit points. May drop to zero or below.
    pub hp: i32,
    pub max_hp: i32,
    /// Armor class.
    pub ac: u8,
    /// Turn-order priority. Higher acts first.
    pub initiative: i32,
    pub stats: AbilityScores,
    pub status_effects: Vec<StatusEffect>,
    /// Grid position, present only when placed on a grid-based battle.
    /// Anchors the top-left cell of the creature's footprint.
    #[serde(default)]
    pub position: Option<GridPosition>,
    pub size: CreatureSize,
    pub is_player: bool,
}

// ============================================================================
// Grid Map
// ============================================================================

/// A cell coordinate on the battle map, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Terrain kinds for battle map cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TerrainType {
    #[default]
    Empty,
    Wall,
    DifficultTerrain,
    Water,
    Pit,
    Door,
    Window,
    Cover,
    HeavyCover,
    Stairs,
    Hazard,
}

impl TerrainType {
    pub fn name(&self) -> &'static str {
        match self {
            TerrainType::Empty => "Empty",
            TerrainType::Wall => "Wall",
            TerrainType::DifficultTerrain => "DifficultTerrain",
            TerrainType::Water => "Water",
            TerrainType::Pit => "Pit",
            TerrainType::Door => "Door",
            TerrainType::Window => "Window",
            TerrainType::Cover => "Cover",
            TerrainType::HeavyCover => "HeavyCover",
            TerrainType::Stairs => "Stairs",
            TerrainType::Hazard => "Hazard",
        }
    }

    /// Movement cost multiplier when entering this terrain. Difficult
    /// terrain and water cost double; blocking terrain has no cost.
    pub fn movement_cost(&self) -> u32 {
        match self {
            TerrainType::Wall | TerrainType::Pit => 0,
            TerrainType::DifficultTerrain | TerrainType::Water => 2,
            _ => 1,
        }
    }

    /// AC and Dexterity save bonus granted to a creature in this terrain.
    pub fn cover_bonus(&self) -> u32 {
        match self {
            TerrainType::Cover => 2,
            TerrainType::HeavyCover => 5,
            _ => 0,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TerrainType::Empty => "Open terrain",
            TerrainType::Wall => "Solid wall",
            TerrainType::DifficultTerrain => "Difficult terrain (costs extra movement)",
            TerrainType::Water => "Water (may require swimming)",
            TerrainType::Pit => "Pit or chasm",
            TerrainType::Door => "Door (can be opened)",
            TerrainType::Window => "Window",
            TerrainType::Cover => "Half cover (+2 AC/Dex saves)",
            TerrainType::HeavyCover => "Three-quarters cover (+5 AC/Dex saves)",
            TerrainType::Stairs => "Stairs to different level",
            TerrainType::Hazard => "Hazardous terrain",
        }
    }
}

impl fmt::Display for TerrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One grid square on a battle map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapCell {
    pub x: i32,
    pub y: i32,
    pub terrain: TerrainType,
    /// Whether the door is open. Meaningful only when terrain is `Door`.
    #[serde(default)]
    pub door_open: Option<bool>,
    /// Height level, for stairs and raised platforms.
    #[serde(default)]
    pub elevation: Option<i32>,
    /// Damage dealt by this cell. Meaningful only when terrain is `Hazard`.
    #[serde(default)]
    pub hazard_damage: Option<i32>,
}

impl MapCell {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            terrain: TerrainType::Empty,
            door_open: None,
            elevation: None,
            hazard_damage: None,
        }
    }
}

/// Requested dimensions for a new battle map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: u32,
    pub height: u32,
}

impl MapSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for MapSize {
    /// The standard 25x25 battlefield.
    fn default() -> Self {
        Self {
            width: 25,
            height: 25,
        }
    }
}

/// A grid-based battlefield. Dimensions are fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleMap {
    pub width: u32,
    pub height: u32,
    /// Cells indexed `[y][x]`.
    pub cells: Vec<Vec<MapCell>>,
    #[serde(default)]
    pub description: Option<String>,
}

impl BattleMap {
    /// Create a map of the given size with every cell set to `Empty`.
    pub fn new(size: MapSize, description: Option<String>) -> Self {
        let cells = (0..size.height as i32)
            .map(|y| (0..size.width as i32).map(|x| MapCell::new(x, y)).collect())
            .collect();

        Self {
            width: size.width,
            height: size.height,
            cells,
            description,
        }
    }

    /// Check that a position lies on the map.
    pub fn in_bounds(&self, position: GridPosition) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as u32) < self.width
            && (position.y as u32) < self.height
    }

    /// Get the cell at a position, if it is on the map.
    pub fn cell(&self, position: GridPosition) -> Option<&MapCell> {
        if !self.in_bounds(position) {
            return None;
        }
        self.cells
            .get(position.y as usize)
            .and_then(|row| row.get(position.x as usize))
    }

    pub fn cell_mut(&mut self, position: GridPosition) -> Option<&mut MapCell> {
        if !self.in_bounds(position) {
            return None;
        }
        self.cells
            .get_mut(position.y as usize)
            .and_then(|row| row.get_mut(position.x as usize))
    }
}

// ============================================================================
// Battles
// ============================================================================

/// How a battle tracks creature placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BattleMode {
    /// Narrative positioning described in free text.
    #[default]
    TheatreOfMind,
    /// Positions tracked on a grid map.
    GridBased,
}

/// One tracked combat encounter.
///
/// The creature list stays sorted by initiative descending after every
/// add. `current_turn` indexes into it; `round` starts at 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battle {
    pub id: BattleId,
    pub name: String,
    pub creatures: Vec<Creature>,
    pub current_turn: usize,
    pub round: u32,
    pub is_active: bool,
    pub history: Vec<BattleAction>,
    pub mode: BattleMode,
    /// Present if and only if the mode is `GridBased`.
    #[serde(default)]
    pub map: Option<BattleMap>,
    /// Free-text description of the battlefield, for theatre of mind.
    #[serde(default)]
    pub scene_description: Option<String>,
    /// Narrative description of where creatures stand, for theatre of mind.
    #[serde(default)]
    pub creature_positions: Option<String>,
}

impl Battle {
    /// The creature whose turn it is, if any.
    pub fn current_creature(&self) -> Option<&Creature> {
        self.creatures.get(self.current_turn)
    }

    /// Find a creature by id.
    pub fn creature(&self, id: &CreatureId) -> Option<&Creature> {
        self.creatures.iter().find(|c| &c.id == id)
    }

    /// Cheap listing view of this battle.
    pub fn summary(&self) -> BattleSummary {
        BattleSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            mode: self.mode,
            creature_count: self.creatures.len(),
            is_active: self.is_active,
        }
    }
}

/// Listing view of a battle. Full detail requires fetching the battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSummary {
    pub id: BattleId,
    pub name: String,
    pub mode: BattleMode,
    pub creature_count: usize,
    pub is_active: bool,
}
