//! Typed battle commands.
//!
//! Every mutating operation has a discriminated request type, validated
//! once at the transport boundary. The store receives strongly-shaped
//! input and dispatches on the enum, so there is no runtime lookup from
//! command names to handlers.

use crate::battle::{
    AbilityScores, Creature, CreatureId, CreatureSize, GridPosition, StatusEffect, TerrainType,
};
use serde::{Deserialize, Serialize};

fn default_ac() -> u8 {
    10
}

/// Input for adding a creature to a battle.
///
/// Optional fields fall back to creation-time defaults: AC 10,
/// initiative 0, size Medium, all ability scores 10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCreature {
    /// Caller-supplied id; generated when absent.
    #[serde(default)]
    pub id: Option<CreatureId>,
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    #[serde(default = "default_ac")]
    pub ac: u8,
    #[serde(default)]
    pub initiative: i32,
    #[serde(default)]
    pub stats: AbilityScores,
    #[serde(default)]
    pub status_effects: Vec<StatusEffect>,
    #[serde(default)]
    pub position: Option<GridPosition>,
    #[serde(default)]
    pub size: CreatureSize,
    #[serde(default)]
    pub is_player: bool,
}

impl NewCreature {
    /// Minimal input for a creature with default combat stats.
    pub fn named(name: impl Into<String>, hp: i32, max_hp: i32) -> Self {
        Self {
            id: None,
            name: name.into(),
            hp,
            max_hp,
            ac: default_ac(),
            initiative: 0,
            stats: AbilityScores::default(),
            status_effects: Vec::new(),
            position: None,
            size: CreatureSize::default(),
            is_player: false,
        }
    }

    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = initiative;
        self
    }

    pub fn with_position(mut self, position: GridPosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_size(mut self, size: CreatureSize) -> Self {
        self.size = size;
        self
    }

    /// Materialize the creature, generating an id when none was supplied.
    pub fn build(self) -> Creature {
        Creature {
            id: self.id.unwrap_or_default(),
            name: self.name,
            hp: self.hp,
            max_hp: self.max_hp,
            ac: self.ac,
            initiative: self.initiative,
            stats: self.stats,
            status_effects: self.status_effects,
            position: self.position,
            size: self.size,
            is_player: self.is_player,
        }
    }
}

/// Partial update for an existing creature.
///
/// Provided fields overwrite; absent fields keep their prior value.
/// A position set here is not checked against the map; only movement
/// commands run placement legality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureUpdate {
    pub name: Option<String>,
    pub hp: Option<i32>,
    pub max_hp: Option<i32>,
    pub ac: Option<u8>,
    pub initiative: Option<i32>,
    pub stats: Option<AbilityScores>,
    pub status_effects: Option<Vec<StatusEffect>>,
    pub position: Option<GridPosition>,
    pub size: Option<CreatureSize>,
    pub is_player: Option<bool>,
}

impl CreatureUpdate {
    /// Merge the provided fields onto a creature.
    pub fn apply_to(&self, creature: &mut Creature) {
        if let Some(name) = &self.name {
            creature.name = name.clone();
        }
        if let Some(hp) = self.hp {
            creature.hp = hp;
        }
        if let Some(max_hp) = self.max_hp {
            creature.max_hp = max_hp;
        }
        if let Some(ac) = self.ac {
            creature.ac = ac;
        }
        if let Some(initiative) = self.initiative {
            creature.initiative = initiative;
        }
        if let Some(stats) = self.stats {
            creature.stats = stats;
        }
        if let Some(status_effects) = &self.status_effects {
            creature.status_effects = status_effects.clone();
        }
        if let Some(position) = self.position {
            creature.position = Some(position);
        }
        if let Some(size) = self.size {
            creature.size = size;
        }
        if let Some(is_player) = self.is_player {
            creature.is_player = is_player;
        }
    }
}

/// A terrain edit over one or more map cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainEdit {
    pub positions: Vec<GridPosition>,
    pub terrain: TerrainType,
    /// Initial open state when painting doors.
    #[serde(default)]
    pub door_open: Option<bool>,
    #[serde(default)]
    pub elevation: Option<i32>,
    #[serde(default)]
    pub hazard_damage: Option<i32>,
}

impl TerrainEdit {
    pub fn new(positions: Vec<GridPosition>, terrain: TerrainType) -> Self {
        Self {
            positions,
            terrain,
            door_open: None,
            elevation: None,
            hazard_damage: None,
        }
    }
}

/// One mutating battle operation.
///
/// The wire form matches the command vocabulary used by the transports:
/// a `type` tag in screaming snake case with the payload under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BattleCommand {
    AddCreature(NewCreature),
    UpdateCreature {
        creature_id: CreatureId,
        updates: CreatureUpdate,
    },
    RemoveCreature {
        creature_id: CreatureId,
    },
    MoveCreature {
        creature_id: CreatureId,
        position: GridPosition,
    },
    NextTurn,
    StartBattle,
    Undo,
    SetTerrain(TerrainEdit),
    ToggleDoor {
        position: GridPosition,
    },
    UpdateSceneDescription {
        description: String,
    },
    UpdateCreaturePositions {
        positions: String,
    },
}
