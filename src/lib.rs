//! Tabletop RPG battle encounter tracking engine.
//!
//! This crate provides:
//! - Battle tracking with initiative order and round progression
//! - Grid maps with terrain, doors, and size-aware placement rules
//! - Single-step undo for every mutation
//! - A campaign library of reusable creatures and maps
//! - Dice rolling over standard notation
//!
//! The engine is a plain library with no transport of its own; REST or
//! JSON-RPC layers call into [`BattleStore`] and serialize the returned
//! battle snapshots.
//!
//! # Quick Start
//!
//! ```
//! use encounter_core::{BattleMode, BattleStore, NewCreature};
//!
//! let mut store = BattleStore::new();
//! let id = store
//!     .create_battle("Goblin Ambush", BattleMode::TheatreOfMind, None, None)
//!     .id
//!     .clone();
//!
//! store.add_creature(&id, NewCreature::named("Hero", 20, 20).with_initiative(18))?;
//! store.add_creature(&id, NewCreature::named("Goblin", 7, 7).with_initiative(12))?;
//! store.start_battle(&id)?;
//!
//! let battle = store.next_turn(&id)?;
//! assert_eq!(battle.current_creature().map(|c| c.name.as_str()), Some("Goblin"));
//! # Ok::<(), encounter_core::BattleError>(())
//! ```

pub mod battle;
pub mod campaign;
pub mod command;
pub mod dice;
pub mod grid;
pub mod persist;
pub mod store;
pub mod undo;

// Primary public API
pub use battle::{
    Ability, AbilityScores, Battle, BattleId, BattleMap, BattleMode, BattleSummary, Creature,
    CreatureId, CreatureSize, GridPosition, MapCell, MapSize, StatusEffect, TerrainType,
};
pub use campaign::{Campaign, CampaignError, CampaignId, CampaignStore, TemplateId};
pub use command::{BattleCommand, CreatureUpdate, NewCreature, TerrainEdit};
pub use dice::{roll_dice, DiceError, DiceHistory, DiceRoll, DieType};
pub use grid::PlacementError;
pub use persist::{DataPaths, PersistError};
pub use store::{BattleError, BattleStore};
pub use undo::{BattleAction, UndoPatch};

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
