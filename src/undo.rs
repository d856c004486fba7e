//! Undo history for battles.
//!
//! Each successful mutation appends one `BattleAction` carrying the
//! command that caused it and an inverse patch of the fields it touched.
//! Undo pops the most recent action and applies its patch; there is no
//! redo, so a new mutation after an undo discards that future for good.

use crate::battle::{Battle, BattleMap, Creature};
use crate::command::BattleCommand;
use serde::{Deserialize, Serialize};

/// Prior state captured by one mutation, tagged by what it touched.
///
/// Applying a patch overwrites the covered fields wholesale; snapshots
/// are taken before the mutation writes anything, so restoration is
/// exact for those fields and leaves all others alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UndoPatch {
    /// The full creature list before a roster-affecting mutation.
    Roster(Vec<Creature>),
    /// Turn pointer and round before a turn advance.
    Turn { current_turn: usize, round: u32 },
    /// The full map before a terrain or door edit.
    Map(BattleMap),
    /// Scene description before a narrative edit.
    Scene(Option<String>),
    /// Creature-position text before a narrative edit.
    Positions(Option<String>),
}

impl UndoPatch {
    /// Write the captured fields back onto the battle.
    pub fn restore(self, battle: &mut Battle) {
        match self {
            UndoPatch::Roster(creatures) => battle.creatures = creatures,
            UndoPatch::Turn {
                current_turn,
                round,
            } => {
                battle.current_turn = current_turn;
                battle.round = round;
            }
            UndoPatch::Map(map) => battle.map = Some(map),
            UndoPatch::Scene(description) => battle.scene_description = description,
            UndoPatch::Positions(positions) => battle.creature_positions = positions,
        }
    }
}

/// One reversible mutation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleAction {
    /// Monotonically increasing per store.
    pub id: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// The input that caused the mutation, verbatim.
    pub command: BattleCommand,
    pub patch: UndoPatch,
}
