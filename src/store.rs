//! Battle registry and mutator.
//!
//! `BattleStore` is the single writer of battle state. Every mutating
//! operation looks the battle up, checks any spatial precondition
//! against the grid rules, applies the change, and appends one undo
//! entry. Checks run before the first write, so a failed operation
//! leaves the battle untouched.
//!
//! The store is synchronous and expects at most one in-flight mutation
//! per battle; a multi-threaded host must wrap it in a mutex or a
//! single-writer task.

use crate::battle::{
    Battle, BattleId, BattleMap, BattleMode, BattleSummary, Creature, CreatureId, GridPosition,
    MapSize, TerrainType,
};
use crate::campaign::{CampaignStore, TemplateId};
use crate::command::{BattleCommand, CreatureUpdate, NewCreature, TerrainEdit};
use crate::grid;
use crate::now_millis;
use crate::undo::{BattleAction, UndoPatch};
use std::collections::HashMap;
use thiserror::Error;

/// Failures from battle operations.
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("Battle not found: {0}")]
    BattleNotFound(BattleId),

    #[error("Creature not found: {0}")]
    CreatureNotFound(CreatureId),

    #[error("Campaign creature not found: {0}")]
    TemplateNotFound(TemplateId),

    #[error("Battle has no creatures")]
    EmptyRoster,

    #[error("Nothing to undo")]
    EmptyHistory,

    /// The command violates a game or spatial rule. The message names
    /// the violated rule and is surfaced to callers verbatim.
    #[error("{0}")]
    Impossible(String),
}

impl BattleError {
    /// Whether this failure means a missing resource rather than a
    /// rejected command. Transports map the former to 404-equivalents
    /// and the latter to 400-equivalents.
    pub fn is_not_found(&self) -> bool {
        !matches!(self, BattleError::Impossible(_))
    }
}

fn lookup<'a>(
    battles: &'a HashMap<BattleId, Battle>,
    id: &BattleId,
) -> Result<&'a Battle, BattleError> {
    battles
        .get(id)
        .ok_or_else(|| BattleError::BattleNotFound(id.clone()))
}

fn lookup_mut<'a>(
    battles: &'a mut HashMap<BattleId, Battle>,
    id: &BattleId,
) -> Result<&'a mut Battle, BattleError> {
    battles
        .get_mut(id)
        .ok_or_else(|| BattleError::BattleNotFound(id.clone()))
}

/// Rebuild the add-creature input that produced an instantiated
/// creature, for recording on the undo history.
fn creature_input(creature: &Creature) -> NewCreature {
    NewCreature {
        id: Some(creature.id.clone()),
        name: creature.name.clone(),
        hp: creature.hp,
        max_hp: creature.max_hp,
        ac: creature.ac,
        initiative: creature.initiative,
        stats: creature.stats,
        status_effects: creature.status_effects.clone(),
        position: creature.position,
        size: creature.size,
        is_player: creature.is_player,
    }
}

/// Registry of all battles and the sole writer of their state.
#[derive(Debug)]
pub struct BattleStore {
    battles: HashMap<BattleId, Battle>,
    campaigns: CampaignStore,
    action_counter: u64,
}

impl BattleStore {
    /// An empty store with a fresh campaign library.
    pub fn new() -> Self {
        Self::with_campaigns(CampaignStore::new())
    }

    /// An empty store around an existing campaign library, for example
    /// one loaded from disk.
    pub fn with_campaigns(campaigns: CampaignStore) -> Self {
        Self {
            battles: HashMap::new(),
            campaigns,
            action_counter: 0,
        }
    }

    pub fn campaigns(&self) -> &CampaignStore {
        &self.campaigns
    }

    pub fn campaigns_mut(&mut self) -> &mut CampaignStore {
        &mut self.campaigns
    }

    fn next_action(&mut self, command: BattleCommand, patch: UndoPatch) -> BattleAction {
        self.action_counter += 1;
        BattleAction {
            id: self.action_counter,
            timestamp: now_millis(),
            command,
            patch,
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn get_battle(&self, id: &BattleId) -> Option<&Battle> {
        self.battles.get(id)
    }

    /// Summaries of every battle. Full state requires `get_battle`.
    pub fn battles(&self) -> Vec<BattleSummary> {
        self.battles.values().map(Battle::summary).collect()
    }

    // ------------------------------------------------------------------
    // Battle lifecycle
    // ------------------------------------------------------------------

    /// Create a battle. Grid-based battles get an all-empty map of the
    /// requested size (25x25 when unspecified), which is also registered
    /// to the default campaign for reuse.
    pub fn create_battle(
        &mut self,
        name: impl Into<String>,
        mode: BattleMode,
        map_size: Option<MapSize>,
        scene_description: Option<String>,
    ) -> &Battle {
        let name = name.into();
        let id = BattleId::new();

        let map = match mode {
            BattleMode::GridBased => Some(BattleMap::new(
                map_size.unwrap_or_default(),
                Some(format!("Battle map for {name}")),
            )),
            BattleMode::TheatreOfMind => None,
        };

        let battle = Battle {
            id: id.clone(),
            name,
            creatures: Vec::new(),
            current_turn: 0,
            round: 1,
            is_active: false,
            history: Vec::new(),
            mode,
            map,
            scene_description: match mode {
                BattleMode::TheatreOfMind => scene_description,
                BattleMode::GridBased => None,
            },
            creature_positions: None,
        };

        if let Some(map) = &battle.map {
            self.campaigns.register_map(map, &battle.name);
        }
        tracing::info!(battle = %id, name = %battle.name, mode = ?mode, "created battle");

        self.battles.entry(id).or_insert(battle)
    }

    /// Activate a battle and reset it to the top of round one. This is
    /// a hard reset, not a resume.
    pub fn start_battle(&mut self, battle_id: &BattleId) -> Result<&Battle, BattleError> {
        let battle = lookup_mut(&mut self.battles, battle_id)?;
        battle.is_active = true;
        battle.current_turn = 0;
        battle.round = 1;
        tracing::info!(battle = %battle.id, "battle started");
        Ok(battle)
    }

    // ------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------

    /// Add a creature and re-sort the roster by initiative descending.
    /// On grid-based battles a supplied position must be a legal
    /// placement. The creature is also registered to the default
    /// campaign as a reusable template.
    pub fn add_creature(
        &mut self,
        battle_id: &BattleId,
        input: NewCreature,
    ) -> Result<&Battle, BattleError> {
        let battle = lookup(&self.battles, battle_id)?;
        if battle.mode == BattleMode::GridBased {
            if let (Some(map), Some(position)) = (battle.map.as_ref(), input.position) {
                grid::can_occupy(map, position, input.size, None, &battle.creatures).map_err(
                    |reason| {
                        BattleError::Impossible(format!(
                            "Cannot place creature at position: {reason}"
                        ))
                    },
                )?;
            }
        }
        let prior = battle.creatures.clone();
        let battle_name = battle.name.clone();

        let action = self.next_action(
            BattleCommand::AddCreature(input.clone()),
            UndoPatch::Roster(prior),
        );
        let creature = input.build();

        let battle = lookup_mut(&mut self.battles, battle_id)?;
        battle.creatures.push(creature.clone());
        battle
            .creatures
            .sort_by(|a, b| b.initiative.cmp(&a.initiative));
        battle.history.push(action);

        self.campaigns
            .register_creature(&creature, Some(&battle_name));
        lookup(&self.battles, battle_id)
    }

    /// Merge the provided fields onto a creature. Positions set this way
    /// are not checked against the map, and a changed initiative does
    /// not reorder the roster mid-combat.
    pub fn update_creature(
        &mut self,
        battle_id: &BattleId,
        creature_id: &CreatureId,
        updates: CreatureUpdate,
    ) -> Result<&Battle, BattleError> {
        let battle = lookup(&self.battles, battle_id)?;
        let index = battle
            .creatures
            .iter()
            .position(|c| &c.id == creature_id)
            .ok_or_else(|| BattleError::CreatureNotFound(creature_id.clone()))?;
        let prior = battle.creatures.clone();

        let action = self.next_action(
            BattleCommand::UpdateCreature {
                creature_id: creature_id.clone(),
                updates: updates.clone(),
            },
            UndoPatch::Roster(prior),
        );

        let battle = lookup_mut(&mut self.battles, battle_id)?;
        updates.apply_to(&mut battle.creatures[index]);
        battle.history.push(action);
        Ok(battle)
    }

    /// Remove a creature from the roster. The turn pointer is left
    /// alone even when the removed creature sat at or before it.
    pub fn remove_creature(
        &mut self,
        battle_id: &BattleId,
        creature_id: &CreatureId,
    ) -> Result<&Battle, BattleError> {
        let battle = lookup(&self.battles, battle_id)?;
        if battle.creature(creature_id).is_none() {
            return Err(BattleError::CreatureNotFound(creature_id.clone()));
        }
        let prior = battle.creatures.clone();

        let action = self.next_action(
            BattleCommand::RemoveCreature {
                creature_id: creature_id.clone(),
            },
            UndoPatch::Roster(prior),
        );

        let battle = lookup_mut(&mut self.battles, battle_id)?;
        battle.creatures.retain(|c| &c.id != creature_id);
        battle.history.push(action);
        Ok(battle)
    }

    /// Move a creature to a new grid position. The whole footprint must
    /// be in bounds, on passable terrain, and clear of other creatures;
    /// the mover's own current footprint does not block it.
    pub fn move_creature(
        &mut self,
        battle_id: &BattleId,
        creature_id: &CreatureId,
        position: GridPosition,
    ) -> Result<&Battle, BattleError> {
        let battle = lookup(&self.battles, battle_id)?;
        let map = match (battle.mode, battle.map.as_ref()) {
            (BattleMode::GridBased, Some(map)) => map,
            _ => {
                return Err(BattleError::Impossible(
                    "Movement is only supported in grid-based battles".to_string(),
                ))
            }
        };
        let index = battle
            .creatures
            .iter()
            .position(|c| &c.id == creature_id)
            .ok_or_else(|| BattleError::CreatureNotFound(creature_id.clone()))?;

        grid::can_occupy(
            map,
            position,
            battle.creatures[index].size,
            Some(creature_id),
            &battle.creatures,
        )
        .map_err(|reason| {
            BattleError::Impossible(format!("Cannot move creature to position: {reason}"))
        })?;
        let prior = battle.creatures.clone();

        let action = self.next_action(
            BattleCommand::MoveCreature {
                creature_id: creature_id.clone(),
                position,
            },
            UndoPatch::Roster(prior),
        );

        let battle = lookup_mut(&mut self.battles, battle_id)?;
        battle.creatures[index].position = Some(position);
        battle.history.push(action);
        Ok(battle)
    }

    /// Instantiate a campaign template into the battle, then follow the
    /// normal add-creature placement path.
    pub fn add_creature_from_campaign(
        &mut self,
        battle_id: &BattleId,
        template_id: &TemplateId,
        position: Option<GridPosition>,
    ) -> Result<&Battle, BattleError> {
        lookup(&self.battles, battle_id)?;
        let creature = self
            .campaigns
            .instantiate_creature(template_id, position)
            .ok_or_else(|| BattleError::TemplateNotFound(template_id.clone()))?;

        let battle = lookup(&self.battles, battle_id)?;
        if battle.mode == BattleMode::GridBased {
            if let (Some(map), Some(position)) = (battle.map.as_ref(), creature.position) {
                grid::can_occupy(map, position, creature.size, None, &battle.creatures).map_err(
                    |reason| {
                        BattleError::Impossible(format!(
                            "Cannot place creature at position: {reason}"
                        ))
                    },
                )?;
            }
        }
        let prior = battle.creatures.clone();

        let action = self.next_action(
            BattleCommand::AddCreature(creature_input(&creature)),
            UndoPatch::Roster(prior),
        );

        let battle = lookup_mut(&mut self.battles, battle_id)?;
        battle.creatures.push(creature);
        battle
            .creatures
            .sort_by(|a, b| b.initiative.cmp(&a.initiative));
        battle.history.push(action);
        Ok(battle)
    }

    // ------------------------------------------------------------------
    // Turn order
    // ------------------------------------------------------------------

    /// Advance to the next creature, wrapping to the top of the roster
    /// and bumping the round counter on wrap.
    pub fn next_turn(&mut self, battle_id: &BattleId) -> Result<&Battle, BattleError> {
        let battle = lookup(&self.battles, battle_id)?;
        if battle.creatures.is_empty() {
            return Err(BattleError::EmptyRoster);
        }
        let (current_turn, round) = (battle.current_turn, battle.round);

        let action = self.next_action(
            BattleCommand::NextTurn,
            UndoPatch::Turn {
                current_turn,
                round,
            },
        );

        let battle = lookup_mut(&mut self.battles, battle_id)?;
        battle.current_turn = (battle.current_turn + 1) % battle.creatures.len();
        if battle.current_turn == 0 {
            battle.round += 1;
        }
        battle.history.push(action);
        Ok(battle)
    }

    // ------------------------------------------------------------------
    // Undo
    // ------------------------------------------------------------------

    /// Revert the most recent mutation. Only the fields captured by
    /// that mutation are restored; there is no redo.
    pub fn undo(&mut self, battle_id: &BattleId) -> Result<&Battle, BattleError> {
        let battle = lookup_mut(&mut self.battles, battle_id)?;
        let action = battle.history.pop().ok_or(BattleError::EmptyHistory)?;
        tracing::debug!(battle = %battle.id, action = action.id, "undoing action");
        action.patch.restore(battle);
        Ok(battle)
    }

    // ------------------------------------------------------------------
    // Map editing
    // ------------------------------------------------------------------

    /// Overwrite terrain on a set of cells. Every position is bounds
    /// checked before any cell is written.
    pub fn set_terrain(
        &mut self,
        battle_id: &BattleId,
        edit: TerrainEdit,
    ) -> Result<&Battle, BattleError> {
        let battle = lookup(&self.battles, battle_id)?;
        let map = match (battle.mode, battle.map.as_ref()) {
            (BattleMode::GridBased, Some(map)) => map,
            _ => {
                return Err(BattleError::Impossible(
                    "Terrain modification is only supported in grid-based battles".to_string(),
                ))
            }
        };
        for position in &edit.positions {
            if !map.in_bounds(*position) {
                return Err(BattleError::Impossible(format!(
                    "Position {position} is outside map bounds"
                )));
            }
        }
        let prior = map.clone();

        let action = self.next_action(BattleCommand::SetTerrain(edit.clone()), UndoPatch::Map(prior));

        let battle = lookup_mut(&mut self.battles, battle_id)?;
        if let Some(map) = battle.map.as_mut() {
            for position in &edit.positions {
                if let Some(cell) = map.cell_mut(*position) {
                    cell.terrain = edit.terrain;
                    if let Some(open) = edit.door_open {
                        cell.door_open = Some(open);
                    }
                    if let Some(elevation) = edit.elevation {
                        cell.elevation = Some(elevation);
                    }
                    if let Some(damage) = edit.hazard_damage {
                        cell.hazard_damage = Some(damage);
                    }
                }
            }
        }
        battle.history.push(action);
        Ok(battle)
    }

    /// Flip a door between open and closed. The target cell must hold a
    /// door.
    pub fn toggle_door(
        &mut self,
        battle_id: &BattleId,
        position: GridPosition,
    ) -> Result<&Battle, BattleError> {
        let battle = lookup(&self.battles, battle_id)?;
        let map = match (battle.mode, battle.map.as_ref()) {
            (BattleMode::GridBased, Some(map)) => map,
            _ => {
                return Err(BattleError::Impossible(
                    "Door manipulation is only supported in grid-based battles".to_string(),
                ))
            }
        };
        if !map.in_bounds(position) {
            return Err(BattleError::Impossible(format!(
                "Position {position} is outside map bounds"
            )));
        }
        match map.cell(position) {
            Some(cell) if cell.terrain == TerrainType::Door => {}
            _ => {
                return Err(BattleError::Impossible(
                    "No door at specified position".to_string(),
                ))
            }
        }
        let prior = map.clone();

        let action = self.next_action(BattleCommand::ToggleDoor { position }, UndoPatch::Map(prior));

        let battle = lookup_mut(&mut self.battles, battle_id)?;
        if let Some(cell) = battle.map.as_mut().and_then(|m| m.cell_mut(position)) {
            cell.door_open = Some(!cell.door_open.unwrap_or(false));
        }
        battle.history.push(action);
        Ok(battle)
    }

    // ------------------------------------------------------------------
    // Theatre of mind narration
    // ------------------------------------------------------------------

    pub fn update_scene_description(
        &mut self,
        battle_id: &BattleId,
        description: String,
    ) -> Result<&Battle, BattleError> {
        let battle = lookup(&self.battles, battle_id)?;
        let prior = battle.scene_description.clone();

        let action = self.next_action(
            BattleCommand::UpdateSceneDescription {
                description: description.clone(),
            },
            UndoPatch::Scene(prior),
        );

        let battle = lookup_mut(&mut self.battles, battle_id)?;
        battle.scene_description = Some(description);
        battle.history.push(action);
        Ok(battle)
    }

    pub fn update_creature_positions(
        &mut self,
        battle_id: &BattleId,
        positions: String,
    ) -> Result<&Battle, BattleError> {
        let battle = lookup(&self.battles, battle_id)?;
        let prior = battle.creature_positions.clone();

        let action = self.next_action(
            BattleCommand::UpdateCreaturePositions {
                positions: positions.clone(),
            },
            UndoPatch::Positions(prior),
        );

        let battle = lookup_mut(&mut self.battles, battle_id)?;
        battle.creature_positions = Some(positions);
        battle.history.push(action);
        Ok(battle)
    }

    // ------------------------------------------------------------------
    // Command dispatch
    // ------------------------------------------------------------------

    /// Apply one typed command to a battle.
    pub fn execute(
        &mut self,
        battle_id: &BattleId,
        command: BattleCommand,
    ) -> Result<&Battle, BattleError> {
        match command {
            BattleCommand::AddCreature(input) => self.add_creature(battle_id, input),
            BattleCommand::UpdateCreature {
                creature_id,
                updates,
            } => self.update_creature(battle_id, &creature_id, updates),
            BattleCommand::RemoveCreature { creature_id } => {
                self.remove_creature(battle_id, &creature_id)
            }
            BattleCommand::MoveCreature {
                creature_id,
                position,
            } => self.move_creature(battle_id, &creature_id, position),
            BattleCommand::NextTurn => self.next_turn(battle_id),
            BattleCommand::StartBattle => self.start_battle(battle_id),
            BattleCommand::Undo => self.undo(battle_id),
            BattleCommand::SetTerrain(edit) => self.set_terrain(battle_id, edit),
            BattleCommand::ToggleDoor { position } => self.toggle_door(battle_id, position),
            BattleCommand::UpdateSceneDescription { description } => {
                self.update_scene_description(battle_id, description)
            }
            BattleCommand::UpdateCreaturePositions { positions } => {
                self.update_creature_positions(battle_id, positions)
            }
        }
    }
}

impl Default for BattleStore {
    fn default() -> Self {
        Self::new()
    }
}
