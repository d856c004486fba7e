//! End-to-end battle tracking scenarios.
//!
//! Drives the store the way a transport would: create a battle, manage
//! the roster, advance turns, edit the map, and undo, checking the
//! returned snapshots at each step.

use encounter_core::{
    BattleCommand, BattleError, BattleId, BattleMode, BattleStore, CreatureSize, CreatureUpdate,
    GridPosition, MapSize, NewCreature, TerrainEdit, TerrainType,
};

fn grid_battle(store: &mut BattleStore, width: u32, height: u32) -> BattleId {
    store
        .create_battle(
            "Arena",
            BattleMode::GridBased,
            Some(MapSize::new(width, height)),
            None,
        )
        .id
        .clone()
}

#[test]
fn test_create_battle_defaults() {
    let mut store = BattleStore::new();
    let battle = store.create_battle("Goblin Ambush", BattleMode::TheatreOfMind, None, None);

    assert_eq!(battle.name, "Goblin Ambush");
    assert!(battle.creatures.is_empty());
    assert_eq!(battle.round, 1);
    assert_eq!(battle.current_turn, 0);
    assert!(!battle.is_active);
    assert_eq!(battle.mode, BattleMode::TheatreOfMind);
    assert!(battle.map.is_none());
    assert!(battle.history.is_empty());
}

#[test]
fn test_roster_sorts_by_initiative_descending() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Goblin Ambush", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();

    store
        .add_creature(&id, NewCreature::named("Goblin", 7, 7).with_initiative(12))
        .unwrap();
    let battle = store
        .add_creature(&id, NewCreature::named("Hero", 20, 20).with_initiative(18))
        .unwrap();

    let names: Vec<&str> = battle.creatures.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Hero", "Goblin"]);
}

#[test]
fn test_initiative_ties_keep_insertion_order() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Tied", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();

    for name in ["First", "Second", "Third"] {
        store
            .add_creature(&id, NewCreature::named(name, 10, 10).with_initiative(10))
            .unwrap();
    }
    let battle = store
        .add_creature(&id, NewCreature::named("Fast", 10, 10).with_initiative(20))
        .unwrap();

    let names: Vec<&str> = battle.creatures.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Fast", "First", "Second", "Third"]);
}

#[test]
fn test_move_onto_wall_is_impossible() {
    let mut store = BattleStore::new();
    let id = grid_battle(&mut store, 5, 5);

    store
        .set_terrain(
            &id,
            TerrainEdit::new(vec![GridPosition::new(0, 0)], TerrainType::Wall),
        )
        .unwrap();
    let battle = store
        .add_creature(
            &id,
            NewCreature::named("Fighter", 20, 20).with_position(GridPosition::new(2, 2)),
        )
        .unwrap();
    let fighter = battle.creatures[0].id.clone();

    let err = store
        .move_creature(&id, &fighter, GridPosition::new(0, 0))
        .unwrap_err();
    assert!(matches!(err, BattleError::Impossible(_)));
    assert_eq!(
        err.to_string(),
        "Cannot move creature to position: Blocked by wall"
    );

    // Position is unchanged after the rejected move.
    let battle = store.get_battle(&id).unwrap();
    assert_eq!(battle.creatures[0].position, Some(GridPosition::new(2, 2)));
}

#[test]
fn test_door_toggle_flips_once_per_call() {
    let mut store = BattleStore::new();
    let id = grid_battle(&mut store, 5, 5);
    let door = GridPosition::new(1, 1);

    store
        .set_terrain(&id, TerrainEdit::new(vec![door], TerrainType::Door))
        .unwrap();

    let battle = store.toggle_door(&id, door).unwrap();
    let cell = battle.map.as_ref().unwrap().cell(door).unwrap();
    assert_eq!(cell.door_open, Some(true));

    let battle = store.toggle_door(&id, door).unwrap();
    let cell = battle.map.as_ref().unwrap().cell(door).unwrap();
    assert_eq!(cell.door_open, Some(false));
}

#[test]
fn test_door_toggle_on_wall_fails() {
    let mut store = BattleStore::new();
    let id = grid_battle(&mut store, 5, 5);
    let wall = GridPosition::new(1, 1);

    store
        .set_terrain(&id, TerrainEdit::new(vec![wall], TerrainType::Wall))
        .unwrap();

    let err = store.toggle_door(&id, wall).unwrap_err();
    assert_eq!(err.to_string(), "No door at specified position");
    assert!(!err.is_not_found());
}

#[test]
fn test_three_turns_wrap_to_round_two() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Three Way", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();

    for (name, initiative) in [("Rogue", 21), ("Fighter", 15), ("Ogre", 8)] {
        store
            .add_creature(
                &id,
                NewCreature::named(name, 20, 20).with_initiative(initiative),
            )
            .unwrap();
    }
    store.start_battle(&id).unwrap();

    store.next_turn(&id).unwrap();
    store.next_turn(&id).unwrap();
    let battle = store.next_turn(&id).unwrap();

    assert_eq!(battle.current_turn, 0);
    assert_eq!(battle.round, 2);
}

#[test]
fn test_single_creature_rounds() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Solo", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();
    store
        .add_creature(&id, NewCreature::named("Lone Wolf", 11, 11))
        .unwrap();

    for round in 2..=5 {
        let battle = store.next_turn(&id).unwrap();
        assert_eq!(battle.current_turn, 0);
        assert_eq!(battle.round, round);
    }
}

#[test]
fn test_next_turn_without_creatures_fails() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Empty", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();

    let err = store.next_turn(&id).unwrap_err();
    assert!(matches!(err, BattleError::EmptyRoster));
    assert!(err.is_not_found());
}

#[test]
fn test_start_battle_resets_progress() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Reset", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();
    store
        .add_creature(&id, NewCreature::named("Goblin", 7, 7))
        .unwrap();

    store.next_turn(&id).unwrap();
    store.next_turn(&id).unwrap();
    let battle = store.start_battle(&id).unwrap();

    assert!(battle.is_active);
    assert_eq!(battle.current_turn, 0);
    assert_eq!(battle.round, 1);
}

#[test]
fn test_remove_then_undo_restores_roster() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Ambush", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();

    for (name, initiative) in [("Hero", 18), ("Goblin", 12), ("Wolf", 5)] {
        store
            .add_creature(
                &id,
                NewCreature::named(name, 20, 20).with_initiative(initiative),
            )
            .unwrap();
    }
    let before = store.get_battle(&id).unwrap().creatures.clone();
    let goblin = before[1].id.clone();

    let battle = store.remove_creature(&id, &goblin).unwrap();
    assert_eq!(battle.creatures.len(), 2);

    let battle = store.undo(&id).unwrap();
    assert_eq!(battle.creatures, before);
    assert_eq!(battle.creatures[1].id, goblin);
}

#[test]
fn test_undo_is_single_step_inverse() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Undoable", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();
    let battle = store
        .add_creature(&id, NewCreature::named("Goblin", 7, 7))
        .unwrap();
    let goblin = battle.creatures[0].id.clone();
    let before = battle.creatures.clone();

    let update = CreatureUpdate {
        hp: Some(1),
        initiative: Some(20),
        ..Default::default()
    };
    store.update_creature(&id, &goblin, update).unwrap();

    let battle = store.undo(&id).unwrap();
    assert_eq!(battle.creatures, before);
}

#[test]
fn test_undo_empty_history_fails() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Fresh", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();

    let err = store.undo(&id).unwrap_err();
    assert!(matches!(err, BattleError::EmptyHistory));
    assert!(err.is_not_found());
}

#[test]
fn test_removal_does_not_adjust_current_turn() {
    // Removing a creature ahead of the turn pointer shifts which
    // creature the pointer lands on. This pins the behavior so any
    // future fix is a deliberate change.
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Shift", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();

    for (name, initiative) in [("Rogue", 21), ("Fighter", 15), ("Ogre", 8)] {
        store
            .add_creature(
                &id,
                NewCreature::named(name, 20, 20).with_initiative(initiative),
            )
            .unwrap();
    }
    store.next_turn(&id).unwrap();
    let battle = store.get_battle(&id).unwrap();
    assert_eq!(battle.current_creature().unwrap().name, "Fighter");
    let rogue = battle.creatures[0].id.clone();

    let battle = store.remove_creature(&id, &rogue).unwrap();
    assert_eq!(battle.current_turn, 1);
    assert_eq!(battle.current_creature().unwrap().name, "Ogre");
}

#[test]
fn test_update_does_not_resort_roster() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Stable", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();

    store
        .add_creature(&id, NewCreature::named("Hero", 20, 20).with_initiative(18))
        .unwrap();
    let battle = store
        .add_creature(&id, NewCreature::named("Goblin", 7, 7).with_initiative(12))
        .unwrap();
    let goblin = battle.creatures[1].id.clone();

    let update = CreatureUpdate {
        initiative: Some(30),
        ..Default::default()
    };
    let battle = store.update_creature(&id, &goblin, update).unwrap();

    // Initiative changed but the turn order holds until the next add.
    assert_eq!(battle.creatures[0].name, "Hero");
    assert_eq!(battle.creatures[1].initiative, 30);
}

#[test]
fn test_gargantuan_cannot_fit_on_tiny_map() {
    let mut store = BattleStore::new();
    let id = grid_battle(&mut store, 1, 1);

    let err = store
        .add_creature(
            &id,
            NewCreature::named("Tarrasque", 676, 676)
                .with_size(CreatureSize::Gargantuan)
                .with_position(GridPosition::new(0, 0)),
        )
        .unwrap_err();
    assert!(matches!(err, BattleError::Impossible(_)));
    assert_eq!(
        err.to_string(),
        "Cannot place creature at position: Position extends beyond map bounds"
    );
}

#[test]
fn test_large_creature_blocks_and_moves() {
    let mut store = BattleStore::new();
    let id = grid_battle(&mut store, 10, 10);

    let battle = store
        .add_creature(
            &id,
            NewCreature::named("Ogre", 59, 59)
                .with_size(CreatureSize::Large)
                .with_position(GridPosition::new(2, 2)),
        )
        .unwrap();
    let ogre = battle.creatures[0].id.clone();

    // A medium creature cannot share any of the ogre's four cells.
    let err = store
        .add_creature(
            &id,
            NewCreature::named("Goblin", 7, 7).with_position(GridPosition::new(3, 3)),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot place creature at position: Blocked by Ogre"
    );

    // The ogre can shift one square into space it already occupies.
    let battle = store
        .move_creature(&id, &ogre, GridPosition::new(3, 2))
        .unwrap();
    assert_eq!(battle.creatures[0].position, Some(GridPosition::new(3, 2)));
}

#[test]
fn test_scene_description_only_set_for_theatre_of_mind_creation() {
    let mut store = BattleStore::new();
    let narrated = store
        .create_battle(
            "Narrated",
            BattleMode::TheatreOfMind,
            None,
            Some("A foggy moor".to_string()),
        )
        .id
        .clone();
    assert_eq!(
        store.get_battle(&narrated).unwrap().scene_description.as_deref(),
        Some("A foggy moor")
    );

    let gridded = store
        .create_battle(
            "Gridded",
            BattleMode::GridBased,
            None,
            Some("Ignored".to_string()),
        )
        .id
        .clone();
    assert!(store.get_battle(&gridded).unwrap().scene_description.is_none());
}

#[test]
fn test_summaries_list_without_full_state() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Listed", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();
    store
        .add_creature(&id, NewCreature::named("Goblin", 7, 7))
        .unwrap();
    store.start_battle(&id).unwrap();
    store.create_battle("Second", BattleMode::GridBased, None, None);

    let summaries = store.battles();
    assert_eq!(summaries.len(), 2);

    let listed = summaries.iter().find(|s| s.name == "Listed").unwrap();
    assert_eq!(listed.creature_count, 1);
    assert!(listed.is_active);
    assert_eq!(listed.mode, BattleMode::TheatreOfMind);
}

#[test]
fn test_command_dispatch_matches_direct_calls() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("Dispatched", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();

    store
        .execute(
            &id,
            BattleCommand::AddCreature(NewCreature::named("Goblin", 7, 7).with_initiative(12)),
        )
        .unwrap();
    store.execute(&id, BattleCommand::StartBattle).unwrap();
    store.execute(&id, BattleCommand::NextTurn).unwrap();
    let battle = store
        .execute(
            &id,
            BattleCommand::UpdateSceneDescription {
                description: "The goblin circles".to_string(),
            },
        )
        .unwrap();

    assert_eq!(battle.round, 2);
    assert_eq!(battle.scene_description.as_deref(), Some("The goblin circles"));

    let battle = store.execute(&id, BattleCommand::Undo).unwrap();
    assert!(battle.scene_description.is_none());
}

#[test]
fn test_reads_do_not_mutate() {
    let mut store = BattleStore::new();
    let id = store
        .create_battle("ReadOnly", BattleMode::TheatreOfMind, None, None)
        .id
        .clone();
    store
        .add_creature(&id, NewCreature::named("Goblin", 7, 7))
        .unwrap();

    let first = store.get_battle(&id).unwrap().clone();
    let _ = store.battles();
    let second = store.get_battle(&id).unwrap();

    assert_eq!(first.creatures, second.creatures);
    assert_eq!(first.history.len(), second.history.len());
    assert_eq!(first.round, second.round);
    assert_eq!(first.current_turn, second.current_turn);
}

#[test]
fn test_terrain_fields_applied_to_cells() {
    let mut store = BattleStore::new();
    let id = grid_battle(&mut store, 5, 5);

    let mut edit = TerrainEdit::new(
        vec![GridPosition::new(0, 0), GridPosition::new(1, 0)],
        TerrainType::Hazard,
    );
    edit.hazard_damage = Some(6);
    edit.elevation = Some(-1);
    let battle = store.set_terrain(&id, edit).unwrap();

    let map = battle.map.as_ref().unwrap();
    for position in [GridPosition::new(0, 0), GridPosition::new(1, 0)] {
        let cell = map.cell(position).unwrap();
        assert_eq!(cell.terrain, TerrainType::Hazard);
        assert_eq!(cell.hazard_damage, Some(6));
        assert_eq!(cell.elevation, Some(-1));
    }

    // Undo restores the untouched map.
    let battle = store.undo(&id).unwrap();
    let cell = battle.map.as_ref().unwrap().cell(GridPosition::new(0, 0)).unwrap();
    assert_eq!(cell.terrain, TerrainType::Empty);
    assert_eq!(cell.hazard_damage, None);
}
