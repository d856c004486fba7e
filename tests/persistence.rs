//! Save and load round trips for campaign and dice data.
//!
//! Battles themselves are never persisted; these tests cover the two
//! file-backed stores and their recovery behavior.

use encounter_core::dice::{roll_dice, DiceHistory};
use encounter_core::persist::{
    load_campaigns, load_dice_history, save_campaigns, save_dice_history, DataPaths, PersistError,
};
use encounter_core::{BattleMode, BattleStore, MapSize, NewCreature};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn test_campaign_round_trip() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::new(dir.path());

    let mut store = BattleStore::new();
    let id = store
        .create_battle(
            "Saved Fight",
            BattleMode::GridBased,
            Some(MapSize::new(8, 8)),
            None,
        )
        .id
        .clone();
    store
        .add_creature(&id, NewCreature::named("Goblin", 7, 7).with_initiative(12))
        .unwrap();

    save_campaigns(paths.campaign_file(), store.campaigns())
        .await
        .unwrap();
    let loaded = load_campaigns(paths.campaign_file()).await.unwrap();

    assert_eq!(loaded.state(), store.campaigns().state());
    let default = loaded.default_campaign().unwrap();
    assert_eq!(default.creatures.len(), 1);
    assert_eq!(default.creatures[0].name, "Goblin");
    assert_eq!(default.maps.len(), 1);
}

#[tokio::test]
async fn test_missing_campaign_file_starts_fresh() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::new(dir.path());

    let loaded = load_campaigns(paths.campaign_file()).await.unwrap();
    let default = loaded.default_campaign().unwrap();
    assert!(default.creatures.is_empty());
    assert!(default.maps.is_empty());
}

#[tokio::test]
async fn test_campaign_version_mismatch_is_rejected() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::new(dir.path());

    let state = serde_json::to_value(BattleStore::new().campaigns().state()).unwrap();
    let content = json!({
        "version": 99,
        "saved_at": 0,
        "state": state,
    });
    tokio::fs::write(paths.campaign_file(), content.to_string())
        .await
        .unwrap();

    let err = load_campaigns(paths.campaign_file()).await.unwrap_err();
    assert!(matches!(
        err,
        PersistError::VersionMismatch {
            expected: 1,
            found: 99
        }
    ));
}

#[tokio::test]
async fn test_corrupt_campaign_file_is_a_json_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::new(dir.path());

    tokio::fs::write(paths.campaign_file(), "not json at all")
        .await
        .unwrap();

    let err = load_campaigns(paths.campaign_file()).await.unwrap_err();
    assert!(matches!(err, PersistError::Json(_)));
}

#[tokio::test]
async fn test_dice_history_round_trip() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::new(dir.path());

    let mut history = DiceHistory::new();
    history.record(roll_dice("1d20", 5, Some("Attack Roll")).unwrap());
    history.record(roll_dice("2d6", 0, Some("Damage")).unwrap());

    save_dice_history(paths.dice_file(), &history).await.unwrap();
    let loaded = load_dice_history(paths.dice_file()).await.unwrap();

    assert_eq!(loaded.len(), 2);
    assert_eq!(
        loaded.recent(Some(1))[0].description.as_deref(),
        Some("Damage")
    );
    assert_eq!(loaded.recent(None), history.recent(None));
}

#[tokio::test]
async fn test_missing_dice_file_starts_fresh() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::new(dir.path());

    let loaded = load_dice_history(paths.dice_file()).await.unwrap();
    assert!(loaded.is_empty());
}
