//! File-backed snapshots for reusable data.
//!
//! Campaign state and dice history are saved as versioned JSON
//! documents. Battles are deliberately not persisted; they live in
//! memory only and are lost on restart. Missing files load as fresh
//! state so first runs need no setup.

use crate::campaign::{CampaignState, CampaignStore};
use crate::dice::DiceHistory;
use crate::now_millis;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// Locations of the data files, injected by the host.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub data_dir: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn campaign_file(&self) -> PathBuf {
        self.data_dir.join("campaign-data.json")
    }

    pub fn dice_file(&self) -> PathBuf {
        self.data_dir.join("dice-rolls.json")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedCampaigns {
    version: u32,
    saved_at: u64,
    state: CampaignState,
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedDiceHistory {
    version: u32,
    saved_at: u64,
    history: DiceHistory,
}

fn check_version(found: u32) -> Result<(), PersistError> {
    if found != SAVE_VERSION {
        return Err(PersistError::VersionMismatch {
            expected: SAVE_VERSION,
            found,
        });
    }
    Ok(())
}

/// Save the campaign library to a JSON file.
pub async fn save_campaigns(
    path: impl AsRef<Path>,
    store: &CampaignStore,
) -> Result<(), PersistError> {
    let saved = SavedCampaigns {
        version: SAVE_VERSION,
        saved_at: now_millis(),
        state: store.state().clone(),
    };
    let content = serde_json::to_string_pretty(&saved)?;
    fs::write(path.as_ref(), content).await?;
    tracing::info!(path = %path.as_ref().display(), "campaign data saved");
    Ok(())
}

/// Load the campaign library from a JSON file. A missing file yields a
/// fresh store with only the default campaign.
pub async fn load_campaigns(path: impl AsRef<Path>) -> Result<CampaignStore, PersistError> {
    let content = match fs::read_to_string(path.as_ref()).await {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::info!(
                path = %path.as_ref().display(),
                "no campaign data file found, starting fresh"
            );
            return Ok(CampaignStore::new());
        }
        Err(err) => return Err(err.into()),
    };

    let saved: SavedCampaigns = serde_json::from_str(&content)?;
    check_version(saved.version)?;
    tracing::info!(
        campaigns = saved.state.campaigns.len(),
        "campaign data loaded"
    );
    Ok(CampaignStore::from_state(saved.state))
}

/// Save the dice roll history to a JSON file.
pub async fn save_dice_history(
    path: impl AsRef<Path>,
    history: &DiceHistory,
) -> Result<(), PersistError> {
    let saved = SavedDiceHistory {
        version: SAVE_VERSION,
        saved_at: now_millis(),
        history: history.clone(),
    };
    let content = serde_json::to_string_pretty(&saved)?;
    fs::write(path.as_ref(), content).await?;
    Ok(())
}

/// Load the dice roll history from a JSON file. A missing file yields
/// an empty history.
pub async fn load_dice_history(path: impl AsRef<Path>) -> Result<DiceHistory, PersistError> {
    let content = match fs::read_to_string(path.as_ref()).await {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::info!(
                path = %path.as_ref().display(),
                "no dice history file found, starting fresh"
            );
            return Ok(DiceHistory::new());
        }
        Err(err) => return Err(err.into()),
    };

    let saved: SavedDiceHistory = serde_json::from_str(&content)?;
    check_version(saved.version)?;
    tracing::info!(rolls = saved.history.len(), "dice history loaded");
    Ok(saved.history)
}
