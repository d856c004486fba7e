//! Campaign library of reusable content.
//!
//! Campaigns hold creature and map templates that outlive individual
//! battles. A default campaign always exists and automatically collects
//! everything created during play; templates can be instantiated back
//! into battles with fresh ids and full health.

use crate::battle::{
    AbilityScores, BattleMap, Creature, CreatureId, CreatureSize, GridPosition, StatusEffect,
};
use crate::now_millis;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_CAMPAIGN_NAME: &str = "Default Campaign";
const DEFAULT_CAMPAIGN_DESCRIPTION: &str =
    "Automatically managed default campaign for all created content";

/// Unique identifier for campaigns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub String);

impl CampaignId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for CampaignId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CampaignId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for creature and map templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl TemplateId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Errors from campaign operations.
#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("Campaign not found: {0}")]
    NotFound(CampaignId),

    #[error("Campaign creature or map not found: {0}")]
    TemplateNotFound(TemplateId),

    #[error("Cannot delete the default campaign")]
    DeleteDefault,
}

/// A creature shape without instance data. Templates carry no id or
/// position and store hit points at full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureTemplate {
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub ac: u8,
    pub initiative: i32,
    pub stats: AbilityScores,
    pub status_effects: Vec<StatusEffect>,
    pub size: CreatureSize,
    pub is_player: bool,
}

impl CreatureTemplate {
    /// Capture a template from a live creature: health reset to full,
    /// lingering status effects cleared.
    pub fn from_creature(creature: &Creature) -> Self {
        Self {
            name: creature.name.clone(),
            hp: creature.max_hp,
            max_hp: creature.max_hp,
            ac: creature.ac,
            initiative: creature.initiative,
            stats: creature.stats,
            status_effects: Vec::new(),
            size: creature.size,
            is_player: creature.is_player,
        }
    }

    /// Stamp out a fresh creature instance with a new id.
    pub fn instantiate(&self, position: Option<GridPosition>) -> Creature {
        Creature {
            id: CreatureId::new(),
            name: self.name.clone(),
            hp: self.hp,
            max_hp: self.max_hp,
            ac: self.ac,
            initiative: self.initiative,
            stats: self.stats,
            status_effects: self.status_effects.clone(),
            position,
            size: self.size,
            is_player: self.is_player,
        }
    }
}

/// A reusable creature entry in a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignCreature {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub template: CreatureTemplate,
    pub created_at: u64,
    #[serde(default)]
    pub last_used: Option<u64>,
    pub usage_count: u32,
}

/// A reusable map entry in a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMap {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub template: BattleMap,
    pub created_at: u64,
    #[serde(default)]
    pub last_used: Option<u64>,
    pub usage_count: u32,
}

/// A named collection of reusable creatures and maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Exactly one campaign is the default at any time.
    pub is_default: bool,
    pub creatures: Vec<CampaignCreature>,
    pub maps: Vec<CampaignMap>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Campaign {
    fn new_default() -> Self {
        let now = now_millis();
        Self {
            id: CampaignId::new(),
            name: DEFAULT_CAMPAIGN_NAME.to_string(),
            description: Some(DEFAULT_CAMPAIGN_DESCRIPTION.to_string()),
            is_default: true,
            creatures: Vec::new(),
            maps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The full campaign collection, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignState {
    pub campaigns: Vec<Campaign>,
    pub default_campaign_id: CampaignId,
}

/// Owns all campaigns. Constructed explicitly and injected wherever
/// campaign access is needed; there is no process-wide instance.
#[derive(Debug, Clone)]
pub struct CampaignStore {
    state: CampaignState,
}

impl CampaignStore {
    /// A fresh store containing only the default campaign.
    pub fn new() -> Self {
        let default = Campaign::new_default();
        let default_id = default.id.clone();
        Self {
            state: CampaignState {
                campaigns: vec![default],
                default_campaign_id: default_id,
            },
        }
    }

    /// Rebuild a store from persisted state, repairing a missing default
    /// campaign if the data predates one.
    pub fn from_state(state: CampaignState) -> Self {
        let mut store = Self { state };
        store.ensure_default();
        store
    }

    pub fn state(&self) -> &CampaignState {
        &self.state
    }

    pub fn into_state(self) -> CampaignState {
        self.state
    }

    pub fn campaigns(&self) -> &[Campaign] {
        &self.state.campaigns
    }

    pub fn campaign(&self, id: &CampaignId) -> Option<&Campaign> {
        self.state.campaigns.iter().find(|c| &c.id == id)
    }

    pub fn default_campaign(&self) -> Option<&Campaign> {
        self.campaign(&self.state.default_campaign_id)
    }

    fn ensure_default(&mut self) {
        let default_id = self.state.default_campaign_id.clone();
        if self.state.campaigns.iter().any(|c| c.id == default_id) {
            return;
        }
        if let Some(existing) = self.state.campaigns.iter().find(|c| c.is_default) {
            self.state.default_campaign_id = existing.id.clone();
            return;
        }
        let default = Campaign::new_default();
        self.state.default_campaign_id = default.id.clone();
        self.state.campaigns.push(default);
        tracing::info!("created missing default campaign");
    }

    fn default_campaign_index(&mut self) -> usize {
        self.ensure_default();
        self.state
            .campaigns
            .iter()
            .position(|c| c.id == self.state.default_campaign_id)
            .unwrap_or(0)
    }

    fn campaign_index(&self, id: &CampaignId) -> Result<usize, CampaignError> {
        self.state
            .campaigns
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| CampaignError::NotFound(id.clone()))
    }

    // ------------------------------------------------------------------
    // Campaign management
    // ------------------------------------------------------------------

    pub fn create_campaign(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> &Campaign {
        let now = now_millis();
        let campaign = Campaign {
            id: CampaignId::new(),
            name: name.into(),
            description,
            is_default: false,
            creatures: Vec::new(),
            maps: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.state.campaigns.push(campaign);
        &self.state.campaigns[self.state.campaigns.len() - 1]
    }

    /// Rename or re-describe a campaign. The default campaign keeps its
    /// fixed name no matter what is requested.
    pub fn update_campaign(
        &mut self,
        id: &CampaignId,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<&Campaign, CampaignError> {
        let index = self.campaign_index(id)?;
        let campaign = &mut self.state.campaigns[index];

        if let Some(name) = name {
            campaign.name = if campaign.is_default {
                DEFAULT_CAMPAIGN_NAME.to_string()
            } else {
                name
            };
        }
        if let Some(description) = description {
            campaign.description = Some(description);
        }
        campaign.updated_at = now_millis();
        Ok(&self.state.campaigns[index])
    }

    /// Delete a campaign, moving its creatures and maps to the default
    /// campaign so no content is lost.
    pub fn delete_campaign(&mut self, id: &CampaignId) -> Result<(), CampaignError> {
        let index = self.campaign_index(id)?;
        if self.state.campaigns[index].is_default {
            return Err(CampaignError::DeleteDefault);
        }

        let removed = self.state.campaigns.remove(index);
        let default_index = self.default_campaign_index();
        let default = &mut self.state.campaigns[default_index];
        default.creatures.extend(removed.creatures);
        default.maps.extend(removed.maps);
        default.updated_at = now_millis();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Template registration and instantiation
    // ------------------------------------------------------------------

    /// Record a creature from a battle as a default-campaign template.
    pub fn register_creature(&mut self, creature: &Creature, battle_name: Option<&str>) {
        let now = now_millis();
        let entry = CampaignCreature {
            id: TemplateId::new(),
            name: creature.name.clone(),
            description: battle_name.map(|name| format!("From battle: {name}")),
            template: CreatureTemplate::from_creature(creature),
            created_at: now,
            last_used: None,
            usage_count: 1,
        };

        let index = self.default_campaign_index();
        let default = &mut self.state.campaigns[index];
        default.creatures.push(entry);
        default.updated_at = now;
        tracing::debug!(creature = %creature.name, "registered creature template");
    }

    /// Record a battle map as a default-campaign template.
    pub fn register_map(&mut self, map: &BattleMap, battle_name: &str) {
        let now = now_millis();
        let entry = CampaignMap {
            id: TemplateId::new(),
            name: map
                .description
                .clone()
                .unwrap_or_else(|| format!("Map from {battle_name}")),
            description: Some(format!(
                "{}x{} map from battle: {battle_name}",
                map.width, map.height
            )),
            template: map.clone(),
            created_at: now,
            last_used: None,
            usage_count: 1,
        };

        tracing::debug!(map = %entry.name, "registered map template");
        let index = self.default_campaign_index();
        let default = &mut self.state.campaigns[index];
        default.maps.push(entry);
        default.updated_at = now;
    }

    /// Look up a creature template across all campaigns.
    pub fn creature_template(&self, id: &TemplateId) -> Option<&CampaignCreature> {
        self.state
            .campaigns
            .iter()
            .flat_map(|c| c.creatures.iter())
            .find(|t| &t.id == id)
    }

    /// Instantiate a creature from a template, bumping its usage stats.
    /// Returns `None` when no campaign holds the template.
    pub fn instantiate_creature(
        &mut self,
        id: &TemplateId,
        position: Option<GridPosition>,
    ) -> Option<Creature> {
        let now = now_millis();
        for campaign in &mut self.state.campaigns {
            if let Some(entry) = campaign.creatures.iter_mut().find(|t| &t.id == id) {
                entry.usage_count += 1;
                entry.last_used = Some(now);
                campaign.updated_at = now;
                return Some(entry.template.instantiate(position));
            }
        }
        None
    }

    pub fn move_creature_to_campaign(
        &mut self,
        creature_id: &TemplateId,
        source: &CampaignId,
        target: &CampaignId,
    ) -> Result<(), CampaignError> {
        let source_index = self.campaign_index(source)?;
        let target_index = self.campaign_index(target)?;

        let entry_index = self.state.campaigns[source_index]
            .creatures
            .iter()
            .position(|t| &t.id == creature_id)
            .ok_or_else(|| CampaignError::TemplateNotFound(creature_id.clone()))?;

        let entry = self.state.campaigns[source_index].creatures.remove(entry_index);
        let now = now_millis();
        self.state.campaigns[source_index].updated_at = now;
        let target = &mut self.state.campaigns[target_index];
        target.creatures.push(entry);
        target.updated_at = now;
        Ok(())
    }

    pub fn move_map_to_campaign(
        &mut self,
        map_id: &TemplateId,
        source: &CampaignId,
        target: &CampaignId,
    ) -> Result<(), CampaignError> {
        let source_index = self.campaign_index(source)?;
        let target_index = self.campaign_index(target)?;

        let entry_index = self.state.campaigns[source_index]
            .maps
            .iter()
            .position(|t| &t.id == map_id)
            .ok_or_else(|| CampaignError::TemplateNotFound(map_id.clone()))?;

        let entry = self.state.campaigns[source_index].maps.remove(entry_index);
        let now = now_millis();
        self.state.campaigns[source_index].updated_at = now;
        let target = &mut self.state.campaigns[target_index];
        target.maps.push(entry);
        target.updated_at = now;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Case-insensitive search over creature names and descriptions,
    /// most-used first, then alphabetical.
    pub fn search_creatures(
        &self,
        query: &str,
        campaign: Option<&CampaignId>,
    ) -> Vec<&CampaignCreature> {
        let query = query.to_lowercase();
        let mut results: Vec<&CampaignCreature> = self
            .state
            .campaigns
            .iter()
            .filter(|c| campaign.map_or(true, |id| &c.id == id))
            .flat_map(|c| c.creatures.iter())
            .filter(|t| {
                t.name.to_lowercase().contains(&query)
                    || t.description
                        .as_ref()
                        .is_some_and(|d| d.to_lowercase().contains(&query))
            })
            .collect();

        results.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        results
    }

    /// Case-insensitive search over map names and descriptions.
    pub fn search_maps(&self, query: &str, campaign: Option<&CampaignId>) -> Vec<&CampaignMap> {
        let query = query.to_lowercase();
        let mut results: Vec<&CampaignMap> = self
            .state
            .campaigns
            .iter()
            .filter(|c| campaign.map_or(true, |id| &c.id == id))
            .flat_map(|c| c.maps.iter())
            .filter(|t| {
                t.name.to_lowercase().contains(&query)
                    || t.description
                        .as_ref()
                        .is_some_and(|d| d.to_lowercase().contains(&query))
            })
            .collect();

        results.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.name.cmp(&b.name))
        });
        results
    }
}

impl Default for CampaignStore {
    fn default() -> Self {
        Self::new()
    }
}
