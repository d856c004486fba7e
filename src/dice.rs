//! Dice rolling.
//!
//! Supports standard notation in the form `NdS`, with an optional
//! `+M`/`-M` modifier and an optional `khK`/`klK` keep suffix, such as
//! "2d20", "1d6+3", or "4d6kh3". Die sizes are restricted to the
//! standard set and counts to at most 100. Rolls are recorded in a
//! bounded history, most recent first.

use crate::now_millis;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for dice parsing and rolling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}. Use a format like \"2d20\", \"1d6+3\", or \"4d6kh3\"")]
    InvalidNotation(String),

    #[error("Invalid die type: d{0}. Valid dice: d4, d6, d8, d10, d12, d20, d100")]
    InvalidDieSize(u32),

    #[error("Dice count must be between 1 and 100")]
    InvalidCount(u32),
}

/// Standard die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// Which rolled dice count toward the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keep {
    Highest(u32),
    Lowest(u32),
}

/// A parsed notation string: `count`d`sides`, modifier, keep suffix.
#[derive(Debug, Clone)]
struct ParsedNotation {
    count: u32,
    sides: u32,
    modifier: i32,
    keep: Option<Keep>,
}

fn parse(notation: &str) -> Result<ParsedNotation, DiceError> {
    let text = notation.trim().to_lowercase();
    let invalid = || DiceError::InvalidNotation(notation.trim().to_string());

    let d_index = text.find('d').ok_or_else(invalid)?;
    let count: u32 = text[..d_index].parse().map_err(|_| invalid())?;

    let rest = &text[d_index + 1..];
    let sides_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let sides: u32 = rest[..sides_end].parse().map_err(|_| invalid())?;
    let mut tail = &rest[sides_end..];

    let mut modifier: i32 = 0;
    if tail.starts_with('+') || tail.starts_with('-') {
        let digits_end = tail[1..]
            .find(|c: char| !c.is_ascii_digit())
            .map(|i| i + 1)
            .unwrap_or(tail.len());
        modifier = tail[..digits_end].parse().map_err(|_| invalid())?;
        tail = &tail[digits_end..];
    }

    let keep = if tail.is_empty() {
        None
    } else if let Some(keep_str) = tail.strip_prefix("kh") {
        Some(Keep::Highest(parse_keep_count(keep_str, count, invalid)?))
    } else if let Some(keep_str) = tail.strip_prefix("kl") {
        Some(Keep::Lowest(parse_keep_count(keep_str, count, invalid)?))
    } else {
        return Err(invalid());
    };

    Ok(ParsedNotation {
        count,
        sides,
        modifier,
        keep,
    })
}

/// A bare `kh`/`kl` keeps every die, matching a keep count equal to the
/// roll count.
fn parse_keep_count(
    keep_str: &str,
    count: u32,
    invalid: impl Fn() -> DiceError,
) -> Result<u32, DiceError> {
    if keep_str.is_empty() {
        Ok(count)
    } else {
        keep_str.parse().map_err(|_| invalid())
    }
}

/// The result of one dice roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceRoll {
    /// The notation rolled, with any extra modifier folded in.
    pub notation: String,
    /// Every die rolled, before any keep filtering.
    pub rolls: Vec<u32>,
    /// Sum of the kept dice plus the combined modifier.
    pub total: i32,
    /// Combined modifier from the notation and the extra argument.
    pub modifier: i32,
    /// What this roll was for.
    #[serde(default)]
    pub description: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.notation, self.total)
    }
}

/// Roll dice from a notation string.
///
/// `extra_modifier` is added on top of any modifier in the notation and
/// echoed into the result's notation text.
pub fn roll_dice(
    notation: &str,
    extra_modifier: i32,
    description: Option<&str>,
) -> Result<DiceRoll, DiceError> {
    roll_dice_with_rng(&mut rand::thread_rng(), notation, extra_modifier, description)
}

/// Roll with a specific RNG (useful for testing).
pub fn roll_dice_with_rng<R: Rng>(
    rng: &mut R,
    notation: &str,
    extra_modifier: i32,
    description: Option<&str>,
) -> Result<DiceRoll, DiceError> {
    let parsed = parse(notation)?;
    let die = DieType::from_sides(parsed.sides).ok_or(DiceError::InvalidDieSize(parsed.sides))?;
    if !(1..=100).contains(&parsed.count) {
        return Err(DiceError::InvalidCount(parsed.count));
    }

    let rolls: Vec<u32> = (0..parsed.count)
        .map(|_| rng.gen_range(1..=die.sides()))
        .collect();

    let mut kept = rolls.clone();
    match parsed.keep {
        Some(Keep::Highest(keep)) if keep < parsed.count => {
            kept.sort_by(|a, b| b.cmp(a));
            kept.truncate(keep as usize);
        }
        Some(Keep::Lowest(keep)) if keep < parsed.count => {
            kept.sort_unstable();
            kept.truncate(keep as usize);
        }
        _ => {}
    }

    let modifier = parsed.modifier + extra_modifier;
    let total = kept.iter().sum::<u32>() as i32 + modifier;

    let notation = if extra_modifier != 0 {
        format!("{notation}{extra_modifier:+}")
    } else {
        notation.to_string()
    };

    Ok(DiceRoll {
        notation,
        rolls,
        total,
        modifier,
        description: description.map(String::from),
        timestamp: now_millis(),
    })
}

/// Roll with advantage (2d20, keep highest).
pub fn roll_with_advantage(
    modifier: i32,
    description: Option<&str>,
) -> Result<DiceRoll, DiceError> {
    roll_dice("2d20kh1", modifier, description.or(Some("Advantage")))
}

/// Roll with disadvantage (2d20, keep lowest).
pub fn roll_with_disadvantage(
    modifier: i32,
    description: Option<&str>,
) -> Result<DiceRoll, DiceError> {
    roll_dice("2d20kl1", modifier, description.or(Some("Disadvantage")))
}

/// Roll an ability score (4d6, drop lowest).
pub fn roll_ability_score() -> Result<DiceRoll, DiceError> {
    roll_dice("4d6kh3", 0, Some("Ability Score"))
}

/// Roll initiative for a creature.
pub fn roll_initiative(modifier: i32) -> Result<DiceRoll, DiceError> {
    roll_dice("1d20", modifier, Some("Initiative"))
}

/// Roll an attack.
pub fn roll_attack(modifier: i32) -> Result<DiceRoll, DiceError> {
    roll_dice("1d20", modifier, Some("Attack Roll"))
}

/// Roll a saving throw, optionally named for an ability.
pub fn roll_saving_throw(modifier: i32, ability: Option<&str>) -> Result<DiceRoll, DiceError> {
    let description = ability.map_or_else(|| "Saving Throw".to_string(), |a| format!("{a} Save"));
    roll_dice("1d20", modifier, Some(description.as_str()))
}

/// Roll a skill check, optionally named for a skill.
pub fn roll_skill_check(modifier: i32, skill: Option<&str>) -> Result<DiceRoll, DiceError> {
    let description = skill.map_or_else(|| "Skill Check".to_string(), |s| format!("{s} Check"));
    roll_dice("1d20", modifier, Some(description.as_str()))
}

/// Roll damage from a notation string.
pub fn roll_damage(notation: &str, description: Option<&str>) -> Result<DiceRoll, DiceError> {
    roll_dice(notation, 0, description.or(Some("Damage")))
}

/// Bounded log of past rolls, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceHistory {
    rolls: Vec<DiceRoll>,
    max_rolls: usize,
}

/// How many rolls the history keeps by default.
pub const DEFAULT_MAX_ROLLS: usize = 100;

impl DiceHistory {
    pub fn new() -> Self {
        Self {
            rolls: Vec::new(),
            max_rolls: DEFAULT_MAX_ROLLS,
        }
    }

    /// Add a roll to the front of the history, dropping the oldest
    /// entries beyond the cap.
    pub fn record(&mut self, roll: DiceRoll) {
        self.rolls.insert(0, roll);
        self.rolls.truncate(self.max_rolls);
    }

    /// The most recent rolls, newest first.
    pub fn recent(&self, limit: Option<usize>) -> &[DiceRoll] {
        match limit {
            Some(limit) => &self.rolls[..limit.min(self.rolls.len())],
            None => &self.rolls,
        }
    }

    pub fn len(&self) -> usize {
        self.rolls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rolls.is_empty()
    }

    pub fn clear(&mut self) {
        self.rolls.clear();
    }
}

impl Default for DiceHistory {
    fn default() -> Self {
        Self::new()
    }
}
