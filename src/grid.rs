//! Grid placement rules.
//!
//! Pure decision functions over maps and creatures. Placement and
//! movement share one legality definition: every cell of a creature's
//! footprint must be on the map, on passable terrain, and free of other
//! creatures. Nothing here mutates battle state.

use crate::battle::{BattleMap, Creature, CreatureId, CreatureSize, GridPosition, MapCell, TerrainType};
use thiserror::Error;

/// Why a creature cannot stand at a position.
///
/// Carries the first violation found; its `Display` text is surfaced to
/// callers verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    #[error("Position extends beyond map bounds")]
    OutOfBounds,

    #[error("Blocked by {}", .terrain.name().to_lowercase())]
    Blocked { terrain: TerrainType },

    #[error("Blocked by {name}")]
    Occupied { name: String },
}

/// The set of cells a creature occupies when anchored at `position`.
///
/// The footprint is a `grid_size x grid_size` square with `position` as
/// its top-left cell. Cells are returned regardless of map bounds.
pub fn footprint(position: GridPosition, size: CreatureSize) -> Vec<GridPosition> {
    let edge = size.grid_size();
    let mut cells = Vec::with_capacity((edge * edge) as usize);
    for dy in 0..edge {
        for dx in 0..edge {
            cells.push(GridPosition::new(position.x + dx, position.y + dy));
        }
    }
    cells
}

/// Whether a creature may stand on this cell.
///
/// Walls and pits block outright. Doors block while closed. Every other
/// terrain is passable; difficult ground, water, and hazards affect
/// movement cost or risk, not legality.
pub fn is_passable(cell: &MapCell) -> bool {
    match cell.terrain {
        TerrainType::Wall | TerrainType::Pit => false,
        TerrainType::Door => cell.door_open == Some(true),
        _ => true,
    }
}

/// Check whether a creature of `size` can occupy `position` on `map`.
///
/// Every footprint cell must be in bounds, passable, and not claimed by
/// another creature's footprint. `exclude` removes one creature from the
/// occupancy check, so a creature can move within or adjacent to its own
/// current footprint. Returns the first violation found.
pub fn can_occupy(
    map: &BattleMap,
    position: GridPosition,
    size: CreatureSize,
    exclude: Option<&CreatureId>,
    creatures: &[Creature],
) -> Result<(), PlacementError> {
    for cell_pos in footprint(position, size) {
        let cell = map.cell(cell_pos).ok_or(PlacementError::OutOfBounds)?;

        if !is_passable(cell) {
            return Err(PlacementError::Blocked {
                terrain: cell.terrain,
            });
        }

        let blocking = creatures.iter().find(|other| {
            if Some(&other.id) == exclude {
                return false;
            }
            let Some(other_pos) = other.position else {
                return false;
            };
            footprint(other_pos, other.size).contains(&cell_pos)
        });

        if let Some(blocking) = blocking {
            return Err(PlacementError::Occupied {
                name: blocking.name.clone(),
            });
        }
    }

    Ok(())
}

/// Distance between two positions in grid squares, counting diagonal
/// steps as one square.
pub fn distance(a: GridPosition, b: GridPosition) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}
