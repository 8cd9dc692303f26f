//! Static warehouse layout: dimensions plus obstacle and zone cells.

use std::collections::BTreeSet;

use crate::{CoreError, CoreResult, GridBounds, GridPosition};

/// Immutable floor plan used by planners, the package store, and renderers.
///
/// Built once per run and never mutated afterwards; wh-sim shares it behind
/// an `Arc` so snapshots can reference it without copying.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WarehouseLayout {
    pub width:          u32,
    pub height:         u32,
    /// Render size of one cell in pixels.  Informational only.
    pub cell_size:      u32,
    pub obstacles:      BTreeSet<GridPosition>,
    /// Ordered: package spawning picks uniformly among the free entries.
    pub pickup_zones:   Vec<GridPosition>,
    /// Ordered: nearest-dropoff ties resolve to the earlier entry.
    pub dropoff_zones:  Vec<GridPosition>,
    pub charging_zones: Vec<GridPosition>,
}

impl WarehouseLayout {
    /// An empty `width` × `height` floor with no zones.
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        Self {
            width,
            height,
            cell_size,
            obstacles:      BTreeSet::new(),
            pickup_zones:   Vec::new(),
            dropoff_zones:  Vec::new(),
            charging_zones: Vec::new(),
        }
    }

    #[inline]
    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.width, self.height)
    }

    #[inline]
    pub fn contains(&self, pos: GridPosition) -> bool {
        self.bounds().contains(pos)
    }

    #[inline]
    pub fn is_obstacle(&self, pos: GridPosition) -> bool {
        self.obstacles.contains(&pos)
    }

    /// Check that the layout is usable for a run.
    ///
    /// Rejects empty dimensions, zones outside the grid, zones placed on
    /// obstacles, and cells that are both pickup and dropoff (a delivery leg
    /// must have at least one move).
    pub fn validate(&self) -> CoreResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::Layout(format!(
                "grid must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.pickup_zones.is_empty() {
            return Err(CoreError::Layout("at least one pickup zone is required".into()));
        }
        if self.dropoff_zones.is_empty() {
            return Err(CoreError::Layout("at least one dropoff zone is required".into()));
        }

        let zones = self
            .pickup_zones
            .iter()
            .chain(&self.dropoff_zones)
            .chain(&self.charging_zones);
        for &pos in zones.clone().chain(&self.obstacles) {
            self.check_bounds(pos)?;
        }
        for &pos in zones {
            if self.is_obstacle(pos) {
                return Err(CoreError::Layout(format!("zone cell {pos} is an obstacle")));
            }
        }
        if let Some(pos) = self.pickup_zones.iter().find(|p| self.dropoff_zones.contains(*p)) {
            return Err(CoreError::Layout(format!("cell {pos} is both pickup and dropoff")));
        }
        Ok(())
    }

    /// `Ok(())` if `pos` lies inside the grid.
    pub fn check_bounds(&self, pos: GridPosition) -> CoreResult<()> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(CoreError::OutOfBounds { pos, width: self.width, height: self.height })
        }
    }

    /// Dropoff zone closest to `pos` by Manhattan distance.
    ///
    /// Returns `None` only for a layout with no dropoff zones.
    pub fn nearest_dropoff(&self, pos: GridPosition) -> Option<GridPosition> {
        self.dropoff_zones
            .iter()
            .copied()
            .min_by_key(|d| d.manhattan(pos))
    }
}
