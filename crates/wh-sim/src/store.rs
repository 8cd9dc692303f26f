//! Active package set and layout queries.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use wh_core::{GridPosition, Package, PackageId, RobotId, SimRng, WarehouseLayout};

use crate::{SimError, SimResult};

/// Undelivered packages of one run, keyed (and iterated) by id.
///
/// Delivered packages leave the set; their history lives in timeline events
/// and persistence hooks.
#[derive(Debug, Clone)]
pub struct PackageStore {
    layout:   Arc<WarehouseLayout>,
    packages: BTreeMap<PackageId, Package>,
    next_id:  u64,
}

impl PackageStore {
    pub fn new(layout: Arc<WarehouseLayout>) -> Self {
        Self { layout, packages: BTreeMap::new(), next_id: 1 }
    }

    #[inline]
    pub fn layout(&self) -> &Arc<WarehouseLayout> {
        &self.layout
    }

    /// Queue a package at a random pickup zone that holds no undelivered
    /// package.  `None` when every pickup zone is occupied.
    pub fn spawn_package(&mut self, rng: &mut SimRng, priority: &str) -> Option<Package> {
        let occupied: BTreeSet<GridPosition> = self.packages.values().map(|p| p.position).collect();
        let free: Vec<GridPosition> = self
            .layout
            .pickup_zones
            .iter()
            .copied()
            .filter(|z| !occupied.contains(z))
            .collect();
        let position = *rng.choose(&free)?;
        Some(self.insert(position, priority))
    }

    /// Queue a package at an explicit cell.
    pub fn spawn_package_at(&mut self, position: GridPosition, priority: &str) -> SimResult<Package> {
        self.layout.check_bounds(position)?;
        if self.layout.is_obstacle(position) {
            return Err(SimError::Config(format!("cannot place a package on obstacle {position}")));
        }
        Ok(self.insert(position, priority))
    }

    fn insert(&mut self, position: GridPosition, priority: &str) -> Package {
        let id = PackageId(self.next_id);
        self.next_id += 1;
        let package = Package::new(id, position, priority);
        self.packages.insert(id, package.clone());
        package
    }

    /// Dropoff zone nearest to `pos`; ties go to the earlier zone.
    pub fn nearest_dropoff(&self, pos: GridPosition) -> Option<GridPosition> {
        self.layout.nearest_dropoff(pos)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    pub fn assign(&mut self, id: PackageId, robot: RobotId) -> SimResult<&Package> {
        let package = self.get_mut_or_err(id)?;
        package.assign(robot)?;
        Ok(package)
    }

    pub fn pick_up(&mut self, id: PackageId) -> SimResult<&Package> {
        let package = self.get_mut_or_err(id)?;
        package.pick_up()?;
        Ok(package)
    }

    pub fn requeue(&mut self, id: PackageId) -> SimResult<&Package> {
        let package = self.get_mut_or_err(id)?;
        package.requeue()?;
        Ok(package)
    }

    /// Mark DELIVERED and remove from the active set.
    pub fn complete(&mut self, id: PackageId) -> SimResult<Package> {
        self.get_mut_or_err(id)?.deliver()?;
        self.packages.remove(&id).ok_or(SimError::UnknownPackage(id))
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn get(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(&id)
    }

    pub fn get_mut(&mut self, id: PackageId) -> Option<&mut Package> {
        self.packages.get_mut(&id)
    }

    fn get_mut_or_err(&mut self, id: PackageId) -> SimResult<&mut Package> {
        self.packages.get_mut(&id).ok_or(SimError::UnknownPackage(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Number of undelivered packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn clear(&mut self) {
        self.packages.clear();
    }
}
