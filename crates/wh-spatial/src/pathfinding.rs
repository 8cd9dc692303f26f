//! Grid pathfinding: breadth-first search and time-expanded A*.
//!
//! Both searches run on the 4-connected grid with unit edge costs and return
//! the full cell sequence **including** `start`, so `path.len() - 1` is the
//! number of moves.
//!
//! # Time expansion
//!
//! Plain A* answers "is this cell free?" against a static map.  Robots that
//! plan concurrently also need "is this cell free *at the tick I would get
//! there*?".  [`find_path_astar`] therefore tracks a tick index `t` per search
//! node (`t` = number of moves from `start`) and consults a
//! [`ReservationTable`] built from other robots' committed paths.  A successor
//! entered at tick `t` is rejected if the cell is reserved at `t` **or**
//! `t - 1`, which also rules out head-on swaps through a cell within one
//! transition window.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use wh_core::{GridBounds, GridPosition};

use crate::{SpatialError, SpatialResult};

/// Default cost ceiling for [`find_path_astar`].
pub const DEFAULT_MAX_COST: u32 = 512;

// ── Hash containers ───────────────────────────────────────────────────────────

#[cfg(not(feature = "fx-hash"))]
pub type CellSet = std::collections::HashSet<GridPosition>;
#[cfg(feature = "fx-hash")]
pub type CellSet = rustc_hash::FxHashSet<GridPosition>;

#[cfg(not(feature = "fx-hash"))]
type CellMap<V> = std::collections::HashMap<GridPosition, V>;
#[cfg(feature = "fx-hash")]
type CellMap<V> = rustc_hash::FxHashMap<GridPosition, V>;

#[cfg(not(feature = "fx-hash"))]
type TickMap<V> = std::collections::HashMap<u32, V>;
#[cfg(feature = "fx-hash")]
type TickMap<V> = rustc_hash::FxHashMap<u32, V>;

// ── ReservationTable ──────────────────────────────────────────────────────────

/// Tick index → cells occupied at that tick.
///
/// Tick 1 is the cell a robot occupies after its first move; tick 0 (the
/// current position) is never stored by [`build_reservation_table`].
#[derive(Debug, Clone, Default)]
pub struct ReservationTable {
    slots: TickMap<CellSet>,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `cell` occupied at tick `t`.
    pub fn reserve(&mut self, t: u32, cell: GridPosition) {
        self.slots.entry(t).or_default().insert(cell);
    }

    /// `true` if `cell` is occupied at tick `t`.
    #[inline]
    pub fn is_reserved(&self, t: u32, cell: GridPosition) -> bool {
        self.slots.get(&t).is_some_and(|cells| cells.contains(&cell))
    }

    /// `true` if no tick has any reserved cell.
    pub fn is_empty(&self) -> bool {
        self.slots.values().all(|cells| cells.is_empty())
    }

    /// Entering `cell` at tick `t` would collide with a committed path.
    #[inline]
    fn blocks(&self, t: u32, cell: GridPosition) -> bool {
        self.is_reserved(t, cell) || (t > 0 && self.is_reserved(t - 1, cell))
    }
}

/// Build a [`ReservationTable`] from other robots' committed paths.
///
/// Each path lists the cells still to be visited, first move first; cell `i`
/// is stored at tick `i + 1`.
pub fn build_reservation_table<'a, I>(paths: I) -> ReservationTable
where
    I: IntoIterator<Item = &'a [GridPosition]>,
{
    let mut table = ReservationTable::new();
    for path in paths {
        for (i, &cell) in path.iter().enumerate() {
            table.reserve(i as u32 + 1, cell);
        }
    }
    table
}

// ── BFS ───────────────────────────────────────────────────────────────────────

/// Unweighted shortest path by breadth-first search.
///
/// `forbidden` is an extra ad-hoc blocked set layered over `obstacles`; the
/// planner uses it to route around currently reserved cells when the
/// time-aware search fails.  `start` itself is never treated as blocked.
pub fn find_path_bfs(
    start:     GridPosition,
    end:       GridPosition,
    obstacles: &CellSet,
    bounds:    GridBounds,
    forbidden: Option<&CellSet>,
) -> SpatialResult<Vec<GridPosition>> {
    check_endpoints(start, end, bounds)?;
    if start == end {
        return Ok(vec![start]);
    }

    let blocked = |cell: &GridPosition| {
        obstacles.contains(cell) || forbidden.is_some_and(|f| f.contains(cell))
    };

    // parent[cell] = the cell we reached it from.
    let mut parent: CellMap<GridPosition> = CellMap::default();
    parent.insert(start, start);
    let mut queue = VecDeque::from([start]);

    while let Some(cell) = queue.pop_front() {
        if cell == end {
            return Ok(unwind(&parent, start, end));
        }
        for next in cell.neighbors(bounds) {
            if parent.contains_key(&next) || blocked(&next) {
                continue;
            }
            parent.insert(next, cell);
            queue.push_back(next);
        }
    }

    Err(SpatialError::NoPath { from: start, to: end })
}

fn unwind(parent: &CellMap<GridPosition>, start: GridPosition, end: GridPosition) -> Vec<GridPosition> {
    let mut path = vec![end];
    let mut cur = end;
    while cur != start {
        cur = parent[&cur];
        path.push(cur);
    }
    path.reverse();
    path
}

// ── Time-expanded A* ──────────────────────────────────────────────────────────

/// One expanded search node.  `t` is both the tick index and the path cost.
struct SearchNode {
    cell:   GridPosition,
    parent: Option<usize>,
    t:      u32,
}

/// A* over (cell, tick) honouring `reservations`.
///
/// Heuristic is Manhattan distance (admissible and consistent with unit
/// costs).  The open set is ordered by `(cost + heuristic, insertion order)`.
/// Successors whose cost would exceed `max_cost` are pruned; if pruning
/// exhausts the open set the search fails and the caller should fall back to
/// [`find_path_bfs`].
///
/// Like the grid itself, the closed set is keyed by cell only: a cell is
/// re-opened only when reached more cheaply, so the search never waits in
/// place.
pub fn find_path_astar(
    start:        GridPosition,
    end:          GridPosition,
    obstacles:    &CellSet,
    bounds:       GridBounds,
    reservations: Option<&ReservationTable>,
    max_cost:     u32,
) -> SpatialResult<Vec<GridPosition>> {
    check_endpoints(start, end, bounds)?;

    // `nodes` doubles as the insertion-order tie-break: a node's index is the
    // order in which it was pushed.
    let mut nodes: Vec<SearchNode> = vec![SearchNode { cell: start, parent: None, t: 0 }];
    let mut open: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::new();
    open.push(Reverse((start.manhattan(end), 0)));

    let mut best: CellMap<u32> = CellMap::default();
    best.insert(start, 0);

    while let Some(Reverse((_priority, idx))) = open.pop() {
        let (cell, t) = (nodes[idx].cell, nodes[idx].t);
        if cell == end {
            return Ok(reconstruct(&nodes, idx));
        }
        // Skip stale heap entries.
        if best.get(&cell).is_some_and(|&cost| cost < t) {
            continue;
        }

        let next_t = t + 1;
        if next_t > max_cost {
            continue;
        }

        for next in cell.neighbors(bounds) {
            if obstacles.contains(&next) {
                continue;
            }
            if reservations.is_some_and(|r| r.blocks(next_t, next)) {
                continue;
            }
            if best.get(&next).is_some_and(|&cost| cost <= next_t) {
                continue;
            }
            best.insert(next, next_t);

            nodes.push(SearchNode { cell: next, parent: Some(idx), t: next_t });
            open.push(Reverse((next_t + next.manhattan(end), nodes.len() - 1)));
        }
    }

    Err(SpatialError::NoPath { from: start, to: end })
}

fn reconstruct(nodes: &[SearchNode], goal: usize) -> Vec<GridPosition> {
    let mut path = Vec::with_capacity(nodes[goal].t as usize + 1);
    let mut cur = Some(goal);
    while let Some(idx) = cur {
        path.push(nodes[idx].cell);
        cur = nodes[idx].parent;
    }
    path.reverse();
    path
}

fn check_endpoints(start: GridPosition, end: GridPosition, bounds: GridBounds) -> SpatialResult<()> {
    for pos in [start, end] {
        if !bounds.contains(pos) {
            return Err(SpatialError::OutOfBounds(pos));
        }
    }
    Ok(())
}
