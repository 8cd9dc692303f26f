//! Fleet storage and fluent construction.
//!
//! # Usage
//!
//! ```rust
//! use wh_agent::FleetBuilder;
//! use wh_core::{GridPosition, WarehouseLayout};
//!
//! let layout = WarehouseLayout::new(10, 10, 32);
//! let fleet = FleetBuilder::new(4)
//!     .starting_positions([GridPosition::new(0, 0), GridPosition::new(0, 2)])
//!     .build(&layout)
//!     .unwrap();
//!
//! assert_eq!(fleet.len(), 4);
//! // Positions are cycled when there are fewer than robots.
//! assert_eq!(fleet.agents()[2].position(), GridPosition::new(0, 0));
//! ```

use wh_core::{GridPosition, RobotId, WarehouseLayout};

use crate::{AgentError, AgentResult, RobotAgent, RobotTelemetry};

/// All robots of one run, indexed by `RobotId`.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    agents: Vec<RobotAgent>,
}

impl Fleet {
    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[RobotAgent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [RobotAgent] {
        &mut self.agents
    }

    pub fn get(&self, id: RobotId) -> Option<&RobotAgent> {
        self.agents.get(id.index())
    }

    pub fn get_mut(&mut self, id: RobotId) -> Option<&mut RobotAgent> {
        self.agents.get_mut(id.index())
    }

    pub fn telemetry(&self) -> Vec<RobotTelemetry> {
        self.agents.iter().map(RobotAgent::telemetry).collect()
    }
}

/// Fluent builder for [`Fleet`].
pub struct FleetBuilder {
    count:     usize,
    positions: Vec<GridPosition>,
}

impl FleetBuilder {
    pub fn new(count: usize) -> Self {
        Self { count, positions: Vec::new() }
    }

    /// Explicit starting cells, cycled when shorter than the fleet.
    pub fn starting_positions(mut self, positions: impl IntoIterator<Item = GridPosition>) -> Self {
        self.positions = positions.into_iter().collect();
        self
    }

    /// Place every robot and check the cells against `layout`.
    ///
    /// Without explicit positions robot `i` starts at `(i % 3, i)`.
    pub fn build(self, layout: &WarehouseLayout) -> AgentResult<Fleet> {
        let positions = if self.positions.is_empty() {
            (0..self.count as u32).map(|i| GridPosition::new(i % 3, i)).collect()
        } else {
            self.positions
        };

        let mut agents = Vec::with_capacity(self.count);
        for i in 0..self.count {
            let start = positions[i % positions.len()];
            layout.check_bounds(start)?;
            if layout.is_obstacle(start) {
                return Err(AgentError::StartBlocked(start));
            }
            agents.push(RobotAgent::new(RobotId(i as u32), start));
        }
        Ok(Fleet { agents })
    }
}
