//! Layer 1: restricted cells cost more while a controlled agent is being routed.

use contracts::Cell;

use super::ClearanceEngine;
use crate::host::WorldView;

impl ClearanceEngine {
    /// Effective cost of `cell` for the route currently being planned.
    ///
    /// Impassable cells and queries outside any planning scope are returned
    /// untouched. The penalised cost stays below the impassable threshold so a
    /// route through a restricted zone is still found when nothing else exists.
    pub fn path_cost<W: WorldView + ?Sized>(&self, world: &W, cell: Cell, base_cost: u32) -> u32 {
        let impassable = self.config.impassable_cost;
        if base_cost >= impassable {
            return base_cost;
        }
        let restricted = self
            .planning
            .with_current(|agent| {
                world.is_controlled_humanlike(agent) && self.is_restricted(world, agent, cell)
            })
            .unwrap_or(false);
        if !restricted {
            return base_cost;
        }
        base_cost
            .saturating_add(self.config.restricted_path_penalty)
            .min(impassable.saturating_sub(1))
    }
}
