//! The enforcement engine and its three layers.
//!
//! - [`path_cost`]: soft penalty on restricted cells while a route is planned.
//! - [`interception`]: task-start veto, redirecting plain moves.
//! - [`patrol`]: periodic eviction of agents already inside a restricted zone.
//!
//! The engine is `!Sync`; all hooks must be called from the host's control thread.

pub mod interception;
pub mod path_cost;
pub mod patrol;

use contracts::{AgentId, Cell, EnforcementConfig, SpawnOrigin};

use crate::access::AccessPolicy;
use crate::cooldown::MessageCooldowns;
use crate::host::WorldView;
use crate::planning::{PlanningContext, PlanningScope};
use crate::rank::RankCatalog;
use crate::roster::RankRoster;
use crate::search;

pub use interception::TaskDecision;
pub use patrol::PatrolReport;

#[derive(Debug)]
pub struct ClearanceEngine {
    config: EnforcementConfig,
    policy: AccessPolicy,
    roster: RankRoster,
    planning: PlanningContext,
    cooldowns: MessageCooldowns,
}

impl ClearanceEngine {
    pub fn new(config: EnforcementConfig, catalog: RankCatalog) -> Self {
        let policy = AccessPolicy::from_config(catalog, &config);
        let cooldowns = MessageCooldowns::new(config.notice_cooldown_ticks);
        Self {
            config,
            policy,
            roster: RankRoster::new(),
            planning: PlanningContext::new(),
            cooldowns,
        }
    }

    pub fn config(&self) -> &EnforcementConfig {
        &self.config
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &RankCatalog {
        self.policy.catalog()
    }

    pub fn roster(&self) -> &RankRoster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut RankRoster {
        &mut self.roster
    }

    pub fn cooldowns(&self) -> &MessageCooldowns {
        &self.cooldowns
    }

    // --- Agent lifecycle ---

    /// Attach rank state to a controlled agent and, for fresh agents only, give
    /// it the entry rank. Other agents are ignored.
    pub fn on_agent_spawned<W: WorldView + ?Sized>(
        &mut self,
        world: &W,
        agent: &AgentId,
        origin: SpawnOrigin,
    ) {
        if !world.is_controlled_humanlike(agent) {
            return;
        }
        self.roster
            .assign_default(agent, origin, self.policy.catalog());
    }

    pub fn on_agent_removed(&mut self, agent: &AgentId) {
        self.roster.remove(agent);
    }

    // --- Shared decisions ---

    pub fn is_restricted<W: WorldView + ?Sized>(
        &self,
        world: &W,
        agent: &AgentId,
        cell: Cell,
    ) -> bool {
        self.policy
            .is_restricted(world, agent, cell, self.roster.state(agent))
    }

    pub fn find_nearest_safe_cell<W: WorldView + ?Sized>(
        &self,
        world: &W,
        agent: &AgentId,
    ) -> Option<Cell> {
        search::find_nearest_safe_cell(
            world,
            &self.policy,
            agent,
            self.roster.state(agent),
            self.config.safe_cell_search_radius,
        )
    }

    // --- Planning context ---

    /// Enter a planning scope for `agent`. Path-cost queries issued while the
    /// scope is alive are attributed to it.
    pub fn begin_planning(&self, agent: &AgentId) -> PlanningScope<'_> {
        self.planning.enter(agent)
    }

    pub fn planning(&self) -> &PlanningContext {
        &self.planning
    }
}

impl Default for ClearanceEngine {
    fn default() -> Self {
        Self::new(EnforcementConfig::default(), RankCatalog::default_catalog())
    }
}

#[cfg(test)]
mod tests {
    use contracts::Cell;

    use super::*;
    use crate::grid::GridWorld;

    #[test]
    fn only_controlled_agents_get_rank_state() {
        let mut world = GridWorld::new(3, 3);
        let colonist = AgentId::new("colonist");
        let visitor = AgentId::new("visitor");
        world.spawn(colonist.clone(), Cell::new(0, 0), true);
        world.spawn(visitor.clone(), Cell::new(1, 1), false);

        let mut engine = ClearanceEngine::default();
        engine.on_agent_spawned(&world, &colonist, SpawnOrigin::Fresh);
        engine.on_agent_spawned(&world, &visitor, SpawnOrigin::Fresh);

        assert_eq!(engine.roster().rank_label(&colonist, engine.catalog()), "Intern");
        assert!(engine.roster().state(&visitor).is_none());
    }

    #[test]
    fn removal_destroys_rank_state() {
        let mut world = GridWorld::new(3, 3);
        let colonist = AgentId::new("colonist");
        world.spawn(colonist.clone(), Cell::new(0, 0), true);
        let mut engine = ClearanceEngine::default();
        engine.on_agent_spawned(&world, &colonist, SpawnOrigin::Fresh);
        engine.on_agent_removed(&colonist);
        assert!(engine.roster().is_empty());
    }
}
