//! Access decision function shared by every enforcement layer.

use contracts::{AgentId, AgentRankState, Cell, ClearanceLevel, EnforcementConfig, Rank};

use crate::host::WorldView;
use crate::rank::RankCatalog;
use crate::zone::ZoneClassifier;

/// Rank catalog plus zone classifier: everything needed to decide whether a
/// cell is off limits to a given rank state.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    catalog: RankCatalog,
    classifier: ZoneClassifier,
}

impl AccessPolicy {
    pub fn new(catalog: RankCatalog, classifier: ZoneClassifier) -> Self {
        Self {
            catalog,
            classifier,
        }
    }

    pub fn from_config(catalog: RankCatalog, config: &EnforcementConfig) -> Self {
        Self::new(catalog, ZoneClassifier::new(&config.zone_keywords))
    }

    pub fn catalog(&self) -> &RankCatalog {
        &self.catalog
    }

    pub fn classifier(&self) -> &ZoneClassifier {
        &self.classifier
    }

    /// Clearance required at `cell`; cells outside every zone are `Public`.
    pub fn required_clearance_at<W: WorldView + ?Sized>(
        &self,
        world: &W,
        cell: Cell,
    ) -> ClearanceLevel {
        world
            .zone_at(cell)
            .map(|zone| self.classifier.required_clearance(zone))
            .unwrap_or(ClearanceLevel::Public)
    }

    /// Resolve a rank state against the catalog. Unknown names are absent.
    pub fn resolve<'s>(&'s self, state: Option<&AgentRankState>) -> Option<&'s Rank> {
        state
            .and_then(|state| state.current_rank.as_deref())
            .and_then(|name| self.catalog.get(name))
    }

    /// Whether `agent` with `state` may not enter `cell`.
    ///
    /// Agents off the map are never restricted. A missing state or rank is
    /// denied everything but `Public`.
    pub fn is_restricted<W: WorldView + ?Sized>(
        &self,
        world: &W,
        agent: &AgentId,
        cell: Cell,
        state: Option<&AgentRankState>,
    ) -> bool {
        if world.position(agent).is_none() {
            return false;
        }
        let required = self.required_clearance_at(world, cell);
        if required.is_public() {
            return false;
        }
        match self.resolve(state) {
            Some(rank) => !rank.has_clearance(required),
            None => true,
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(RankCatalog::default_catalog(), ZoneClassifier::default())
    }
}

#[cfg(test)]
mod tests {
    use contracts::Zone;

    use super::*;
    use crate::grid::GridWorld;

    fn world() -> (GridWorld, AgentId) {
        let mut world = GridWorld::new(10, 10);
        world.add_zone(Zone::new("rw", "Research Wing"), Cell::new(5, 0), Cell::new(9, 9));
        world.add_zone(Zone::new("hall", "Hall"), Cell::new(0, 0), Cell::new(4, 9));
        let agent = AgentId::new("a");
        world.spawn(agent.clone(), Cell::new(1, 1), true);
        (world, agent)
    }

    #[test]
    fn missing_state_fails_closed_outside_public() {
        let (world, agent) = world();
        let policy = AccessPolicy::default();
        assert!(policy.is_restricted(&world, &agent, Cell::new(6, 6), None));
        assert!(!policy.is_restricted(&world, &agent, Cell::new(2, 2), None));
        let empty = AgentRankState::default();
        assert!(policy.is_restricted(&world, &agent, Cell::new(6, 6), Some(&empty)));
    }

    #[test]
    fn clearance_grants_matching_zone() {
        let (world, agent) = world();
        let policy = AccessPolicy::default();
        let researcher = AgentRankState::with_rank("Researcher");
        let tech = AgentRankState::with_rank("Technician");
        assert!(!policy.is_restricted(&world, &agent, Cell::new(6, 6), Some(&researcher)));
        assert!(policy.is_restricted(&world, &agent, Cell::new(6, 6), Some(&tech)));
    }

    #[test]
    fn unknown_rank_name_fails_closed() {
        let (world, agent) = world();
        let policy = AccessPolicy::default();
        let ghost = AgentRankState::with_rank("Founder");
        assert!(policy.is_restricted(&world, &agent, Cell::new(6, 6), Some(&ghost)));
    }

    #[test]
    fn agents_off_the_map_are_never_restricted() {
        let (mut world, agent) = world();
        world.despawn(&agent);
        let policy = AccessPolicy::default();
        assert!(!policy.is_restricted(&world, &agent, Cell::new(6, 6), None));
    }

    #[test]
    fn cells_outside_zones_are_public() {
        let mut world = GridWorld::new(4, 4);
        let agent = AgentId::new("a");
        world.spawn(agent.clone(), Cell::new(0, 0), true);
        let policy = AccessPolicy::default();
        assert!(!policy.is_restricted(&world, &agent, Cell::new(3, 3), None));
    }
}
