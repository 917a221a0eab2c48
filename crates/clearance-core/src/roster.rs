//! Per-agent rank state.

use std::collections::BTreeMap;

use contracts::{AgentId, AgentRankState, Rank, RosterSnapshot, SpawnOrigin, SCHEMA_VERSION_V1};
use tracing::debug;

use crate::rank::RankCatalog;

pub const NO_RANK_LABEL: &str = "no rank";

/// Rank state for every tracked agent, keyed by agent id.
#[derive(Debug, Clone, Default)]
pub struct RankRoster {
    states: BTreeMap<AgentId, AgentRankState>,
}

impl RankRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an empty state if none exists. Re-attaching is a no-op.
    pub fn ensure(&mut self, agent: &AgentId) -> &mut AgentRankState {
        self.states.entry(agent.clone()).or_default()
    }

    /// Give a freshly created agent the entry rank. Restored agents keep
    /// whatever was persisted, including no rank at all.
    ///
    /// Returns `true` when a rank was assigned.
    pub fn assign_default(
        &mut self,
        agent: &AgentId,
        origin: SpawnOrigin,
        catalog: &RankCatalog,
    ) -> bool {
        let state = self.ensure(agent);
        if origin != SpawnOrigin::Fresh || state.has_rank() {
            return false;
        }
        let entry = catalog.entry_rank();
        state.current_rank = Some(entry.name.clone());
        debug!(agent = %agent, rank = %entry.name, "assigned entry rank");
        true
    }

    pub fn set_rank(&mut self, agent: &AgentId, rank: &Rank) {
        self.ensure(agent).current_rank = Some(rank.name.clone());
    }

    pub fn clear_rank(&mut self, agent: &AgentId) {
        if let Some(state) = self.states.get_mut(agent) {
            state.current_rank = None;
        }
    }

    /// Drop the agent's state together with the agent.
    pub fn remove(&mut self, agent: &AgentId) -> Option<AgentRankState> {
        self.states.remove(agent)
    }

    pub fn state(&self, agent: &AgentId) -> Option<&AgentRankState> {
        self.states.get(agent)
    }

    /// Resolve the agent's rank. A missing state, an empty state and a name the
    /// catalog does not know all resolve to `None`.
    pub fn rank_of<'c>(&self, agent: &AgentId, catalog: &'c RankCatalog) -> Option<&'c Rank> {
        self.states
            .get(agent)
            .and_then(|state| state.current_rank.as_deref())
            .and_then(|name| catalog.get(name))
    }

    pub fn rank_label<'c>(&self, agent: &AgentId, catalog: &'c RankCatalog) -> &'c str {
        self.rank_of(agent, catalog)
            .map(|rank| rank.label.as_str())
            .unwrap_or(NO_RANK_LABEL)
    }

    /// Most senior ranked agent other than `exclude`. Equal seniority resolves to
    /// the first agent in id order; callers must not rely on that.
    pub fn most_senior(&self, catalog: &RankCatalog, exclude: &AgentId) -> Option<&AgentId> {
        let mut best: Option<(&AgentId, i32)> = None;
        for agent in self.states.keys().filter(|agent| *agent != exclude) {
            let Some(rank) = self.rank_of(agent, catalog) else {
                continue;
            };
            match best {
                Some((_, seniority)) if seniority >= rank.seniority => {}
                _ => best = Some((agent, rank.seniority)),
            }
        }
        best.map(|(agent, _)| agent)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AgentId, &AgentRankState)> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            entries: self.states.clone(),
        }
    }

    /// Replace every state with the persisted ones.
    pub fn restore(&mut self, snapshot: RosterSnapshot) {
        self.states = snapshot.entries;
    }
}
