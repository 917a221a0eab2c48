//! Promotion ceremony: a staged scheduler that raises an agent one rank.
//!
//! Gathering (2500 ticks) → Ceremony (2500 ticks) → Completed. The rank
//! changes only on completion.

use contracts::{AgentId, Notice, NoticeCategory};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::enforcement::ClearanceEngine;
use crate::host::NotificationSink;

pub const GATHERING_TICKS: u64 = 2_500;
pub const CEREMONY_TICKS: u64 = 2_500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromotionError {
    #[error("{0} has no rank to promote from")]
    NoRank(AgentId),
    #[error("{0} already holds the highest rank")]
    AtTopRank(AgentId),
    #[error("{0} already has a promotion ceremony in progress")]
    CeremonyInProgress(AgentId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CeremonyStage {
    Gathering,
    Ceremony,
    Completed,
}

#[derive(Debug, Clone)]
pub struct PromotionCeremony {
    candidate: AgentId,
    organizer: AgentId,
    target_rank: String,
    started_tick: u64,
    stage: CeremonyStage,
}

impl PromotionCeremony {
    /// Schedule a promotion to the next rank up. The most senior other agent
    /// organizes; without one the candidate organizes its own ceremony.
    pub fn start(
        engine: &ClearanceEngine,
        candidate: &AgentId,
        now: u64,
    ) -> Result<Self, PromotionError> {
        let catalog = engine.catalog();
        let roster = engine.roster();
        let current = roster
            .rank_of(candidate, catalog)
            .ok_or_else(|| PromotionError::NoRank(candidate.clone()))?;
        let next = catalog
            .next_rank(current)
            .ok_or_else(|| PromotionError::AtTopRank(candidate.clone()))?;
        let organizer = roster
            .most_senior(catalog, candidate)
            .cloned()
            .unwrap_or_else(|| candidate.clone());
        Ok(Self {
            candidate: candidate.clone(),
            organizer,
            target_rank: next.name.clone(),
            started_tick: now,
            stage: CeremonyStage::Gathering,
        })
    }

    pub fn candidate(&self) -> &AgentId {
        &self.candidate
    }

    pub fn organizer(&self) -> &AgentId {
        &self.organizer
    }

    pub fn target_rank(&self) -> &str {
        &self.target_rank
    }

    pub fn stage(&self) -> CeremonyStage {
        self.stage
    }

    /// Move through every stage whose time has come.
    pub fn advance<N: NotificationSink + ?Sized>(
        &mut self,
        engine: &mut ClearanceEngine,
        now: u64,
        sink: &mut N,
    ) -> CeremonyStage {
        let elapsed = now.saturating_sub(self.started_tick);
        if self.stage == CeremonyStage::Gathering && elapsed >= GATHERING_TICKS {
            self.stage = CeremonyStage::Ceremony;
            sink.notify(Notice {
                tick: now,
                category: NoticeCategory::NeutralEvent,
                agent_id: Some(self.candidate.clone()),
                text: format!("promotion ceremony for {} begins", self.candidate),
            });
        }
        if self.stage == CeremonyStage::Ceremony && elapsed >= GATHERING_TICKS + CEREMONY_TICKS {
            self.stage = CeremonyStage::Completed;
            self.complete(engine, now, sink);
        }
        self.stage
    }

    fn complete<N: NotificationSink + ?Sized>(
        &self,
        engine: &mut ClearanceEngine,
        now: u64,
        sink: &mut N,
    ) {
        let Some(rank) = engine.catalog().get(&self.target_rank).cloned() else {
            return;
        };
        engine.roster_mut().set_rank(&self.candidate, &rank);
        info!(
            agent = %self.candidate,
            rank = %rank.name,
            organizer = %self.organizer,
            "promotion completed"
        );
        sink.notify(Notice {
            tick: now,
            category: NoticeCategory::PositiveEvent,
            agent_id: Some(self.candidate.clone()),
            text: format!("{} has been promoted to {}", self.candidate, rank.label),
        });
    }
}

#[cfg(test)]
mod tests {
    use contracts::{Cell, SpawnOrigin};

    use super::*;
    use crate::grid::GridWorld;

    fn engine_with(ranks: &[(&str, &str)]) -> ClearanceEngine {
        let mut world = GridWorld::new(4, 4);
        let mut engine = ClearanceEngine::default();
        for (agent, rank) in ranks {
            let agent = AgentId::new(*agent);
            world.spawn(agent.clone(), Cell::new(0, 0), true);
            engine.on_agent_spawned(&world, &agent, SpawnOrigin::Fresh);
            let rank = engine.catalog().get(rank).cloned().unwrap();
            engine.roster_mut().set_rank(&agent, &rank);
        }
        engine
    }

    #[test]
    fn ceremony_promotes_after_both_stages() {
        let mut engine = engine_with(&[("intern", "Intern"), ("boss", "Director")]);
        let candidate = AgentId::new("intern");
        let mut ceremony = PromotionCeremony::start(&engine, &candidate, 100).unwrap();
        assert_eq!(ceremony.organizer(), &AgentId::new("boss"));
        assert_eq!(ceremony.target_rank(), "Technician");

        let mut notices: Vec<Notice> = Vec::new();
        assert_eq!(ceremony.advance(&mut engine, 2_599, &mut notices), CeremonyStage::Gathering);
        assert_eq!(ceremony.advance(&mut engine, 2_600, &mut notices), CeremonyStage::Ceremony);
        assert_eq!(engine.roster().rank_label(&candidate, engine.catalog()), "Intern");
        assert_eq!(ceremony.advance(&mut engine, 5_100, &mut notices), CeremonyStage::Completed);
        assert_eq!(engine.roster().rank_label(&candidate, engine.catalog()), "Technician");
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].category, NoticeCategory::PositiveEvent);
    }

    #[test]
    fn late_advance_runs_every_stage() {
        let mut engine = engine_with(&[("a", "Researcher")]);
        let candidate = AgentId::new("a");
        let mut ceremony = PromotionCeremony::start(&engine, &candidate, 0).unwrap();
        assert_eq!(ceremony.organizer(), &candidate);
        let mut notices: Vec<Notice> = Vec::new();
        assert_eq!(ceremony.advance(&mut engine, 10_000, &mut notices), CeremonyStage::Completed);
        assert_eq!(engine.roster().rank_label(&candidate, engine.catalog()), "Manager");
    }

    #[test]
    fn top_rank_cannot_be_promoted() {
        let engine = engine_with(&[("boss", "Director")]);
        let err = PromotionCeremony::start(&engine, &AgentId::new("boss"), 0).unwrap_err();
        assert_eq!(err, PromotionError::AtTopRank(AgentId::new("boss")));
    }

    #[test]
    fn unranked_agent_cannot_be_promoted() {
        let engine = ClearanceEngine::default();
        let err = PromotionCeremony::start(&engine, &AgentId::new("ghost"), 0).unwrap_err();
        assert_eq!(err, PromotionError::NoRank(AgentId::new("ghost")));
    }
}
