//! Layer 2: task-start interception.
//!
//! A task is intercepted when one of its targets is restricted while the
//! agent's own cell is not. Plain moves are redirected to the nearest safe
//! cell; every other kind is refused so the host scheduler picks something else.

use contracts::{AgentId, Cell, Notice, NoticeCategory, Task};
use serde::Serialize;
use tracing::{debug, warn};

use super::ClearanceEngine;
use crate::host::{NotificationSink, WorldView};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum TaskDecision {
    Allow,
    /// The move task's destination was rewritten to `to`.
    Redirected { blocked: Cell, to: Cell },
    /// Report "no task" upward.
    Vetoed { blocked: Cell },
}

impl TaskDecision {
    pub fn proceeds(&self) -> bool {
        !matches!(self, TaskDecision::Vetoed { .. })
    }
}

impl ClearanceEngine {
    /// Task-start hook. May rewrite `task` in place.
    pub fn on_task_start<W, N>(
        &mut self,
        world: &W,
        agent: &AgentId,
        task: &mut Task,
        now: u64,
        sink: &mut N,
    ) -> TaskDecision
    where
        W: WorldView + ?Sized,
        N: NotificationSink + ?Sized,
    {
        let Some(blocked) = self.blocked_target(world, agent, task) else {
            return TaskDecision::Allow;
        };

        if self.cooldowns.try_acquire(agent, now) {
            sink.notify(self.denial_notice(world, agent, blocked, now));
        }

        if task.kind.is_move() {
            match self.find_nearest_safe_cell(world, agent) {
                Some(safe) => {
                    debug!(
                        agent = %agent,
                        %blocked,
                        to = %safe,
                        "redirected move away from restricted zone"
                    );
                    task.redirect_to(safe);
                    return TaskDecision::Redirected { blocked, to: safe };
                }
                None => {
                    warn!(
                        agent = %agent,
                        radius = self.config.safe_cell_search_radius,
                        "no safe cell within search radius, refusing move"
                    );
                }
            }
        }

        debug!(
            agent = %agent,
            kind = ?task.kind,
            %blocked,
            "vetoed task targeting restricted zone"
        );
        TaskDecision::Vetoed { blocked }
    }

    /// Work-giver screen: `false` when starting `task` would be intercepted.
    /// Nothing is rewritten and no notice is sent.
    pub fn screen_assignment<W: WorldView + ?Sized>(
        &self,
        world: &W,
        agent: &AgentId,
        task: &Task,
    ) -> bool {
        self.blocked_target(world, agent, task).is_none()
    }

    /// First restricted target of `task`, provided the agent currently stands
    /// somewhere it is allowed to be.
    fn blocked_target<W: WorldView + ?Sized>(
        &self,
        world: &W,
        agent: &AgentId,
        task: &Task,
    ) -> Option<Cell> {
        if task.kind.bypasses_interception() || !world.is_controlled_humanlike(agent) {
            return None;
        }
        let current = world.position(agent)?;
        let mut targets = task.targets().peekable();
        targets.peek()?;
        // Already inside: the patrol handles it.
        if self.is_restricted(world, agent, current) {
            return None;
        }
        targets.find(|&target| self.is_restricted(world, agent, target))
    }

    fn denial_notice<W: WorldView + ?Sized>(
        &self,
        world: &W,
        agent: &AgentId,
        blocked: Cell,
        now: u64,
    ) -> Notice {
        let rank = self.roster.rank_label(agent, self.policy.catalog());
        let zone = world
            .zone_at(blocked)
            .map(|zone| zone.label.as_str())
            .unwrap_or("this zone");
        Notice {
            tick: now,
            category: NoticeCategory::RejectInput,
            agent_id: Some(agent.clone()),
            text: format!("{agent} ({rank}) is not cleared for {zone}, turning back"),
        }
    }
}

#[cfg(test)]
mod tests {
    use contracts::{SpawnOrigin, TaskKind, Zone};

    use super::*;
    use crate::grid::GridWorld;

    fn setup() -> (GridWorld, ClearanceEngine, AgentId) {
        let mut world = GridWorld::new(20, 10);
        world.add_zone(Zone::new("rw", "Research Wing"), Cell::new(10, 0), Cell::new(19, 9));
        let agent = AgentId::new("tech");
        world.spawn(agent.clone(), Cell::new(2, 2), true);
        let mut engine = ClearanceEngine::default();
        engine.on_agent_spawned(&world, &agent, SpawnOrigin::Fresh);
        let technician = engine.catalog().get("Technician").cloned().unwrap();
        engine.roster_mut().set_rank(&agent, &technician);
        (world, engine, agent)
    }

    #[test]
    fn move_into_restricted_zone_is_redirected() {
        let (world, mut engine, agent) = setup();
        let mut notices: Vec<Notice> = Vec::new();
        let mut task = Task::goto(Cell::new(15, 5));
        let decision = engine.on_task_start(&world, &agent, &mut task, 10, &mut notices);

        let TaskDecision::Redirected { blocked, to } = decision else {
            panic!("expected redirect, got {decision:?}");
        };
        assert_eq!(blocked, Cell::new(15, 5));
        assert_eq!(task.destination(), Some(to));
        assert!(!engine.is_restricted(&world, &agent, to));
        assert_eq!(notices.len(), 1);
        assert!(notices[0].text.contains("Research Wing"));
        assert!(notices[0].text.contains("Technician"));
    }

    #[test]
    fn work_into_restricted_zone_is_vetoed_unchanged() {
        let (world, mut engine, agent) = setup();
        let mut notices: Vec<Notice> = Vec::new();
        let mut task = Task::work("research").with_target(Cell::new(12, 1));
        let original = task.clone();
        let decision = engine.on_task_start(&world, &agent, &mut task, 10, &mut notices);
        assert_eq!(decision, TaskDecision::Vetoed { blocked: Cell::new(12, 1) });
        assert!(!decision.proceeds());
        assert_eq!(task, original);
    }

    #[test]
    fn any_restricted_target_triggers_interception() {
        let (world, mut engine, agent) = setup();
        let mut task = Task::work("haul")
            .with_target(Cell::new(1, 1))
            .with_target(Cell::new(3, 3))
            .with_target(Cell::new(11, 3));
        let decision =
            engine.on_task_start(&world, &agent, &mut task, 0, &mut Vec::<Notice>::new());
        assert_eq!(decision, TaskDecision::Vetoed { blocked: Cell::new(11, 3) });
    }

    #[test]
    fn bypass_kinds_are_never_intercepted() {
        let (world, mut engine, agent) = setup();
        for kind in [TaskKind::Flee, TaskKind::Wait, TaskKind::GotoMindControlled] {
            let mut task = Task::new(kind).with_target(Cell::new(15, 5));
            let decision =
                engine.on_task_start(&world, &agent, &mut task, 0, &mut Vec::<Notice>::new());
            assert_eq!(decision, TaskDecision::Allow);
            assert_eq!(task.destination(), Some(Cell::new(15, 5)));
        }
    }

    #[test]
    fn agent_already_inside_is_left_to_the_patrol() {
        let (mut world, mut engine, agent) = setup();
        world.place(&agent, Cell::new(12, 2));
        let mut task = Task::goto(Cell::new(15, 5));
        let decision =
            engine.on_task_start(&world, &agent, &mut task, 0, &mut Vec::<Notice>::new());
        assert_eq!(decision, TaskDecision::Allow);
    }

    #[test]
    fn tasks_without_targets_pass() {
        let (world, mut engine, agent) = setup();
        let mut task = Task::work("meditate");
        let decision =
            engine.on_task_start(&world, &agent, &mut task, 0, &mut Vec::<Notice>::new());
        assert_eq!(decision, TaskDecision::Allow);
    }

    #[test]
    fn notices_are_rate_limited() {
        let (world, mut engine, agent) = setup();
        let mut notices: Vec<Notice> = Vec::new();
        for tick in [0, 50, 100, 250] {
            let mut task = Task::work("research").with_target(Cell::new(12, 1));
            engine.on_task_start(&world, &agent, &mut task, tick, &mut notices);
        }
        assert_eq!(notices.len(), 1);
        let mut task = Task::work("research").with_target(Cell::new(12, 1));
        engine.on_task_start(&world, &agent, &mut task, 251, &mut notices);
        assert_eq!(notices.len(), 2);
    }

    #[test]
    fn exhausted_search_vetoes_move() {
        let mut world = GridWorld::new(4, 1);
        world.add_zone(Zone::new("p", "Production"), Cell::new(1, 0), Cell::new(3, 0));
        let agent = AgentId::new("intern");
        world.spawn(agent.clone(), Cell::new(0, 0), true);
        let mut engine = ClearanceEngine::default();
        engine.on_agent_spawned(&world, &agent, SpawnOrigin::Fresh);

        let mut task = Task::goto(Cell::new(3, 0));
        let decision =
            engine.on_task_start(&world, &agent, &mut task, 0, &mut Vec::<Notice>::new());
        assert_eq!(decision, TaskDecision::Vetoed { blocked: Cell::new(3, 0) });
        assert_eq!(task.destination(), Some(Cell::new(3, 0)));
    }

    #[test]
    fn screening_matches_interception_without_side_effects() {
        let (world, engine, agent) = setup();
        let inside = Task::work("x").with_target(Cell::new(12, 1));
        let outside = Task::work("x").with_target(Cell::new(2, 1));
        assert!(!engine.screen_assignment(&world, &agent, &inside));
        assert!(engine.screen_assignment(&world, &agent, &outside));
        assert!(engine.cooldowns().last_sent(&agent).is_none());
    }

    #[test]
    fn decisions_serialize_with_a_tag() {
        let decision = TaskDecision::Redirected {
            blocked: Cell::new(12, 1),
            to: Cell::new(2, 1),
        };
        let json = serde_json::to_value(&decision).expect("serialize");
        assert_eq!(json["decision"], "redirected");
        assert_eq!(json["to"]["x"], 2);
    }
}
