//! Task contracts: what an agent is about to do and where.

use serde::{Deserialize, Serialize};

use crate::Cell;

/// Kind of a task. Everything the host schedules that is not one of the fixed
/// movement, waiting or safety kinds is a `Work` task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Goto,
    GotoWander,
    GotoSafeTemperature,
    GotoMindControlled,
    Flee,
    FleeAndCower,
    FleeAndCowerShort,
    Wait,
    WaitMaintainPosture,
    WaitAsleep,
    WaitAsleepDormancy,
    WaitDowned,
    WaitSafeTemperature,
    WaitCombat,
    IdleWhileDespawned,
    Work(String),
}

impl TaskKind {
    /// Plain movement whose destination may be rewritten.
    pub fn is_move(&self) -> bool {
        matches!(self, TaskKind::Goto | TaskKind::GotoWander)
    }

    /// Idle, safety-seeking and non-discretionary kinds that task-start
    /// interception never vetoes.
    pub fn bypasses_interception(&self) -> bool {
        matches!(
            self,
            TaskKind::GotoSafeTemperature
                | TaskKind::Flee
                | TaskKind::FleeAndCower
                | TaskKind::FleeAndCowerShort
                | TaskKind::GotoMindControlled
                | TaskKind::Wait
                | TaskKind::IdleWhileDespawned
                | TaskKind::WaitMaintainPosture
                | TaskKind::WaitAsleep
                | TaskKind::WaitDowned
                | TaskKind::WaitAsleepDormancy
                | TaskKind::WaitSafeTemperature
                | TaskKind::WaitCombat
        )
    }

    /// Kinds the patrol leaves alone even inside a restricted zone.
    pub fn tolerated_in_restricted_zone(&self) -> bool {
        matches!(
            self,
            TaskKind::WaitDowned
                | TaskKind::WaitAsleep
                | TaskKind::WaitAsleepDormancy
                | TaskKind::Flee
                | TaskKind::FleeAndCower
                | TaskKind::GotoSafeTemperature
        )
    }
}

/// A unit of agent behaviour with up to three target cells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub kind: TaskKind,
    #[serde(default)]
    pub target_a: Option<Cell>,
    #[serde(default)]
    pub target_b: Option<Cell>,
    #[serde(default)]
    pub target_c: Option<Cell>,
}

impl Task {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            target_a: None,
            target_b: None,
            target_c: None,
        }
    }

    pub fn goto(destination: Cell) -> Self {
        Self::new(TaskKind::Goto).with_target(destination)
    }

    pub fn wander(destination: Cell) -> Self {
        Self::new(TaskKind::GotoWander).with_target(destination)
    }

    pub fn work(name: impl Into<String>) -> Self {
        Self::new(TaskKind::Work(name.into()))
    }

    pub fn wait() -> Self {
        Self::new(TaskKind::Wait)
    }

    /// Fill the next empty target slot; a fourth target is ignored.
    pub fn with_target(mut self, cell: Cell) -> Self {
        if self.target_a.is_none() {
            self.target_a = Some(cell);
        } else if self.target_b.is_none() {
            self.target_b = Some(cell);
        } else if self.target_c.is_none() {
            self.target_c = Some(cell);
        }
        self
    }

    pub fn targets(&self) -> impl Iterator<Item = Cell> + '_ {
        [self.target_a, self.target_b, self.target_c]
            .into_iter()
            .flatten()
    }

    pub fn destination(&self) -> Option<Cell> {
        self.target_a
    }

    /// Point a move task at `cell`, dropping any secondary targets.
    pub fn redirect_to(&mut self, cell: Cell) {
        self.target_a = Some(cell);
        self.target_b = None;
        self.target_c = None;
    }
}
