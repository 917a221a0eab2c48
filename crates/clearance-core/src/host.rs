//! Adapter traits the host simulation implements for the engine.

use contracts::{AgentId, Cell, Notice, Task, Zone};

/// Read-only world queries.
pub trait WorldView {
    /// Humanlike agent of the controlling faction. Only these are subject to
    /// enforcement.
    fn is_controlled_humanlike(&self, agent: &AgentId) -> bool;

    /// Current cell, or `None` when the agent is not on a live map.
    fn position(&self, agent: &AgentId) -> Option<Cell>;

    fn is_walkable(&self, agent: &AgentId, cell: Cell) -> bool;

    /// First zone containing `cell`. The order must be stable across calls.
    fn zone_at(&self, cell: Cell) -> Option<&Zone>;

    /// Controlled agents in a stable order.
    fn controlled_agents(&self) -> Vec<AgentId>;

    fn current_task(&self, agent: &AgentId) -> Option<&Task>;
}

/// Forced task assignment, preempting whatever the agent is doing.
pub trait TaskIssuer {
    fn issue_task(&mut self, agent: &AgentId, task: Task);
}

pub trait NotificationSink {
    fn notify(&mut self, notice: Notice);
}

impl NotificationSink for Vec<Notice> {
    fn notify(&mut self, notice: Notice) {
        self.push(notice);
    }
}
