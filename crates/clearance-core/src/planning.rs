//! Planning context: which agent the pathfinder is currently routing for.
//!
//! The host's per-cell cost query does not receive the agent, so the route
//! entry point pushes it here and the cost query peeks. A [`PlanningScope`]
//! pops on drop, so the stack stays balanced on early returns and unwinds.
//! `RefCell` keeps the context confined to one thread.

use std::cell::RefCell;

use contracts::AgentId;

#[derive(Debug, Default)]
pub struct PlanningContext {
    stack: RefCell<Vec<AgentId>>,
}

impl PlanningContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `agent` for the lifetime of the returned scope.
    pub fn enter(&self, agent: &AgentId) -> PlanningScope<'_> {
        self.stack.borrow_mut().push(agent.clone());
        PlanningScope { context: self }
    }

    /// Agent of the innermost active plan.
    pub fn current(&self) -> Option<AgentId> {
        self.stack.borrow().last().cloned()
    }

    /// Run `f` with the innermost agent without cloning it.
    pub fn with_current<R>(&self, f: impl FnOnce(&AgentId) -> R) -> Option<R> {
        self.stack.borrow().last().map(f)
    }

    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }
}

/// Guard returned by [`PlanningContext::enter`].
#[derive(Debug)]
pub struct PlanningScope<'a> {
    context: &'a PlanningContext,
}

impl Drop for PlanningScope<'_> {
    fn drop(&mut self) {
        self.context.stack.borrow_mut().pop();
    }
}
