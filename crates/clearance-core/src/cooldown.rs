//! Per-agent rate limiting for user-facing notices.

use std::collections::BTreeMap;

use contracts::AgentId;

#[derive(Debug, Clone)]
pub struct MessageCooldowns {
    window_ticks: u64,
    last_sent: BTreeMap<AgentId, u64>,
}

impl MessageCooldowns {
    pub fn new(window_ticks: u64) -> Self {
        Self {
            window_ticks,
            last_sent: BTreeMap::new(),
        }
    }

    /// Record a send at `now` if the agent's window has elapsed. Returns whether
    /// the caller may emit.
    pub fn try_acquire(&mut self, agent: &AgentId, now: u64) -> bool {
        match self.last_sent.get_mut(agent) {
            Some(last) if now.saturating_sub(*last) <= self.window_ticks => false,
            Some(last) => {
                *last = now;
                true
            }
            None => {
                self.last_sent.insert(agent.clone(), now);
                true
            }
        }
    }

    pub fn last_sent(&self, agent: &AgentId) -> Option<u64> {
        self.last_sent.get(agent).copied()
    }
}
