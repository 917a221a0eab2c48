//! Layer 3: periodic safety net.
//!
//! Catches agents standing in a restricted cell however they got there
//! (forced placement, restored saves, tasks injected past the start hook) and
//! sends them to the nearest safe cell.

use contracts::{AgentId, Cell, Task};
use serde::Serialize;
use tracing::{info, warn};

use super::ClearanceEngine;
use crate::host::{TaskIssuer, WorldView};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatrolReport {
    pub tick: u64,
    /// Controlled agents with a position.
    pub inspected: usize,
    /// Of those, agents standing in a restricted cell.
    pub violators: usize,
    /// Agents sent to the given exit cell.
    pub evicted: Vec<(AgentId, Cell)>,
    /// Violators with no safe cell within the search radius.
    pub stranded: Vec<AgentId>,
}

impl ClearanceEngine {
    pub fn is_patrol_tick(&self, now: u64) -> bool {
        now % self.config.patrol_interval_ticks.max(1) == 0
    }

    /// Tick hook. Runs the patrol on interval boundaries, after the host has
    /// finished all task and path work for the tick.
    pub fn on_tick<W>(&self, world: &mut W, now: u64) -> Option<PatrolReport>
    where
        W: WorldView + TaskIssuer + ?Sized,
    {
        self.is_patrol_tick(now).then(|| self.patrol(world, now))
    }

    /// Evaluate every controlled agent once.
    pub fn patrol<W>(&self, world: &mut W, now: u64) -> PatrolReport
    where
        W: WorldView + TaskIssuer + ?Sized,
    {
        let mut report = PatrolReport {
            tick: now,
            ..PatrolReport::default()
        };
        for agent in world.controlled_agents() {
            let Some(cell) = world.position(&agent) else {
                continue;
            };
            report.inspected += 1;
            if !self.is_restricted(world, &agent, cell) {
                continue;
            }
            report.violators += 1;
            if self.is_leaving_on_its_own(world, &agent) {
                continue;
            }
            match self.find_nearest_safe_cell(world, &agent) {
                Some(exit) => {
                    info!(
                        agent = %agent,
                        from = %cell,
                        to = %exit,
                        "evicting agent from restricted zone"
                    );
                    world.issue_task(&agent, Task::goto(exit));
                    report.evicted.push((agent, exit));
                }
                None => {
                    warn!(
                        agent = %agent,
                        at = %cell,
                        "agent enclosed by restricted zone, retrying next patrol"
                    );
                    report.stranded.push(agent);
                }
            }
        }
        report
    }

    /// Tolerated tasks, or a move already headed somewhere unrestricted.
    fn is_leaving_on_its_own<W: WorldView + ?Sized>(&self, world: &W, agent: &AgentId) -> bool {
        match world.current_task(agent) {
            Some(task) if task.kind.tolerated_in_restricted_zone() => true,
            Some(task) if task.kind.is_move() => task
                .destination()
                .is_some_and(|destination| !self.is_restricted(world, agent, destination)),
            _ => false,
        }
    }
}
