//! Reference host: a bounded grid with walls, terrain costs, rectangular zones,
//! and agents carrying a position and a current task.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use contracts::{AgentId, Cell, Task, Zone};

use crate::host::{TaskIssuer, WorldView};

/// Base cost reported for walls and cells outside the grid.
pub const WALL_COST: u32 = 10_000;
/// Cost of a single step, added to the destination cell's cost.
pub const STEP_COST: u32 = 10;

#[derive(Debug, Clone)]
struct ZoneArea {
    zone: Zone,
    min: Cell,
    max: Cell,
}

impl ZoneArea {
    fn contains(&self, cell: Cell) -> bool {
        (self.min.x..=self.max.x).contains(&cell.x) && (self.min.y..=self.max.y).contains(&cell.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentBody {
    /// `None` once despawned.
    pub position: Option<Cell>,
    pub controlled: bool,
    pub task: Option<Task>,
}

#[derive(Debug, Clone)]
pub struct GridWorld {
    width: i32,
    height: i32,
    walls: BTreeSet<Cell>,
    terrain_cost: BTreeMap<Cell, u32>,
    zones: Vec<ZoneArea>,
    agents: BTreeMap<AgentId, AgentBody>,
    issued: Vec<(AgentId, Task)>,
}

impl GridWorld {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            walls: BTreeSet::new(),
            terrain_cost: BTreeMap::new(),
            zones: Vec::new(),
            agents: BTreeMap::new(),
            issued: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.width).contains(&cell.x) && (0..self.height).contains(&cell.y)
    }

    // --- Terrain ---

    pub fn set_wall(&mut self, cell: Cell) {
        self.walls.insert(cell);
    }

    pub fn set_terrain_cost(&mut self, cell: Cell, cost: u32) {
        self.terrain_cost.insert(cell, cost);
    }

    /// Terrain cost of entering `cell` before any enforcement.
    pub fn base_cost(&self, cell: Cell) -> u32 {
        if !self.in_bounds(cell) || self.walls.contains(&cell) {
            return WALL_COST;
        }
        self.terrain_cost.get(&cell).copied().unwrap_or(0)
    }

    // --- Zones ---

    /// Register a zone covering the inclusive rectangle `min..=max`. Earlier
    /// zones win where rectangles overlap.
    pub fn add_zone(&mut self, zone: Zone, min: Cell, max: Cell) {
        self.zones.push(ZoneArea { zone, min, max });
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter().map(|area| &area.zone)
    }

    // --- Agents ---

    pub fn spawn(&mut self, agent: AgentId, cell: Cell, controlled: bool) {
        self.agents.insert(
            agent,
            AgentBody {
                position: Some(cell),
                controlled,
                task: None,
            },
        );
    }

    pub fn despawn(&mut self, agent: &AgentId) {
        if let Some(body) = self.agents.get_mut(agent) {
            body.position = None;
            body.task = None;
        }
    }

    pub fn remove(&mut self, agent: &AgentId) -> Option<AgentBody> {
        self.agents.remove(agent)
    }

    pub fn body(&self, agent: &AgentId) -> Option<&AgentBody> {
        self.agents.get(agent)
    }

    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.keys().cloned().collect()
    }

    /// Teleport, bypassing every hook.
    pub fn place(&mut self, agent: &AgentId, cell: Cell) {
        if let Some(body) = self.agents.get_mut(agent) {
            body.position = Some(cell);
        }
    }

    pub fn set_task(&mut self, agent: &AgentId, task: Option<Task>) {
        if let Some(body) = self.agents.get_mut(agent) {
            body.task = task;
        }
    }

    /// Tasks forced through [`TaskIssuer`], oldest first.
    pub fn issued_tasks(&self) -> &[(AgentId, Task)] {
        &self.issued
    }

    /// Drain the forced-task log.
    pub fn take_issued_tasks(&mut self) -> Vec<(AgentId, Task)> {
        std::mem::take(&mut self.issued)
    }

    // --- Routing ---

    /// Cheapest 4-neighbour path from `from` to `to`, excluding `from`.
    ///
    /// `cost` receives each candidate cell with its base cost and returns the
    /// effective cost; anything at or above `impassable` is never entered.
    pub fn route(
        &self,
        from: Cell,
        to: Cell,
        impassable: u32,
        cost: impl Fn(Cell, u32) -> u32,
    ) -> Option<Vec<Cell>> {
        if from == to {
            return Some(Vec::new());
        }
        let mut dist: BTreeMap<Cell, u64> = BTreeMap::new();
        let mut prev: BTreeMap<Cell, Cell> = BTreeMap::new();
        let mut frontier = BinaryHeap::new();
        dist.insert(from, 0);
        frontier.push(Reverse((0_u64, from)));

        while let Some(Reverse((spent, cell))) = frontier.pop() {
            if cell == to {
                break;
            }
            if dist.get(&cell).is_some_and(|&best| spent > best) {
                continue;
            }
            for next in cell.neighbours() {
                let base = self.base_cost(next);
                if base >= impassable {
                    continue;
                }
                let effective = cost(next, base);
                if effective >= impassable {
                    continue;
                }
                let total = spent + u64::from(STEP_COST) + u64::from(effective);
                if dist.get(&next).map_or(true, |&best| total < best) {
                    dist.insert(next, total);
                    prev.insert(next, cell);
                    frontier.push(Reverse((total, next)));
                }
            }
        }

        if !prev.contains_key(&to) {
            return None;
        }
        let mut path = vec![to];
        let mut cursor = to;
        while let Some(&step) = prev.get(&cursor) {
            if step == from {
                break;
            }
            path.push(step);
            cursor = step;
        }
        path.reverse();
        Some(path)
    }
}

impl WorldView for GridWorld {
    fn is_controlled_humanlike(&self, agent: &AgentId) -> bool {
        self.agents.get(agent).is_some_and(|body| body.controlled)
    }

    fn position(&self, agent: &AgentId) -> Option<Cell> {
        self.agents.get(agent).and_then(|body| body.position)
    }

    fn is_walkable(&self, _agent: &AgentId, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.walls.contains(&cell)
    }

    fn zone_at(&self, cell: Cell) -> Option<&Zone> {
        self.zones
            .iter()
            .find(|area| area.contains(cell))
            .map(|area| &area.zone)
    }

    fn controlled_agents(&self) -> Vec<AgentId> {
        self.agents
            .iter()
            .filter(|(_, body)| body.controlled)
            .map(|(agent, _)| agent.clone())
            .collect()
    }

    fn current_task(&self, agent: &AgentId) -> Option<&Task> {
        self.agents.get(agent).and_then(|body| body.task.as_ref())
    }
}

impl TaskIssuer for GridWorld {
    fn issue_task(&mut self, agent: &AgentId, task: Task) {
        self.set_task(agent, Some(task.clone()));
        self.issued.push((agent.clone(), task));
    }
}
