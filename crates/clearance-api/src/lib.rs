//! In-process facade driving the clearance engine against the reference grid
//! host, with JSON configuration and SQLite rank persistence.

mod config;
mod facility;
mod persistence;

use std::path::Path;

use clearance_core::{
    CeremonyStage, ClearanceEngine, GridWorld, PatrolReport, PromotionCeremony, PromotionError,
    TaskDecision, WorldView,
};
use contracts::{AgentId, Cell, Notice, NoticeCategory, SpawnOrigin, Task, TaskKind};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub use config::{ConfigError, SimulationConfig};
pub use facility::{facility_layout, FACILITY_HEIGHT, FACILITY_WIDTH, LOBBY};
pub use persistence::{PersistenceError, SqliteRankStore};

use facility::{cell_from_roll, deterministic_agent_seed};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),
    #[error("unknown rank: {0}")]
    UnknownRank(String),
    #[error(transparent)]
    Promotion(#[from] PromotionError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepReport {
    pub tick: u64,
    pub moved: usize,
    pub arrived: Vec<AgentId>,
    /// Agents whose travel task was dropped because no route exists.
    pub unreachable: Vec<AgentId>,
    pub promoted: Vec<AgentId>,
    pub patrol: Option<PatrolReport>,
}

/// Totals over a multi-tick run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub start_tick: u64,
    pub end_tick: u64,
    pub moves: usize,
    pub patrols: usize,
    pub evictions: usize,
    pub stranded: usize,
    pub promotions: usize,
}

#[derive(Debug)]
pub struct FacilityApi {
    engine: ClearanceEngine,
    world: GridWorld,
    tick: u64,
    notices: Vec<Notice>,
    ceremonies: Vec<PromotionCeremony>,
    store: Option<SqliteRankStore>,
    wander_seed: Option<u64>,
}

impl FacilityApi {
    pub fn new(engine: ClearanceEngine, world: GridWorld) -> Self {
        Self {
            engine,
            world,
            tick: 0,
            notices: Vec::new(),
            ceremonies: Vec::new(),
            store: None,
            wander_seed: None,
        }
    }

    pub fn from_config(config: &SimulationConfig, world: GridWorld) -> Result<Self, ConfigError> {
        let engine = ClearanceEngine::new(config.enforcement.clone(), config.catalog()?);
        Ok(Self::new(engine, world))
    }

    /// Default engine on the built-in facility map.
    pub fn with_default_facility() -> Self {
        Self::new(ClearanceEngine::default(), facility_layout())
    }

    pub fn engine(&self) -> &ClearanceEngine {
        &self.engine
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn ceremonies(&self) -> &[PromotionCeremony] {
        &self.ceremonies
    }

    /// Give idle controlled agents a random destination every tick.
    pub fn enable_wandering(&mut self, seed: u64) {
        self.wander_seed = Some(seed);
    }

    // --- Agents ---

    pub fn spawn_agent(
        &mut self,
        agent: AgentId,
        cell: Cell,
        controlled: bool,
        origin: SpawnOrigin,
    ) {
        self.world.spawn(agent.clone(), cell, controlled);
        self.engine.on_agent_spawned(&self.world, &agent, origin);
    }

    pub fn remove_agent(&mut self, agent: &AgentId) -> Result<(), ApiError> {
        self.world
            .remove(agent)
            .ok_or_else(|| ApiError::UnknownAgent(agent.clone()))?;
        self.engine.on_agent_removed(agent);
        self.ceremonies.retain(|ceremony| ceremony.candidate() != agent);
        Ok(())
    }

    /// Move an agent without going through task arbitration.
    pub fn teleport(&mut self, agent: &AgentId, cell: Cell) -> Result<(), ApiError> {
        self.require_agent(agent)?;
        self.world.place(agent, cell);
        Ok(())
    }

    pub fn position(&self, agent: &AgentId) -> Option<Cell> {
        self.world.position(agent)
    }

    pub fn current_task(&self, agent: &AgentId) -> Option<&Task> {
        self.world.current_task(agent)
    }

    // --- Ranks ---

    pub fn set_rank(&mut self, agent: &AgentId, rank_name: &str) -> Result<(), ApiError> {
        self.require_agent(agent)?;
        let rank = self
            .engine
            .catalog()
            .get(rank_name)
            .cloned()
            .ok_or_else(|| ApiError::UnknownRank(rank_name.to_string()))?;
        self.engine.roster_mut().set_rank(agent, &rank);
        Ok(())
    }

    pub fn clear_rank(&mut self, agent: &AgentId) -> Result<(), ApiError> {
        self.require_agent(agent)?;
        self.engine.roster_mut().clear_rank(agent);
        Ok(())
    }

    pub fn rank_label(&self, agent: &AgentId) -> &str {
        self.engine.roster().rank_label(agent, self.engine.catalog())
    }

    /// Schedule a promotion ceremony. An agent takes part in at most one
    /// ceremony at a time.
    pub fn begin_promotion(&mut self, agent: &AgentId) -> Result<&PromotionCeremony, ApiError> {
        self.require_agent(agent)?;
        if self.ceremonies.iter().any(|ceremony| ceremony.candidate() == agent) {
            self.notices.push(Notice {
                tick: self.tick,
                category: NoticeCategory::RejectInput,
                agent_id: Some(agent.clone()),
                text: format!("{agent} is already taking part in a promotion ceremony"),
            });
            return Err(PromotionError::CeremonyInProgress(agent.clone()).into());
        }
        let ceremony = PromotionCeremony::start(&self.engine, agent, self.tick)?;
        info!(
            agent = %agent,
            organizer = %ceremony.organizer(),
            rank = %ceremony.target_rank(),
            "promotion scheduled"
        );
        self.notices.push(Notice {
            tick: self.tick,
            category: NoticeCategory::NeutralEvent,
            agent_id: Some(agent.clone()),
            text: format!(
                "{} will organize a ceremony promoting {agent} to {}",
                ceremony.organizer(),
                ceremony.target_rank()
            ),
        });
        self.ceremonies.push(ceremony);
        Ok(&self.ceremonies[self.ceremonies.len() - 1])
    }

    // --- Tasks ---

    /// Start `task` through the task-start hook. A vetoed task leaves the
    /// agent idle.
    pub fn assign_task(
        &mut self,
        agent: &AgentId,
        mut task: Task,
    ) -> Result<TaskDecision, ApiError> {
        self.require_agent(agent)?;
        let decision = self
            .engine
            .on_task_start(&self.world, agent, &mut task, self.tick, &mut self.notices);
        let next = decision.proceeds().then_some(task);
        self.world.set_task(agent, next);
        Ok(decision)
    }

    /// Work-giver path: a task that would be intercepted is never offered.
    /// Returns whether the task was started.
    pub fn offer_task(&mut self, agent: &AgentId, task: Task) -> Result<bool, ApiError> {
        self.require_agent(agent)?;
        if !self.engine.screen_assignment(&self.world, agent, &task) {
            debug!(agent = %agent, kind = ?task.kind, "work giver skipped restricted task");
            return Ok(false);
        }
        Ok(self.assign_task(agent, task)?.proceeds())
    }

    // --- Simulation ---

    /// Advance one tick: idle agents pick up work, travelling agents take one
    /// step along a freshly planned route, ceremonies advance, then the patrol
    /// gets its turn.
    pub fn step(&mut self) -> StepReport {
        self.tick += 1;
        let now = self.tick;
        let mut report = StepReport {
            tick: now,
            ..StepReport::default()
        };

        if let Some(seed) = self.wander_seed {
            self.assign_idle_work(seed, now);
        }

        for agent in self.world.agent_ids() {
            self.advance_agent(&agent, &mut report);
        }

        for ceremony in &mut self.ceremonies {
            let stage = ceremony.advance(&mut self.engine, now, &mut self.notices);
            if stage == CeremonyStage::Completed {
                report.promoted.push(ceremony.candidate().clone());
            }
        }
        self.ceremonies
            .retain(|ceremony| ceremony.stage() != CeremonyStage::Completed);

        report.patrol = self.engine.on_tick(&mut self.world, now);
        let forced = self.world.take_issued_tasks();
        if !forced.is_empty() {
            debug!(tick = now, count = forced.len(), "patrol forced tasks");
        }
        report
    }

    pub fn run(&mut self, ticks: u64) -> RunSummary {
        let mut summary = RunSummary {
            start_tick: self.tick,
            end_tick: self.tick,
            ..RunSummary::default()
        };
        for _ in 0..ticks {
            let report = self.step();
            summary.end_tick = report.tick;
            summary.moves += report.moved;
            summary.promotions += report.promoted.len();
            if let Some(patrol) = report.patrol {
                summary.patrols += 1;
                summary.evictions += patrol.evicted.len();
                summary.stranded += patrol.stranded.len();
            }
        }
        summary
    }

    // --- Persistence ---

    pub fn attach_store(&mut self, store: SqliteRankStore) {
        self.store = Some(store);
    }

    pub fn attach_sqlite_store(&mut self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        self.attach_store(SqliteRankStore::open(path)?);
        Ok(())
    }

    pub fn save_ranks(&mut self) -> Result<(), PersistenceError> {
        let store = self.store.as_mut().ok_or(PersistenceError::NotAttached)?;
        store.save_roster(&self.engine.roster().snapshot(), self.tick)
    }

    /// Replace every agent's rank state with the stored one.
    pub fn load_ranks(&mut self) -> Result<usize, PersistenceError> {
        let store = self.store.as_ref().ok_or(PersistenceError::NotAttached)?;
        let snapshot = store.load_roster()?;
        let restored = snapshot.entries.len();
        self.engine.roster_mut().restore(snapshot);
        Ok(restored)
    }

    fn require_agent(&self, agent: &AgentId) -> Result<(), ApiError> {
        match self.world.body(agent) {
            Some(_) => Ok(()),
            None => Err(ApiError::UnknownAgent(agent.clone())),
        }
    }

    fn advance_agent(&mut self, agent: &AgentId, report: &mut StepReport) {
        let Some((from, destination)) = self.world.body(agent).and_then(|body| {
            let task = body.task.as_ref().filter(|task| travels(task))?;
            Some((body.position?, task.destination()?))
        }) else {
            return;
        };

        let path = {
            let _scope = self.engine.begin_planning(agent);
            self.world
                .route(from, destination, self.engine.config().impassable_cost, |cell, base| {
                    self.engine.path_cost(&self.world, cell, base)
                })
        };

        match path.as_deref() {
            Some([next, ..]) => {
                self.world.place(agent, *next);
                report.moved += 1;
                if *next == destination {
                    self.world.set_task(agent, None);
                    report.arrived.push(agent.clone());
                }
            }
            Some([]) => {
                self.world.set_task(agent, None);
                report.arrived.push(agent.clone());
            }
            None => {
                debug!(agent = %agent, from = %from, to = %destination, "no route, dropping task");
                self.world.set_task(agent, None);
                report.unreachable.push(agent.clone());
            }
        }
    }

    fn assign_idle_work(&mut self, seed: u64, now: u64) {
        for agent in self.world.controlled_agents() {
            let idle = self
                .world
                .body(&agent)
                .is_some_and(|body| body.position.is_some() && body.task.is_none());
            if !idle {
                continue;
            }
            let roll = deterministic_agent_seed(seed, agent.as_str(), now, 0);
            let target_roll = deterministic_agent_seed(seed, agent.as_str(), now, 1);
            let target = cell_from_roll(&self.world, target_roll);
            let started = if roll % 4 == 0 {
                self.offer_task(&agent, Task::work("haul").with_target(target))
            } else {
                self.assign_task(&agent, Task::wander(target))
                    .map(|decision| decision.proceeds())
            };
            if let Err(err) = started {
                debug!(agent = %agent, error = %err, "idle work assignment failed");
            }
        }
    }
}

/// Tasks that walk to their destination and finish there.
fn travels(task: &Task) -> bool {
    task.kind.is_move() || matches!(task.kind, TaskKind::Work(_))
}
