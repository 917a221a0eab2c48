use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clearance_api::{
    facility_layout, ApiError, ConfigError, FacilityApi, PersistenceError, SimulationConfig,
    SqliteRankStore, LOBBY,
};
use contracts::{AgentId, Cell, SpawnOrigin, Task};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clearance-cli")]
#[command(about = "Drive the rank-based zone clearance engine on the built-in facility")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scripted access scenarios and print what the engine decided.
    Demo,
    /// Run a wandering crowd for a number of ticks.
    Simulate {
        #[arg(long, default_value_t = 720)]
        ticks: u64,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Agents to spawn; ranks are dealt round-robin from the catalog.
        #[arg(long, default_value_t = 8)]
        agents: usize,
        /// JSON simulation config; defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// SQLite file receiving the final rank roster.
        #[arg(long, env = "CLEARANCE_SQLITE_PATH")]
        store: Option<PathBuf>,
        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Inspect or edit stored rank assignments.
    Rank {
        #[command(subcommand)]
        action: RankAction,
    },
}

#[derive(Subcommand, Debug)]
enum RankAction {
    /// List stored assignments, or a single agent's.
    Show {
        #[arg(long, env = "CLEARANCE_SQLITE_PATH")]
        store: PathBuf,
        #[arg(long)]
        agent: Option<String>,
    },
    /// Assign a rank by name. The name is checked against the catalog.
    Set {
        #[arg(long, env = "CLEARANCE_SQLITE_PATH")]
        store: PathBuf,
        #[arg(long)]
        agent: String,
        #[arg(long)]
        rank: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("unknown rank: {0}")]
    UnknownRank(String),
    #[error("failed to encode summary: {0}")]
    Encode(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Demo => run_demo(),
        Command::Simulate {
            ticks,
            seed,
            agents,
            config,
            store,
            json,
        } => run_simulation(ticks, seed, agents, config.as_deref(), store.as_deref(), json),
        Command::Rank { action } => run_rank(action),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig, ConfigError> {
    match path {
        Some(path) => SimulationConfig::load(path),
        None => Ok(SimulationConfig::default()),
    }
}

fn run_demo() -> Result<(), CliError> {
    println!("== intern heading for the research wing ==");
    let mut api = FacilityApi::with_default_facility();
    let intern = AgentId::new("intern");
    api.spawn_agent(intern.clone(), LOBBY, true, SpawnOrigin::Fresh);
    let decision = api.assign_task(&intern, Task::goto(Cell::new(20, 10)))?;
    println!("decision: {decision:?}");
    for notice in api.take_notices() {
        println!("notice: {notice}");
    }
    api.run(5);
    println!("intern now at {}", describe_position(&api, &intern));

    println!("== director visiting the command center ==");
    let mut api = FacilityApi::with_default_facility();
    let director = AgentId::new("director");
    api.spawn_agent(director.clone(), LOBBY, true, SpawnOrigin::Restored);
    api.set_rank(&director, "Director")?;
    let decision = api.assign_task(&director, Task::goto(Cell::new(26, 10)))?;
    println!("decision: {decision:?}");
    let summary = api.run(60);
    println!(
        "director now at {} after {} moves",
        describe_position(&api, &director),
        summary.moves
    );

    println!("== unranked agent dropped onto the production floor ==");
    let mut api = FacilityApi::with_default_facility();
    let stray = AgentId::new("stray");
    api.spawn_agent(stray.clone(), Cell::new(12, 10), true, SpawnOrigin::Restored);
    println!("rank: {}", api.rank_label(&stray));
    let summary = api.run(api.engine().config().patrol_interval_ticks);
    println!("patrols: {}, evictions: {}", summary.patrols, summary.evictions);
    if let Some(task) = api.current_task(&stray) {
        println!("stray ordered to {:?}", task.destination());
    }
    api.run(40);
    println!("stray now at {}", describe_position(&api, &stray));
    Ok(())
}

fn describe_position(api: &FacilityApi, agent: &AgentId) -> String {
    api.position(agent)
        .map_or_else(|| "nowhere".to_string(), |cell| cell.to_string())
}

fn run_simulation(
    ticks: u64,
    seed: u64,
    agents: usize,
    config_path: Option<&Path>,
    store_path: Option<&Path>,
    json: bool,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let mut api = FacilityApi::from_config(&config, facility_layout())?;

    let rank_names: Vec<String> = config.ranks.iter().map(|rank| rank.name.clone()).collect();
    for index in 0..agents {
        let agent = AgentId::new(format!("agent-{index:03}"));
        let offset = i32::try_from(index % 8).unwrap_or(0);
        api.spawn_agent(agent.clone(), LOBBY.offset(0, offset - 4), true, SpawnOrigin::Fresh);
        if let Some(rank) = rank_names.get(index % rank_names.len().max(1)) {
            api.set_rank(&agent, rank)?;
        }
    }
    api.enable_wandering(seed);

    info!(ticks, seed, agents, "simulation started");
    let summary = api.run(ticks);
    let notices = api.take_notices();

    if let Some(path) = store_path {
        api.attach_sqlite_store(path)?;
        api.save_ranks()?;
        info!(store = %path.display(), "rank roster saved");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "ticks {}..{} moves={} patrols={} evictions={} stranded={} notices={}",
            summary.start_tick,
            summary.end_tick,
            summary.moves,
            summary.patrols,
            summary.evictions,
            summary.stranded,
            notices.len()
        );
    }
    Ok(())
}

fn run_rank(action: RankAction) -> Result<(), CliError> {
    match action {
        RankAction::Show { store, agent } => {
            let store = SqliteRankStore::open(store)?;
            match agent {
                Some(agent) => {
                    let state = store.rank_of(&AgentId::new(agent.as_str()))?;
                    let label = match state {
                        Some(state) => state.current_rank.unwrap_or_else(|| "no rank".to_string()),
                        None => "not stored".to_string(),
                    };
                    println!("{agent}: {label}");
                }
                None => {
                    for (agent, state) in store.load_roster()?.entries {
                        println!("{agent}: {}", state.current_rank.as_deref().unwrap_or("no rank"));
                    }
                }
            }
        }
        RankAction::Set {
            store,
            agent,
            rank,
            config,
        } => {
            let catalog = load_config(config.as_deref())?.catalog()?;
            if catalog.get(&rank).is_none() {
                return Err(CliError::UnknownRank(rank));
            }
            let mut store = SqliteRankStore::open(store)?;
            store.set_rank(&AgentId::new(agent.as_str()), Some(&rank), 0)?;
            info!(agent = %agent, rank = %rank, "rank stored");
        }
    }
    Ok(())
}
