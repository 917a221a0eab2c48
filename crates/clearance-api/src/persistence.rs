use std::path::Path;

use contracts::{AgentId, AgentRankState, RosterSnapshot, SCHEMA_VERSION_V1};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("sqlite store is not attached")]
    NotAttached,
}

/// Rank assignments keyed by agent, plus periodic whole-roster snapshots.
#[derive(Debug)]
pub struct SqliteRankStore {
    conn: Connection,
}

impl SqliteRankStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        let mut store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    /// Replace the stored assignments with `snapshot` and keep a copy of it
    /// under `tick`.
    pub fn save_roster(
        &mut self,
        snapshot: &RosterSnapshot,
        tick: u64,
    ) -> Result<(), PersistenceError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM agent_ranks", [])?;
        for (agent, state) in &snapshot.entries {
            tx.execute(
                "INSERT INTO agent_ranks (agent_id, rank_name, updated_at) VALUES (?1, ?2, ?3)",
                params![agent.as_str(), state.current_rank, tick_stamp(tick)],
            )?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO roster_snapshots
                 (tick, schema_version, payload_json, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                tick_key(tick),
                snapshot.schema_version,
                serde_json::to_string(snapshot)?,
                tick_stamp(tick)
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn load_roster(&self) -> Result<RosterSnapshot, PersistenceError> {
        let mut stmt = self
            .conn
            .prepare("SELECT agent_id, rank_name FROM agent_ranks ORDER BY agent_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;

        let mut snapshot = RosterSnapshot {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            ..RosterSnapshot::default()
        };
        for row in rows {
            let (agent, rank) = row?;
            snapshot
                .entries
                .insert(AgentId::new(agent), AgentRankState { current_rank: rank });
        }
        Ok(snapshot)
    }

    pub fn load_snapshot_at_or_before(
        &self,
        tick: u64,
    ) -> Result<Option<RosterSnapshot>, PersistenceError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload_json
                 FROM roster_snapshots
                 WHERE tick <= ?1
                 ORDER BY tick DESC
                 LIMIT 1",
                params![tick_key(tick)],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(raw) => Ok(Some(serde_json::from_str::<RosterSnapshot>(&raw)?)),
            None => Ok(None),
        }
    }

    /// Upsert a single assignment. `None` stores an agent with empty rank state.
    pub fn set_rank(
        &mut self,
        agent: &AgentId,
        rank: Option<&str>,
        tick: u64,
    ) -> Result<(), PersistenceError> {
        self.conn.execute(
            "INSERT INTO agent_ranks (agent_id, rank_name, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(agent_id) DO UPDATE
                 SET rank_name = excluded.rank_name, updated_at = excluded.updated_at",
            params![agent.as_str(), rank, tick_stamp(tick)],
        )?;
        Ok(())
    }

    /// `None` when the agent was never stored.
    pub fn rank_of(&self, agent: &AgentId) -> Result<Option<AgentRankState>, PersistenceError> {
        let rank: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT rank_name FROM agent_ranks WHERE agent_id = ?1",
                params![agent.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(rank.map(|current_rank| AgentRankState { current_rank }))
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS agent_ranks (
                agent_id TEXT PRIMARY KEY,
                rank_name TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS roster_snapshots (
                tick INTEGER PRIMARY KEY,
                schema_version TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }
}

fn tick_key(tick: u64) -> i64 {
    i64::try_from(tick).unwrap_or(i64::MAX)
}

fn tick_stamp(tick: u64) -> String {
    format!("tick-{tick:06}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(entries: &[(&str, Option<&str>)]) -> RosterSnapshot {
        let mut snapshot = RosterSnapshot::default();
        for (agent, rank) in entries {
            snapshot.entries.insert(
                AgentId::new(*agent),
                AgentRankState {
                    current_rank: rank.map(str::to_string),
                },
            );
        }
        snapshot
    }

    #[test]
    fn roster_round_trips_including_empty_state() {
        let mut store = SqliteRankStore::open_in_memory().expect("store");
        let saved = roster(&[("ada", Some("Manager")), ("bo", None)]);
        store.save_roster(&saved, 10).expect("save");

        let loaded = store.load_roster().expect("load");
        assert_eq!(loaded.entries, saved.entries);
        assert_eq!(
            store.rank_of(&AgentId::new("bo")).expect("query"),
            Some(AgentRankState::default())
        );
        assert_eq!(store.rank_of(&AgentId::new("cy")).expect("query"), None);
    }

    #[test]
    fn save_replaces_previous_assignments() {
        let mut store = SqliteRankStore::open_in_memory().expect("store");
        store.save_roster(&roster(&[("ada", Some("Intern"))]), 1).expect("save");
        store.save_roster(&roster(&[("bo", Some("Director"))]), 2).expect("save");

        let loaded = store.load_roster().expect("load");
        assert_eq!(loaded.entries.len(), 1);
        assert!(loaded.entries.contains_key(&AgentId::new("bo")));
    }

    #[test]
    fn snapshot_lookup_picks_latest_at_or_before() {
        let mut store = SqliteRankStore::open_in_memory().expect("store");
        store.save_roster(&roster(&[("ada", Some("Intern"))]), 100).expect("save");
        store.save_roster(&roster(&[("ada", Some("Technician"))]), 200).expect("save");

        assert!(store.load_snapshot_at_or_before(50).expect("query").is_none());
        let mid = store.load_snapshot_at_or_before(150).expect("query").expect("snapshot");
        assert_eq!(
            mid.entries[&AgentId::new("ada")].current_rank.as_deref(),
            Some("Intern")
        );
        let late = store.load_snapshot_at_or_before(999).expect("query").expect("snapshot");
        assert_eq!(
            late.entries[&AgentId::new("ada")].current_rank.as_deref(),
            Some("Technician")
        );
    }

    #[test]
    fn set_rank_upserts() {
        let mut store = SqliteRankStore::open_in_memory().expect("store");
        let ada = AgentId::new("ada");
        store.set_rank(&ada, Some("Intern"), 1).expect("insert");
        store.set_rank(&ada, Some("Researcher"), 2).expect("update");
        assert_eq!(
            store.rank_of(&ada).expect("query").and_then(|s| s.current_rank),
            Some("Researcher".to_string())
        );
    }
}
