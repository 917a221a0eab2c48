//! v1 cross-boundary contracts for the clearance engine, API, persistence, and CLI.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod task;

pub use task::{Task, TaskKind};

pub const SCHEMA_VERSION_V1: &str = "1.0";

// ---------------------------------------------------------------------------
// Grid and identity
// ---------------------------------------------------------------------------

/// A cell of the world grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// `None` when either coordinate would leave the `i32` range.
    pub fn checked_offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }

    /// Offset clamped to the `i32` range.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    pub fn distance_squared(self, other: Cell) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }

    /// Orthogonal neighbours in a fixed order: east, west, south, north.
    /// Neighbours outside the `i32` range are skipped.
    pub fn neighbours(self) -> impl Iterator<Item = Cell> {
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .into_iter()
            .filter_map(move |(dx, dy)| self.checked_offset(dx, dy))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Ranks and clearance
// ---------------------------------------------------------------------------

/// Clearance a zone can require. Only `Public` is unrestricted; the other three
/// are unordered siblings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceLevel {
    Public,
    Production,
    Research,
    Command,
}

impl ClearanceLevel {
    pub fn is_public(self) -> bool {
        matches!(self, ClearanceLevel::Public)
    }
}

/// Immutable rank definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rank {
    pub name: String,
    pub label: String,
    /// Higher is more senior.
    pub seniority: i32,
    #[serde(default)]
    pub clearances: BTreeSet<ClearanceLevel>,
    /// Grants every zone regardless of `clearances`.
    #[serde(default)]
    pub universal_access: bool,
}

impl Rank {
    pub fn new(name: impl Into<String>, label: impl Into<String>, seniority: i32) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            seniority,
            clearances: BTreeSet::new(),
            universal_access: false,
        }
    }

    pub fn with_clearances(mut self, levels: impl IntoIterator<Item = ClearanceLevel>) -> Self {
        self.clearances.extend(levels);
        self
    }

    pub fn with_universal_access(mut self) -> Self {
        self.universal_access = true;
        self
    }

    pub fn has_clearance(&self, level: ClearanceLevel) -> bool {
        self.universal_access || self.clearances.contains(&level)
    }
}

/// Per-agent rank association. The rank is stored by name; a name that no longer
/// resolves in the catalog behaves exactly like an absent rank.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentRankState {
    #[serde(default)]
    pub current_rank: Option<String>,
}

impl AgentRankState {
    pub fn with_rank(name: impl Into<String>) -> Self {
        Self {
            current_rank: Some(name.into()),
        }
    }

    pub fn has_rank(&self) -> bool {
        self.current_rank.is_some()
    }
}

/// How an agent entered the world. Only fresh agents receive the entry rank.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpawnOrigin {
    Fresh,
    Restored,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterSnapshot {
    pub schema_version: String,
    #[serde(default)]
    pub entries: BTreeMap<AgentId, AgentRankState>,
}

impl Default for RosterSnapshot {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            entries: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

/// A labelled world zone. Cell membership is owned by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Zone {
    pub zone_id: String,
    pub label: String,
}

impl Zone {
    pub fn new(zone_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            label: label.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeCategory {
    RejectInput,
    NeutralEvent,
    PositiveEvent,
    NegativeEvent,
}

/// A fire-and-forget, user-facing message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub tick: u64,
    pub category: NoticeCategory,
    pub agent_id: Option<AgentId>,
    pub text: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[tick {} {:?}] {}", self.tick, self.category, self.text)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Keyword table for zone classification. Matching is case-insensitive and always
/// checks research, then production, then command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ZoneKeywords {
    pub research: Vec<String>,
    pub production: Vec<String>,
    pub command: Vec<String>,
}

impl Default for ZoneKeywords {
    fn default() -> Self {
        Self {
            research: vec!["research".to_string(), "科研".to_string()],
            production: vec!["production".to_string(), "生产".to_string()],
            command: vec!["command".to_string(), "指挥".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnforcementConfig {
    /// Added to the path cost of a restricted cell.
    pub restricted_path_penalty: u32,
    /// Costs at or above this are impassable and never penalised.
    pub impassable_cost: u32,
    /// A notice is emitted only when more than this many ticks passed since the last one.
    pub notice_cooldown_ticks: u64,
    /// The safety-net patrol runs on ticks divisible by this interval.
    pub patrol_interval_ticks: u64,
    /// Largest ring radius examined by the safe-cell search.
    pub safe_cell_search_radius: u32,
    pub zone_keywords: ZoneKeywords,
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            restricted_path_penalty: 1_000,
            impassable_cost: 10_000,
            notice_cooldown_ticks: 250,
            patrol_interval_ticks: 120,
            safe_cell_search_radius: 50,
            zone_keywords: ZoneKeywords::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_at_the_coordinate_limit_do_not_overflow() {
        let edge = Cell::new(i32::MAX, i32::MIN);
        assert_eq!(edge.checked_offset(1, 0), None);
        assert_eq!(edge.checked_offset(-1, 1), Some(Cell::new(i32::MAX - 1, i32::MIN + 1)));
        assert_eq!(edge.offset(5, -5), edge);
        let neighbours: Vec<Cell> = edge.neighbours().collect();
        assert_eq!(
            neighbours,
            vec![Cell::new(i32::MAX - 1, i32::MIN), Cell::new(i32::MAX, i32::MIN + 1)]
        );
        assert_eq!(
            edge.distance_squared(Cell::new(0, 0)),
            i64::from(i32::MAX).pow(2) + i64::from(i32::MIN).pow(2)
        );
    }

    #[test]
    fn universal_access_overrides_empty_clearances() {
        let director = Rank::new("Director", "Director", 10).with_universal_access();
        assert!(director.has_clearance(ClearanceLevel::Command));
        assert!(director.has_clearance(ClearanceLevel::Research));
    }

    #[test]
    fn clearances_are_siblings() {
        let tech = Rank::new("Technician", "Technician", 3)
            .with_clearances([ClearanceLevel::Production]);
        assert!(tech.has_clearance(ClearanceLevel::Production));
        assert!(!tech.has_clearance(ClearanceLevel::Research));
        assert!(!tech.has_clearance(ClearanceLevel::Command));
    }

    #[test]
    fn enforcement_config_fills_missing_fields() {
        let parsed: EnforcementConfig =
            serde_json::from_str(r#"{"patrol_interval_ticks": 60}"#).expect("partial config");
        assert_eq!(parsed.patrol_interval_ticks, 60);
        assert_eq!(parsed.restricted_path_penalty, 1_000);
        assert_eq!(parsed.zone_keywords, ZoneKeywords::default());
    }

    #[test]
    fn rank_state_without_rank_deserializes_as_absent() {
        let parsed: AgentRankState = serde_json::from_str("{}").expect("empty state");
        assert!(!parsed.has_rank());
    }

    #[test]
    fn agent_id_serializes_transparently() {
        let encoded = serde_json::to_string(&AgentId::new("colonist_1")).expect("serialize");
        assert_eq!(encoded, r#""colonist_1""#);
    }
}
