//! Rank-based zone access control and movement arbitration.
//!
//! The engine observes a host simulation at three extension points: the
//! per-cell path cost query, the task-start hook, and a periodic tick. All of
//! them consult one access decision function backed by the rank catalog, the
//! per-agent rank roster and the zone classifier.

pub mod access;
pub mod cooldown;
pub mod enforcement;
pub mod grid;
pub mod host;
pub mod planning;
pub mod promotion;
pub mod rank;
pub mod roster;
pub mod search;
pub mod zone;

pub use access::AccessPolicy;
pub use enforcement::{ClearanceEngine, PatrolReport, TaskDecision};
pub use grid::GridWorld;
pub use host::{NotificationSink, TaskIssuer, WorldView};
pub use planning::{PlanningContext, PlanningScope};
pub use promotion::{CeremonyStage, PromotionCeremony, PromotionError};
pub use rank::{CatalogError, RankCatalog};
pub use roster::RankRoster;
pub use zone::ZoneClassifier;
