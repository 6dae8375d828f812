//! Admin console entitlement engine for the sports-grounds booking
//! platform. Owns module definitions, global module switches, per-subject
//! access grants, and the maintenance override; the presentation layer
//! keeps search text and selection and calls in here.
//!
//! # Modules
//!
//! - [`entitlements`] — The engine: toggles, listings, bulk actions, evaluation
//! - [`subjects`] — Subject registry entries and joined listing records
//! - [`filter`] — Search / show-inactive listing filter
//! - [`bulk`] — Closed set of bulk actions
//! - [`maintenance`] — Process-wide maintenance override
//! - [`store`] — Persistence boundary for committed changes
//! - [`overview`] — Dashboard counters

pub mod bulk;
pub mod entitlements;
pub mod filter;
pub mod maintenance;
pub mod overview;
pub mod store;
pub mod subjects;

pub use bulk::BulkAction;
pub use entitlements::{
    DecisionReason, EntitlementDecision, EntitlementEngine, ModuleDefinition, ModuleView,
};
pub use filter::SubjectFilter;
pub use maintenance::MaintenanceStatus;
pub use overview::{EntitlementDashboard, EntitlementOverview};
pub use store::{EntitlementChange, EntitlementStore, InMemoryStore, RecordingStore};
pub use subjects::{Subject, SubjectRecord};

pub use grounds_core::{EntitlementError, EntitlementResult, SubjectType};
