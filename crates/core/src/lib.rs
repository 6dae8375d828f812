pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, EntitlementConfig};
pub use error::{EntitlementError, EntitlementResult, EntityKind};
pub use types::SubjectType;
