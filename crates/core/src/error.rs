use std::fmt;

use thiserror::Error;

pub type EntitlementResult<T> = Result<T, EntitlementError>;

/// Kind of entity a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Module,
    Subject,
    /// A `(module, subject)` entitlement record.
    ModuleSubject,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Module => "Module",
            Self::Subject => "Subject",
            Self::ModuleSubject => "Module subject record",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum EntitlementError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: EntityKind, id: String },

    #[error("Invalid bulk action: {0}")]
    InvalidBulkAction(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl EntitlementError {
    pub fn module_not_found(module_id: &str) -> Self {
        Self::NotFound {
            kind: EntityKind::Module,
            id: module_id.to_string(),
        }
    }

    pub fn subject_not_found(subject_id: &str) -> Self {
        Self::NotFound {
            kind: EntityKind::Subject,
            id: subject_id.to_string(),
        }
    }

    /// Missing `(module, subject)` pair; the id renders as `module/subject`.
    pub fn record_not_found(module_id: &str, subject_id: &str) -> Self {
        Self::NotFound {
            kind: EntityKind::ModuleSubject,
            id: format!("{module_id}/{subject_id}"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
