//! Bulk actions applied to a selection of subjects under one module.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use grounds_core::EntitlementError;

/// Closed set of bulk actions. Enable/Disable only touch module access,
/// Activate/Deactivate only touch the account-active flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Enable,
    Disable,
    Activate,
    Deactivate,
}

/// The record field a bulk action writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkField {
    ModuleEnabled,
    AccountActive,
}

impl BulkAction {
    pub const ALL: &'static [BulkAction] = &[
        Self::Enable,
        Self::Disable,
        Self::Activate,
        Self::Deactivate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
        }
    }

    pub fn field(&self) -> BulkField {
        match self {
            Self::Enable | Self::Disable => BulkField::ModuleEnabled,
            Self::Activate | Self::Deactivate => BulkField::AccountActive,
        }
    }

    /// Value written to [`BulkAction::field`].
    pub fn target(&self) -> bool {
        matches!(self, Self::Enable | Self::Activate)
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkAction {
    type Err = EntitlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EntitlementError::InvalidBulkAction(s.to_string()))
    }
}
