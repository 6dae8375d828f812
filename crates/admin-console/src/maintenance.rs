//! Process-wide maintenance override. While enabled, every module reads as
//! disabled; stored per-module flags are left alone so switching it off
//! restores the previous state exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current maintenance state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceStatus {
    pub enabled: bool,
    pub message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for MaintenanceStatus {
    fn default() -> Self {
        Self {
            enabled: false,
            message: None,
            updated_at: Utc::now(),
        }
    }
}

impl MaintenanceStatus {
    /// Turn maintenance on with an optional operator message.
    pub fn enable(&mut self, message: Option<String>) {
        self.enabled = true;
        self.message = message;
        self.updated_at = Utc::now();
    }

    /// Turn maintenance off and clear the message.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.message = None;
        self.updated_at = Utc::now();
    }

    /// Set the flag. Returns `false` when it already had that value, in
    /// which case nothing (including `updated_at`) is touched.
    pub fn set(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        if enabled {
            let message = self.message.take();
            self.enable(message);
        } else {
            self.disable();
        }
        true
    }
}
