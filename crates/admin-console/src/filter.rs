//! Listing filter supplied by the presentation layer.

use serde::{Deserialize, Serialize};

/// Search and visibility filter for per-module subject listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectFilter {
    /// Case-insensitive substring matched against the subject name.
    #[serde(default)]
    pub search_term: String,
    /// Include subjects whose account is inactive.
    #[serde(default)]
    pub show_inactive: bool,
}

impl SubjectFilter {
    pub fn new(search_term: impl Into<String>, show_inactive: bool) -> Self {
        Self {
            search_term: search_term.into(),
            show_inactive,
        }
    }

    /// Everything, including inactive accounts.
    pub fn all() -> Self {
        Self::new("", true)
    }

    pub fn matches(&self, name: &str, account_active: bool) -> bool {
        if !self.show_inactive && !account_active {
            return false;
        }
        if self.search_term.is_empty() {
            return true;
        }
        name.to_lowercase()
            .contains(&self.search_term.to_lowercase())
    }
}
