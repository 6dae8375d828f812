use std::fmt;

use serde::{Deserialize, Serialize};

/// Account category of a subject. Only one category is exposed through
/// per-module listings (see `EntitlementConfig::owner_category`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    Admin,
    #[default]
    GroundOwner,
    User,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::GroundOwner => "ground_owner",
            Self::User => "user",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
