//! Subjects — the principals (ground-owner accounts) whose module access is
//! individually granted.

use serde::{Deserialize, Serialize};

use grounds_core::SubjectType;

/// A registered subject. `account_active` is tracked once per subject and
/// shared by every module the subject has a record in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub subject_type: SubjectType,
    pub account_active: bool,
}

impl Subject {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        subject_type: SubjectType,
        account_active: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subject_type,
            account_active,
        }
    }

    /// Shorthand for an active ground owner.
    pub fn owner(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, SubjectType::GroundOwner, true)
    }
}

/// Joined view of one `(module, subject)` record as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub subject_id: String,
    pub name: String,
    pub subject_type: SubjectType,
    pub account_active: bool,
    pub module_enabled: bool,
}

impl SubjectRecord {
    pub(crate) fn join(subject: &Subject, module_enabled: bool) -> Self {
        Self {
            subject_id: subject.id.clone(),
            name: subject.name.clone(),
            subject_type: subject.subject_type,
            account_active: subject.account_active,
            module_enabled,
        }
    }
}
