//! Entitlement overview — module and subject counters for the admin
//! dashboard, computed from one consistent snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entitlements::EntitlementEngine;

/// Top-level dashboard snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementOverview {
    pub total_modules: u64,
    pub globally_enabled_modules: u64,
    pub effective_enabled_modules: u64,
    pub maintenance_mode: bool,
    pub maintenance_message: Option<String>,
    pub modules: Vec<ModuleSummary>,
    pub generated_at: DateTime<Utc>,
}

/// Per-module row. Counts cover owner-category records only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub module_id: String,
    pub name: String,
    pub effective_enabled: bool,
    pub subjects: u64,
    pub access_enabled: u64,
    pub accounts_active: u64,
    /// Records that would evaluate as granted right now.
    pub entitled: u64,
}

/// Dashboard builder over an engine.
pub struct EntitlementDashboard<'a> {
    engine: &'a EntitlementEngine,
}

impl<'a> EntitlementDashboard<'a> {
    pub fn new(engine: &'a EntitlementEngine) -> Self {
        Self { engine }
    }

    /// Build the full overview.
    pub fn overview(&self) -> EntitlementOverview {
        let owner_category = self.engine.owner_category();
        let state = self.engine.read_state();

        let mut globally_enabled = 0u64;
        let mut effective_enabled = 0u64;
        let mut modules = Vec::with_capacity(state.modules.len());

        for module in &state.modules {
            let effective = state.effective_enabled(module);
            if module.globally_enabled {
                globally_enabled += 1;
            }
            if effective {
                effective_enabled += 1;
            }

            let mut summary = ModuleSummary {
                module_id: module.id.clone(),
                name: module.name.clone(),
                effective_enabled: effective,
                ..ModuleSummary::default()
            };
            for grant in &module.grants {
                let Some(subject) = state.subjects.get(&grant.subject_id) else {
                    continue;
                };
                if subject.subject_type != owner_category {
                    continue;
                }
                summary.subjects += 1;
                if grant.module_enabled {
                    summary.access_enabled += 1;
                }
                if subject.account_active {
                    summary.accounts_active += 1;
                }
                if effective && grant.module_enabled && subject.account_active {
                    summary.entitled += 1;
                }
            }
            modules.push(summary);
        }

        EntitlementOverview {
            total_modules: state.modules.len() as u64,
            globally_enabled_modules: globally_enabled,
            effective_enabled_modules: effective_enabled,
            maintenance_mode: state.maintenance.enabled,
            maintenance_message: state.maintenance.message.clone(),
            modules,
            generated_at: Utc::now(),
        }
    }
}
