//! Module entitlements — global module switches, per-subject access grants,
//! the maintenance override, and bulk operations over subject selections.
//!
//! All state sits behind one lock: mutations are serialized, and every query
//! reads a single consistent snapshot.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use grounds_core::{
    EntitlementConfig, EntitlementError, EntitlementResult, EntityKind, SubjectType,
};

use crate::bulk::{BulkAction, BulkField};
use crate::filter::SubjectFilter;
use crate::maintenance::MaintenanceStatus;
use crate::store::{EntitlementChange, EntitlementStore, InMemoryStore};
use crate::subjects::{Subject, SubjectRecord};

/// Registration input for a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub globally_enabled: bool,
}

impl ModuleDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        globally_enabled: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            globally_enabled,
        }
    }
}

/// Per-subject access grant stored under a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleGrant {
    pub subject_id: String,
    pub module_enabled: bool,
}

/// A module and its per-subject grants, in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub name: String,
    pub description: String,
    pub globally_enabled: bool,
    pub grants: Vec<ModuleGrant>,
    pub updated_at: DateTime<Utc>,
}

impl Module {
    fn grant(&self, subject_id: &str) -> Option<&ModuleGrant> {
        self.grants.iter().find(|g| g.subject_id == subject_id)
    }
}

/// Module as seen by callers, with the maintenance override applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub globally_enabled: bool,
    pub effective_enabled: bool,
    /// Owner-category records under the module.
    pub subject_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// First gate that decided an entitlement evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Granted,
    Maintenance,
    ModuleDisabled,
    AccountInactive,
    AccessNotGranted,
}

/// Resolved access decision for one `(module, subject)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementDecision {
    pub module_id: String,
    pub subject_id: String,
    pub granted: bool,
    pub reason: DecisionReason,
}

#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub(crate) modules: Vec<Module>,
    pub(crate) subjects: HashMap<String, Subject>,
    pub(crate) maintenance: MaintenanceStatus,
}

impl EngineState {
    fn module_index(&self, module_id: &str) -> EntitlementResult<usize> {
        self.modules
            .iter()
            .position(|m| m.id == module_id)
            .ok_or_else(|| EntitlementError::module_not_found(module_id))
    }

    fn module(&self, module_id: &str) -> EntitlementResult<&Module> {
        self.module_index(module_id).map(|idx| &self.modules[idx])
    }

    fn subject(&self, subject_id: &str) -> EntitlementResult<&Subject> {
        self.subjects
            .get(subject_id)
            .ok_or_else(|| EntitlementError::subject_not_found(subject_id))
    }

    /// Resolve an existing `(module, subject)` record.
    fn record(
        &self,
        module_id: &str,
        subject_id: &str,
    ) -> EntitlementResult<(&Module, &ModuleGrant, &Subject)> {
        let module = self.module(module_id)?;
        let grant = module
            .grant(subject_id)
            .ok_or_else(|| EntitlementError::record_not_found(module_id, subject_id))?;
        let subject = self.subject(subject_id)?;
        Ok((module, grant, subject))
    }

    pub(crate) fn effective_enabled(&self, module: &Module) -> bool {
        !self.maintenance.enabled && module.globally_enabled
    }

    /// Records under `module` whose subject is in `category`.
    pub(crate) fn category_records(&self, module: &Module, category: SubjectType) -> usize {
        module
            .grants
            .iter()
            .filter(|g| {
                self.subjects
                    .get(&g.subject_id)
                    .is_some_and(|s| s.subject_type == category)
            })
            .count()
    }

    pub(crate) fn view(&self, module: &Module, owner_category: SubjectType) -> ModuleView {
        ModuleView {
            id: module.id.clone(),
            name: module.name.clone(),
            description: module.description.clone(),
            globally_enabled: module.globally_enabled,
            effective_enabled: self.effective_enabled(module),
            subject_count: self.category_records(module, owner_category),
            updated_at: module.updated_at,
        }
    }

    /// Commit one change that has already been validated and persisted.
    fn apply(&mut self, change: &EntitlementChange) {
        let now = Utc::now();
        match change {
            EntitlementChange::GlobalEnabled { module_id, enabled } => {
                if let Some(module) = self.modules.iter_mut().find(|m| &m.id == module_id) {
                    module.globally_enabled = *enabled;
                    module.updated_at = now;
                }
            }
            EntitlementChange::ModuleAccess {
                module_id,
                subject_id,
                enabled,
            } => {
                if let Some(module) = self.modules.iter_mut().find(|m| &m.id == module_id) {
                    if let Some(grant) =
                        module.grants.iter_mut().find(|g| &g.subject_id == subject_id)
                    {
                        grant.module_enabled = *enabled;
                        module.updated_at = now;
                    }
                }
            }
            EntitlementChange::AccountActive { subject_id, active } => {
                if let Some(subject) = self.subjects.get_mut(subject_id) {
                    subject.account_active = *active;
                }
            }
        }
    }
}

/// Entitlement engine. One instance per admin session; the presentation
/// layer holds it by reference and keeps search text and selection itself.
pub struct EntitlementEngine {
    state: RwLock<EngineState>,
    store: Arc<dyn EntitlementStore>,
    owner_category: SubjectType,
}

impl Default for EntitlementEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EntitlementEngine {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(EngineState::default()),
            store: Arc::new(InMemoryStore),
            owner_category: SubjectType::GroundOwner,
        }
    }

    /// Build an engine from configuration, seeding the default catalogue
    /// and initial maintenance state as configured.
    pub fn from_config(config: &EntitlementConfig) -> EntitlementResult<Self> {
        let engine = Self::new().with_owner_category(config.owner_category);
        if config.seed_defaults {
            engine.seed_defaults()?;
        }
        if config.maintenance_mode {
            engine.enable_maintenance(config.maintenance_message.clone());
        }
        Ok(engine)
    }

    /// Route every mutation through a host-supplied store.
    pub fn with_store(mut self, store: Arc<dyn EntitlementStore>) -> Self {
        self.store = store;
        self
    }

    /// Subject category exposed through per-module listings.
    pub fn with_owner_category(mut self, category: SubjectType) -> Self {
        self.owner_category = category;
        self
    }

    pub fn owner_category(&self) -> SubjectType {
        self.owner_category
    }

    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read()
    }

    // ── Registration ────────────────────────────────────────────────────

    /// Register a module at the end of the display order.
    pub fn register_module(&self, definition: ModuleDefinition) -> EntitlementResult<()> {
        let mut state = self.state.write();
        if state.modules.iter().any(|m| m.id == definition.id) {
            return Err(EntitlementError::AlreadyExists {
                kind: EntityKind::Module,
                id: definition.id,
            });
        }
        info!(module_id = %definition.id, enabled = definition.globally_enabled, "Module registered");
        state.modules.push(Module {
            id: definition.id,
            name: definition.name,
            description: definition.description,
            globally_enabled: definition.globally_enabled,
            grants: Vec::new(),
            updated_at: Utc::now(),
        });
        Ok(())
    }

    pub fn register_subject(&self, subject: Subject) -> EntitlementResult<()> {
        let mut state = self.state.write();
        if state.subjects.contains_key(&subject.id) {
            return Err(EntitlementError::AlreadyExists {
                kind: EntityKind::Subject,
                id: subject.id,
            });
        }
        info!(subject_id = %subject.id, subject_type = %subject.subject_type, "Subject registered");
        state.subjects.insert(subject.id.clone(), subject);
        Ok(())
    }

    /// Create the `(module, subject)` record with an initial access grant.
    pub fn attach_subject(
        &self,
        module_id: &str,
        subject_id: &str,
        module_enabled: bool,
    ) -> EntitlementResult<()> {
        let mut state = self.state.write();
        state.subject(subject_id)?;
        let idx = state.module_index(module_id)?;
        let module = &mut state.modules[idx];
        if module.grant(subject_id).is_some() {
            return Err(EntitlementError::AlreadyExists {
                kind: EntityKind::ModuleSubject,
                id: format!("{module_id}/{subject_id}"),
            });
        }
        module.grants.push(ModuleGrant {
            subject_id: subject_id.to_string(),
            module_enabled,
        });
        info!(module_id, subject_id, enabled = module_enabled, "Subject attached to module");
        Ok(())
    }

    // ── Maintenance ─────────────────────────────────────────────────────

    /// Set the process-wide maintenance override. Idempotent.
    pub fn set_maintenance_mode(&self, enabled: bool) {
        if self.state.write().maintenance.set(enabled) {
            info!(enabled, "Maintenance mode set");
        }
    }

    /// Enable maintenance with an operator-facing message.
    pub fn enable_maintenance(&self, message: Option<String>) {
        self.state.write().maintenance.enable(message);
        info!("Maintenance mode enabled");
    }

    pub fn maintenance(&self) -> MaintenanceStatus {
        self.state.read().maintenance.clone()
    }

    // ── Module queries and toggles ──────────────────────────────────────

    /// `false` while maintenance is on, otherwise the module's global switch.
    pub fn effective_module_enabled(&self, module_id: &str) -> EntitlementResult<bool> {
        let state = self.state.read();
        let module = state.module(module_id)?;
        Ok(state.effective_enabled(module))
    }

    /// Flip a module's global switch. Per-subject grants are untouched, so
    /// re-enabling restores them.
    pub fn toggle_global_module(&self, module_id: &str) -> EntitlementResult<bool> {
        let mut state = self.state.write();
        let enabled = !state.module(module_id)?.globally_enabled;
        let change = EntitlementChange::GlobalEnabled {
            module_id: module_id.to_string(),
            enabled,
        };
        self.persist(std::slice::from_ref(&change))?;
        state.apply(&change);
        info!(module_id, enabled, "Module global state toggled");
        Ok(enabled)
    }

    pub fn list_modules(&self) -> Vec<ModuleView> {
        let state = self.state.read();
        state
            .modules
            .iter()
            .map(|m| state.view(m, self.owner_category))
            .collect()
    }

    pub fn module(&self, module_id: &str) -> EntitlementResult<ModuleView> {
        let state = self.state.read();
        let module = state.module(module_id)?;
        Ok(state.view(module, self.owner_category))
    }

    /// Effectively enabled modules that have at least one owner-category
    /// record, i.e. the modules a per-subject control panel shows.
    pub fn modules_with_subject_controls(&self) -> Vec<ModuleView> {
        let state = self.state.read();
        state
            .modules
            .iter()
            .filter(|m| state.effective_enabled(m))
            .filter(|m| state.category_records(m, self.owner_category) > 0)
            .map(|m| state.view(m, self.owner_category))
            .collect()
    }

    // ── Per-subject toggles ─────────────────────────────────────────────

    /// Flip the subject's account-active flag. The `(module, subject)`
    /// record must exist; the flag itself is shared across modules.
    pub fn toggle_subject_account_active(
        &self,
        module_id: &str,
        subject_id: &str,
    ) -> EntitlementResult<bool> {
        let mut state = self.state.write();
        let (_, _, subject) = state.record(module_id, subject_id)?;
        let active = !subject.account_active;
        let change = EntitlementChange::AccountActive {
            subject_id: subject_id.to_string(),
            active,
        };
        self.persist(std::slice::from_ref(&change))?;
        state.apply(&change);
        info!(module_id, subject_id, active, "Subject account toggled");
        Ok(active)
    }

    /// Flip the subject's access grant for one module. Stored even while the
    /// module is off; it only takes effect once the module is enabled.
    pub fn toggle_subject_module_access(
        &self,
        module_id: &str,
        subject_id: &str,
    ) -> EntitlementResult<bool> {
        let mut state = self.state.write();
        let (_, grant, _) = state.record(module_id, subject_id)?;
        let enabled = !grant.module_enabled;
        let change = EntitlementChange::ModuleAccess {
            module_id: module_id.to_string(),
            subject_id: subject_id.to_string(),
            enabled,
        };
        self.persist(std::slice::from_ref(&change))?;
        state.apply(&change);
        info!(module_id, subject_id, enabled, "Subject module access toggled");
        Ok(enabled)
    }

    // ── Listing and selection ───────────────────────────────────────────

    /// Owner-category records under a module that pass `filter`, in
    /// insertion order. Not suppressed when the module is disabled.
    pub fn list_eligible_subjects(
        &self,
        module_id: &str,
        filter: &SubjectFilter,
    ) -> EntitlementResult<Vec<SubjectRecord>> {
        let state = self.state.read();
        let module = state.module(module_id)?;
        let records: Vec<_> = module
            .grants
            .iter()
            .filter_map(|g| state.subjects.get(&g.subject_id).map(|s| (s, g)))
            .filter(|(s, _)| s.subject_type == self.owner_category)
            .filter(|(s, _)| filter.matches(&s.name, s.account_active))
            .map(|(s, g)| SubjectRecord::join(s, g.module_enabled))
            .collect();
        debug!(module_id, count = records.len(), "Eligible subjects listed");
        Ok(records)
    }

    /// Ids of every subject [`Self::list_eligible_subjects`] would return.
    pub fn select_all_eligible(
        &self,
        module_id: &str,
        filter: &SubjectFilter,
    ) -> EntitlementResult<BTreeSet<String>> {
        Ok(self
            .list_eligible_subjects(module_id, filter)?
            .into_iter()
            .map(|r| r.subject_id)
            .collect())
    }

    // ── Bulk actions ────────────────────────────────────────────────────

    /// Apply `action` to every existing record under `module_id` whose
    /// subject is in `subject_ids`. Unknown ids are skipped. Returns the
    /// number of records whose value changed. All-or-nothing: if the store
    /// rejects the change set, nothing is committed.
    pub fn apply_bulk_action(
        &self,
        module_id: &str,
        subject_ids: &BTreeSet<String>,
        action: BulkAction,
    ) -> EntitlementResult<usize> {
        let mut state = self.state.write();
        let module = state.module(module_id)?;
        let target = action.target();
        let matched = module
            .grants
            .iter()
            .filter(|g| subject_ids.contains(&g.subject_id));

        let changes: Vec<EntitlementChange> = match action.field() {
            BulkField::ModuleEnabled => matched
                .filter(|g| g.module_enabled != target)
                .map(|g| EntitlementChange::ModuleAccess {
                    module_id: module_id.to_string(),
                    subject_id: g.subject_id.clone(),
                    enabled: target,
                })
                .collect(),
            BulkField::AccountActive => matched
                .filter_map(|g| state.subjects.get(&g.subject_id))
                .filter(|s| s.account_active != target)
                .map(|s| EntitlementChange::AccountActive {
                    subject_id: s.id.clone(),
                    active: target,
                })
                .collect(),
        };

        if changes.is_empty() {
            debug!(module_id, action = %action, "Bulk action changed nothing");
            return Ok(0);
        }

        self.persist(&changes)?;
        for change in &changes {
            state.apply(change);
        }
        info!(
            module_id,
            action = %action,
            requested = subject_ids.len(),
            changed = changes.len(),
            "Bulk action applied"
        );
        Ok(changes.len())
    }

    // ── Evaluation ──────────────────────────────────────────────────────

    /// Resolve whether a subject may use a module right now. Gates are
    /// checked in order: maintenance, global switch, account, grant.
    pub fn evaluate(
        &self,
        module_id: &str,
        subject_id: &str,
    ) -> EntitlementResult<EntitlementDecision> {
        let state = self.state.read();
        let (module, grant, subject) = state.record(module_id, subject_id)?;

        let reason = if state.maintenance.enabled {
            DecisionReason::Maintenance
        } else if !module.globally_enabled {
            DecisionReason::ModuleDisabled
        } else if !subject.account_active {
            DecisionReason::AccountInactive
        } else if !grant.module_enabled {
            DecisionReason::AccessNotGranted
        } else {
            DecisionReason::Granted
        };

        Ok(EntitlementDecision {
            module_id: module_id.to_string(),
            subject_id: subject_id.to_string(),
            granted: reason == DecisionReason::Granted,
            reason,
        })
    }

    fn persist(&self, changes: &[EntitlementChange]) -> EntitlementResult<()> {
        if let Err(e) = self.store.persist(changes) {
            warn!(error = %e, changes = changes.len(), "Entitlement change set rejected by store");
            return Err(EntitlementError::Persistence(e));
        }
        Ok(())
    }

    /// Seed the stock module catalogue and its ground owners.
    pub fn seed_defaults(&self) -> EntitlementResult<()> {
        self.register_subject(Subject::owner("1", "John Smith"))?;
        self.register_subject(Subject::owner("2", "Sarah Johnson"))?;

        self.register_module(ModuleDefinition::new(
            "ground_management",
            "Ground Management",
            "Allow users to create and manage sports grounds",
            true,
        ))?;
        self.attach_subject("ground_management", "1", true)?;
        self.attach_subject("ground_management", "2", false)?;

        self.register_module(ModuleDefinition::new(
            "subscription_module",
            "Subscription Module",
            "Enable subscription plans and premium features",
            true,
        ))?;
        self.attach_subject("subscription_module", "1", true)?;
        self.attach_subject("subscription_module", "2", true)?;

        self.register_module(ModuleDefinition::new(
            "group_creation",
            "Group Creation",
            "Allow users to create and join groups",
            false,
        ))?;

        info!("Default modules seeded");
        Ok(())
    }
}
