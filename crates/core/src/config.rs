use serde::Deserialize;

use crate::error::EntitlementResult;
use crate::types::SubjectType;

/// Root application configuration. Loaded from an optional
/// `config/grounds-admin.toml` file and environment variables with the
/// prefix `GROUNDS_ADMIN__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub entitlements: EntitlementConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntitlementConfig {
    #[serde(default)]
    pub owner_category: SubjectType,
    #[serde(default = "default_seed_defaults")]
    pub seed_defaults: bool,
    #[serde(default)]
    pub maintenance_mode: bool,
    #[serde(default)]
    pub maintenance_message: Option<String>,
}

fn default_seed_defaults() -> bool {
    true
}

impl Default for EntitlementConfig {
    fn default() -> Self {
        Self {
            owner_category: SubjectType::default(),
            seed_defaults: default_seed_defaults(),
            maintenance_mode: false,
            maintenance_message: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the optional config file and environment.
    pub fn load() -> EntitlementResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/grounds-admin").required(false))
            .add_source(
                config::Environment::with_prefix("GROUNDS_ADMIN")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
