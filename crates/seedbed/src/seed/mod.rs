//! Default state written into a freshly emptied test store.
//!
//! Seeding runs six steps in a fixed order: installation defaults are applied
//! to absent settings, test-only overrides are forced, in-process caches are
//! reset, baseline privileges are granted, the active extension list is
//! replaced, and the baseline theme is selected. Running the sequence again
//! converges to the same observable state.

pub mod extensions;
pub mod privileges;
mod settings;

use std::sync::Arc;

use serde_json::{Map, Value, json};
use strum::Display;
use thiserror::Error;
use tracing::{debug, info};

use seedbed_config::Config;

use crate::cache::CacheRegistry;
use crate::store::{Store, StoreError};

pub use settings::{SETTINGS_KEY, Settings};

const SEED_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::seed");

const BUILTIN_DEFAULTS: &str = include_str!("defaults.json");

/// Settings forced on every seed so tests never wait on throttles or
/// password policy.
pub const TEST_OVERRIDES: &[(&str, i64)] = &[
    ("postDelay", 0),
    ("initialPostDelay", 0),
    ("newbiePostDelay", 0),
    ("autoDetectLang", 0),
    ("minimumPasswordStrength", 0),
];

/// Individual seeding steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SeedStep {
    /// Set-if-empty of installation defaults.
    ApplyDefaults,
    /// Unconditional test overrides.
    ForceOverrides,
    /// Cache registry reset.
    ResetCaches,
    /// Baseline privilege grants.
    GrantPrivileges,
    /// Active extension replacement.
    ActivateExtensions,
    /// Theme selection.
    ApplyTheme,
}

/// Errors raised while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// A store call failed inside a step.
    #[error("seed step {step} failed: {source}")]
    Store {
        /// Step that was running.
        step: SeedStep,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
    /// The bundled defaults could not be read.
    #[error("bundled seed defaults are unusable: {reason}")]
    Defaults {
        /// Parser or shape error.
        reason: String,
    },
}

impl SeedError {
    /// Step the error belongs to.
    #[must_use]
    pub fn step(&self) -> SeedStep {
        match self {
            Self::Store { step, .. } => *step,
            Self::Defaults { .. } => SeedStep::ApplyDefaults,
        }
    }
}

trait StepContext<T> {
    fn during(self, step: SeedStep) -> Result<T, SeedError>;
}

impl<T> StepContext<T> for Result<T, StoreError> {
    fn during(self, step: SeedStep) -> Result<T, SeedError> {
        self.map_err(|source| SeedError::Store { step, source })
    }
}

/// Parses the bundled installation defaults.
pub fn builtin_defaults() -> Result<Map<String, Value>, SeedError> {
    match serde_json::from_str::<Value>(BUILTIN_DEFAULTS) {
        Ok(Value::Object(defaults)) => Ok(defaults),
        Ok(_) => Err(SeedError::Defaults {
            reason: "expected a JSON object".into(),
        }),
        Err(error) => Err(SeedError::Defaults {
            reason: error.to_string(),
        }),
    }
}

/// Applies the baseline state to the test store.
pub struct Seeder {
    store: Arc<dyn Store>,
    config: Arc<Config>,
    defaults: Map<String, Value>,
    caches: CacheRegistry,
    settings: Settings,
}

impl Seeder {
    /// Builds a seeder using the bundled defaults.
    pub fn new(
        store: Arc<dyn Store>,
        config: Arc<Config>,
        caches: CacheRegistry,
    ) -> Result<Self, SeedError> {
        Ok(Self::with_defaults(store, config, caches, builtin_defaults()?))
    }

    /// Builds a seeder with explicit defaults.
    #[must_use]
    pub fn with_defaults(
        store: Arc<dyn Store>,
        config: Arc<Config>,
        caches: CacheRegistry,
        defaults: Map<String, Value>,
    ) -> Self {
        Self {
            store,
            config,
            defaults,
            caches,
            settings: Settings::default(),
        }
    }

    /// Settings as of the last seed.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Caches reset by [`SeedStep::ResetCaches`].
    #[must_use]
    pub fn caches(&self) -> &CacheRegistry {
        &self.caches
    }

    /// Runs every step in order, stopping at the first failure.
    pub async fn seed(&mut self) -> Result<(), SeedError> {
        self.apply_defaults().await.during(SeedStep::ApplyDefaults)?;
        self.force_overrides()
            .await
            .during(SeedStep::ForceOverrides)?;

        let reset = self.caches.reset_all();
        debug!(target: SEED_TARGET, caches = reset, "caches reset");

        self.grant_privileges()
            .await
            .during(SeedStep::GrantPrivileges)?;

        let active = extensions::activation_list(self.config.test_extensions());
        extensions::replace_active(self.store.as_ref(), &active)
            .await
            .during(SeedStep::ActivateExtensions)?;

        self.apply_theme().await.during(SeedStep::ApplyTheme)?;

        info!(
            target: SEED_TARGET,
            settings = self.settings.as_map().len(),
            extensions = active.len(),
            "default state seeded"
        );
        Ok(())
    }

    async fn apply_defaults(&mut self) -> Result<(), StoreError> {
        let stored = self.store.get_object(SETTINGS_KEY).await?.unwrap_or_default();
        self.settings.replace(stored);
        let filled = self.settings.apply_defaults(&self.defaults);
        for key in &filled {
            if let Some(value) = self.settings.get(key) {
                self.store
                    .set_object_field(SETTINGS_KEY, key, value.clone())
                    .await?;
            }
        }
        debug!(target: SEED_TARGET, filled = filled.len(), "defaults applied");
        Ok(())
    }

    async fn force_overrides(&mut self) -> Result<(), StoreError> {
        for (key, value) in TEST_OVERRIDES {
            self.force(key, json!(value)).await?;
        }
        Ok(())
    }

    async fn grant_privileges(&self) -> Result<(), StoreError> {
        for grant in privileges::BASELINE_GRANTS {
            privileges::give(self.store.as_ref(), grant.privileges, grant.group).await?;
        }
        Ok(())
    }

    async fn apply_theme(&mut self) -> Result<(), StoreError> {
        let theme = extensions::BASELINE_THEME;
        extensions::activate(self.store.as_ref(), theme.id).await?;
        self.force("theme:type", json!(theme.kind)).await?;
        self.force("theme:id", json!(theme.id)).await
    }

    async fn force(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.store
            .set_object_field(SETTINGS_KEY, key, value.clone())
            .await?;
        self.settings.force(key, value);
        Ok(())
    }
}
