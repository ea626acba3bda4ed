//! Persisted user preferences with partial-update semantics.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::{read_record, write_record, Store};
use crate::types::{TemperatureUnit, ThemeMode};

pub const PREFERENCES_KEY: &str = "atmos_preferences";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub temperature_unit: TemperatureUnit,
    pub theme: ThemeMode,
}

/// A partial update; `None` fields keep their persisted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreferencesPatch {
    pub temperature_unit: Option<TemperatureUnit>,
    pub theme: Option<ThemeMode>,
}

impl PreferencesPatch {
    pub fn unit(unit: TemperatureUnit) -> Self {
        Self {
            temperature_unit: Some(unit),
            ..Self::default()
        }
    }

    pub fn theme(theme: ThemeMode) -> Self {
        Self {
            theme: Some(theme),
            ..Self::default()
        }
    }

    pub fn apply(&self, base: Preferences) -> Preferences {
        Preferences {
            temperature_unit: self.temperature_unit.unwrap_or(base.temperature_unit),
            theme: self.theme.unwrap_or(base.theme),
        }
    }
}

#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn Store>,
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Defaults overlaid with whatever fields are persisted. Never fails.
    pub fn load(&self) -> Preferences {
        read_record(self.store.as_ref(), PREFERENCES_KEY).unwrap_or_default()
    }

    /// Merge `patch` over the persisted record and write it back.
    pub fn save(&self, patch: PreferencesPatch) -> Preferences {
        let updated = patch.apply(self.load());
        write_record(self.store.as_ref(), PREFERENCES_KEY, &updated);
        tracing::info!(
            "Saved preferences: unit={:?}, theme={:?}",
            updated.temperature_unit,
            updated.theme
        );
        updated
    }
}
