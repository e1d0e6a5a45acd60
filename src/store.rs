//! Persistence seams for the two pieces of per-user state: widget layouts and
//! alert windows. The SQLite implementation lives in `db`.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::alerts::AlertWindowConfig;
use crate::error::StoreError;

/// Owner of a layout: one user on one dashboard context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutScope {
    pub user_id: String,
    pub context_id: String,
}

impl LayoutScope {
    pub fn new(user_id: &str, context_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            context_id: context_id.to_string(),
        }
    }
}

/// Receives the currently stored list and returns the list to write, or
/// `None` to leave the row untouched.
pub type LayoutUpdate<'a> = Box<dyn FnOnce(Option<Vec<String>>) -> Option<Vec<String>> + 'a>;

pub trait LayoutStore {
    fn load_layout(&self, scope: &LayoutScope) -> Result<Option<Vec<String>>, StoreError>;
    fn save_layout(&self, scope: &LayoutScope, keys: &[String]) -> Result<(), StoreError>;

    /// Read, transform and write one layout with no other writer in between.
    fn update_layout(&self, scope: &LayoutScope, update: LayoutUpdate<'_>)
        -> Result<(), StoreError>;
}

pub trait AlertConfigStore {
    fn load_alert_window(&self, user_id: &str) -> Result<Option<AlertWindowConfig>, StoreError>;
    fn save_alert_window(&self, user_id: &str, config: &AlertWindowConfig)
        -> Result<(), StoreError>;
}

/// Process-local store, for tests and hosts without a database.
#[derive(Default)]
pub struct MemoryStore {
    layouts: Mutex<HashMap<LayoutScope, Vec<String>>>,
    alert_windows: Mutex<HashMap<String, AlertWindowConfig>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayoutStore for MemoryStore {
    fn load_layout(&self, scope: &LayoutScope) -> Result<Option<Vec<String>>, StoreError> {
        Ok(self.layouts.lock().get(scope).cloned())
    }

    fn save_layout(&self, scope: &LayoutScope, keys: &[String]) -> Result<(), StoreError> {
        self.layouts.lock().insert(scope.clone(), keys.to_vec());
        Ok(())
    }

    fn update_layout(
        &self,
        scope: &LayoutScope,
        update: LayoutUpdate<'_>,
    ) -> Result<(), StoreError> {
        let mut layouts = self.layouts.lock();
        if let Some(next) = update(layouts.get(scope).cloned()) {
            layouts.insert(scope.clone(), next);
        }
        Ok(())
    }
}

impl AlertConfigStore for MemoryStore {
    fn load_alert_window(&self, user_id: &str) -> Result<Option<AlertWindowConfig>, StoreError> {
        Ok(self.alert_windows.lock().get(user_id).copied())
    }

    fn save_alert_window(
        &self,
        user_id: &str,
        config: &AlertWindowConfig,
    ) -> Result<(), StoreError> {
        self.alert_windows.lock().insert(user_id.to_string(), *config);
        Ok(())
    }
}
