// Alert window settings service.
// Per-user day thresholds with validation on save.

use crate::alerts::AlertWindowConfig;
use crate::error::{ConfigError, StoreError};
use crate::store::AlertConfigStore;

pub struct AlertWindowSettings<'a, S: AlertConfigStore + ?Sized> {
    store: &'a S,
    fallback: AlertWindowConfig,
}

impl<'a, S: AlertConfigStore + ?Sized> AlertWindowSettings<'a, S> {
    pub fn new(store: &'a S, fallback: AlertWindowConfig) -> Self {
        Self { store, fallback }
    }

    /// The user's saved window, or the fallback when none (or an invalid one) is stored.
    pub fn load(&self, user_id: &str) -> Result<AlertWindowConfig, StoreError> {
        match self.store.load_alert_window(user_id)? {
            Some(config) if config.validate().is_ok() => Ok(config),
            Some(config) => {
                log::warn!(
                    "alert window for {} is invalid ({}d/{}d), using fallback",
                    user_id,
                    config.short_term_days,
                    config.long_term_days
                );
                Ok(self.fallback)
            }
            None => Ok(self.fallback),
        }
    }

    /// Persist a new window. Invalid windows are rejected and the stored
    /// value is left untouched.
    pub fn save(&self, user_id: &str, config: AlertWindowConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.store.save_alert_window(user_id, &config)?;
        log::info!(
            "alert window for {} set to {}d/{}d",
            user_id,
            config.short_term_days,
            config.long_term_days
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn defaults_until_saved() {
        let store = MemoryStore::new();
        let settings = AlertWindowSettings::new(&store, AlertWindowConfig::default());
        assert_eq!(settings.load("u1").unwrap(), AlertWindowConfig::default());

        settings.save("u1", AlertWindowConfig::new(7, 21).unwrap()).unwrap();
        assert_eq!(settings.load("u1").unwrap(), AlertWindowConfig::new(7, 21).unwrap());
        assert_eq!(settings.load("u2").unwrap(), AlertWindowConfig::default());
    }

    #[test]
    fn invalid_save_keeps_prior_value() {
        let store = MemoryStore::new();
        let settings = AlertWindowSettings::new(&store, AlertWindowConfig::default());
        settings.save("u1", AlertWindowConfig::new(10, 20).unwrap()).unwrap();

        let bad = AlertWindowConfig {
            short_term_days: 20,
            long_term_days: 20,
        };
        let err = settings.save("u1", bad).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(settings.load("u1").unwrap(), AlertWindowConfig::new(10, 20).unwrap());
    }

    #[test]
    fn stored_invalid_window_falls_back() {
        let store = MemoryStore::new();
        store
            .save_alert_window(
                "u1",
                &AlertWindowConfig {
                    short_term_days: 0,
                    long_term_days: 5,
                },
            )
            .unwrap();
        let settings = AlertWindowSettings::new(&store, AlertWindowConfig::default());
        assert_eq!(settings.load("u1").unwrap(), AlertWindowConfig::default());
    }
}
