//! Delivery settings.
//!
//! Settings are a flat map of string keys to JSON values. Defaults are merged
//! under the caller's overrides at construction; the required keys are only
//! checked when a send is attempted.

use std::collections::BTreeMap;
use std::fmt;

use core_config::{env_optional, env_parse, ConfigError, FromEnv};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{DeliveryError, DeliveryResult};
use crate::extract::strip;

pub const SITE_UUID: &str = "site_uuid";
pub const PUBLISHABLE_KEY: &str = "publishable_key";
pub const SECRET_KEY: &str = "secret_key";
pub const TRANSACTIONAL: &str = "transactional";

/// Settings that must resolve to a non-blank string before dispatch, in check order.
pub const REQUIRED_SETTINGS: [&str; 3] = [SITE_UUID, PUBLISHABLE_KEY, SECRET_KEY];

const REDACTED: [&str; 2] = [PUBLISHABLE_KEY, SECRET_KEY];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Settings must be provided as a hash-like object")]
    NotAMap,
}

/// Configuration for a [`BentoDelivery`](crate::BentoDelivery).
///
/// Recognized keys are `site_uuid`, `publishable_key`, `secret_key` and
/// `transactional` (default `true`). Unknown keys are kept and ignored.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Settings {
    values: BTreeMap<String, Value>,
}

impl Settings {
    /// Defaults only.
    pub fn new() -> Self {
        let mut values = BTreeMap::new();
        values.insert(TRANSACTIONAL.to_string(), Value::Bool(true));
        Self { values }
    }

    /// Builder-style override.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Build from an untyped value. `null` yields the defaults.
    pub fn from_value(value: Value) -> Result<Self, SettingsError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Ok(Self::from(map)),
            _ => Err(SettingsError::NotAMap),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Value sent as the wire-level `transactional` flag.
    ///
    /// Sent as stored; `null` when the key was removed.
    pub fn transactional(&self) -> Value {
        self.values.get(TRANSACTIONAL).cloned().unwrap_or(Value::Null)
    }

    /// Resolve a setting that must be a non-blank string.
    pub fn required(&self, name: &str) -> DeliveryResult<&str> {
        match self.values.get(name) {
            Some(Value::String(value)) if !strip(value).is_empty() => Ok(value),
            _ => Err(DeliveryError::missing_setting(name)),
        }
    }

    /// Check every required setting, reporting the first missing one.
    pub fn validate(&self) -> DeliveryResult<()> {
        REQUIRED_SETTINGS
            .iter()
            .try_for_each(|name| self.required(name).map(|_| ()))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(overrides: Map<String, Value>) -> Self {
        let mut settings = Self::new();
        settings.values.extend(overrides);
        settings
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            if REDACTED.contains(&key.as_str()) {
                map.entry(key, &"[redacted]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

impl FromEnv for Settings {
    /// Reads `BENTO_SITE_UUID`, `BENTO_PUBLISHABLE_KEY`, `BENTO_SECRET_KEY`
    /// and `BENTO_TRANSACTIONAL`. None of them is required at load time.
    fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Self::new();

        for (key, var) in [
            (SITE_UUID, "BENTO_SITE_UUID"),
            (PUBLISHABLE_KEY, "BENTO_PUBLISHABLE_KEY"),
            (SECRET_KEY, "BENTO_SECRET_KEY"),
        ] {
            if let Some(value) = env_optional(var) {
                settings.set(key, value);
            }
        }

        if let Some(transactional) = env_parse::<bool>("BENTO_TRANSACTIONAL")? {
            settings.set(TRANSACTIONAL, transactional);
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_applies_default_transactional_setting() {
        let settings = Settings::new();

        assert_eq!(settings.len(), 1);
        assert_eq!(settings.get(TRANSACTIONAL), Some(&json!(true)));
    }

    #[test]
    fn test_overrides_merge_over_defaults() {
        let settings = Settings::new()
            .with(TRANSACTIONAL, false)
            .with(SITE_UUID, "uuid");

        assert_eq!(settings.transactional(), json!(false));
        assert_eq!(settings.get(SITE_UUID), Some(&json!("uuid")));
    }

    #[test]
    fn test_only_transactional_override_sets_nothing_else() {
        let settings = Settings::from_value(json!({"transactional": false})).unwrap();

        assert_eq!(settings.transactional(), json!(false));
        assert_eq!(settings.keys().collect::<Vec<_>>(), vec![TRANSACTIONAL]);
    }

    #[test]
    fn test_unknown_settings_are_preserved() {
        let settings = Settings::from_value(json!({"custom_option": "custom"})).unwrap();

        assert_eq!(settings.get("custom_option"), Some(&json!("custom")));
        assert_eq!(settings.transactional(), json!(true));
    }

    #[test]
    fn test_null_and_empty_map_yield_defaults() {
        assert_eq!(Settings::from_value(Value::Null).unwrap(), Settings::new());
        assert_eq!(Settings::from_value(json!({})).unwrap(), Settings::new());
    }

    #[test]
    fn test_non_map_value_is_rejected() {
        let err = Settings::from_value(json!(123)).unwrap_err();

        assert_eq!(err.to_string(), "Settings must be provided as a hash-like object");
    }

    #[test]
    fn test_settings_are_mutable() {
        let mut settings = Settings::new();
        settings.set(TRANSACTIONAL, false);

        assert_eq!(settings.transactional(), json!(false));

        settings.remove(TRANSACTIONAL);
        assert_eq!(settings.transactional(), Value::Null);
    }

    #[test]
    fn test_deserialize_merges_over_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"site_uuid": "s", "publishable_key": "p"}"#).unwrap();

        assert_eq!(settings.len(), 3);
        assert_eq!(settings.transactional(), json!(true));
    }

    #[test]
    fn test_required_rejects_blank_and_non_string_values() {
        let settings = Settings::new()
            .with(SITE_UUID, "site")
            .with(PUBLISHABLE_KEY, "  ")
            .with(SECRET_KEY, Value::Null);

        assert_eq!(settings.required(SITE_UUID).unwrap(), "site");
        assert_eq!(
            settings.required(PUBLISHABLE_KEY).unwrap_err().message(),
            "Delivery setting publishable_key is required"
        );
        assert_eq!(
            settings.required(SECRET_KEY).unwrap_err().message(),
            "Delivery setting secret_key is required"
        );
    }

    #[test]
    fn test_required_keeps_non_ascii_whitespace_values() {
        let settings = Settings::new().with(SITE_UUID, "\u{a0}").with(SECRET_KEY, "\t\0");

        assert_eq!(settings.required(SITE_UUID).unwrap(), "\u{a0}");
        assert!(settings.required(SECRET_KEY).is_err());
    }

    #[test]
    fn test_validate_reports_first_missing_setting() {
        let err = Settings::new().with(SECRET_KEY, "k").validate().unwrap_err();
        assert_eq!(err.message(), "Delivery setting site_uuid is required");

        let ok = Settings::new()
            .with(SITE_UUID, "s")
            .with(PUBLISHABLE_KEY, "p")
            .with(SECRET_KEY, "k")
            .validate();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let settings = Settings::new()
            .with(PUBLISHABLE_KEY, "pub-123")
            .with(SECRET_KEY, "sec-456");

        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("pub-123"));
        assert!(!rendered.contains("sec-456"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn test_from_env_reads_bento_variables() {
        temp_env::with_vars(
            [
                ("BENTO_SITE_UUID", Some("env-site")),
                ("BENTO_PUBLISHABLE_KEY", Some("env-pub")),
                ("BENTO_SECRET_KEY", Some("env-secret")),
                ("BENTO_TRANSACTIONAL", Some("false")),
            ],
            || {
                let settings = Settings::from_env().unwrap();
                assert_eq!(settings.required(SITE_UUID).unwrap(), "env-site");
                assert_eq!(settings.required(PUBLISHABLE_KEY).unwrap(), "env-pub");
                assert_eq!(settings.required(SECRET_KEY).unwrap(), "env-secret");
                assert_eq!(settings.transactional(), json!(false));
            },
        );
    }

    #[test]
    fn test_from_env_leaves_missing_keys_unset() {
        temp_env::with_vars_unset(
            [
                "BENTO_SITE_UUID",
                "BENTO_PUBLISHABLE_KEY",
                "BENTO_SECRET_KEY",
                "BENTO_TRANSACTIONAL",
            ],
            || {
                let settings = Settings::from_env().unwrap();
                assert_eq!(settings, Settings::new());
            },
        );
    }

    #[test]
    fn test_from_env_rejects_unparseable_transactional() {
        temp_env::with_var("BENTO_TRANSACTIONAL", Some("maybe"), || {
            let err = Settings::from_env().unwrap_err();
            assert!(err.to_string().contains("BENTO_TRANSACTIONAL"));
        });
    }
}
