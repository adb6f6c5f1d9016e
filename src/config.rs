//! Configuration for request handling.

use http::Method;
use serde::Deserialize;
use thiserror::Error;

use crate::transaction::NestingMode;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("malformed configuration json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request handling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// How nested transaction scopes reach the store.
    pub nesting: NestingMode,
    /// Request methods that bypass transactions.
    pub read_methods: Vec<String>,
    /// Column used by `find` and by the default sort.
    pub primary_key: String,
    /// Page size for `paginate=true`.
    pub default_per_page: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nesting: NestingMode::default(),
            read_methods: vec!["GET".to_string()],
            primary_key: "id".to_string(),
            default_per_page: 15,
        }
    }
}

impl Config {
    /// Load a configuration from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the nesting mode.
    pub fn nesting(mut self, value: NestingMode) -> Self {
        self.nesting = value;
        self
    }

    /// Add a method to the read set.
    pub fn read_method(mut self, method: Method) -> Self {
        let name = method.as_str().to_string();
        if !self.read_methods.contains(&name) {
            self.read_methods.push(name);
        }
        self
    }

    /// Set the primary key column.
    pub fn primary_key(mut self, value: impl Into<String>) -> Self {
        self.primary_key = value.into();
        self
    }

    /// Set the default page size.
    pub fn default_per_page(mut self, value: usize) -> Self {
        self.default_per_page = value;
        self
    }

    /// Check if requests with `method` skip transactions.
    pub fn is_read_method(&self, method: &Method) -> bool {
        self.read_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method.as_str()))
    }

    /// Reject values that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primary_key.trim().is_empty() {
            return Err(ConfigError::Invalid("primary_key must not be empty".into()));
        }
        if self.default_per_page == 0 {
            return Err(ConfigError::Invalid("default_per_page must be positive".into()));
        }
        for method in &self.read_methods {
            Method::from_bytes(method.as_bytes())
                .map_err(|_| ConfigError::Invalid(format!("invalid read method: {method}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reads_only_get() {
        let config = Config::default();
        assert!(config.is_read_method(&Method::GET));
        assert!(!config.is_read_method(&Method::HEAD));
        assert!(!config.is_read_method(&Method::POST));
    }

    #[test]
    fn test_builder() {
        let config = Config::default()
            .nesting(NestingMode::Flat)
            .read_method(Method::HEAD)
            .read_method(Method::HEAD)
            .primary_key("uuid")
            .default_per_page(50);

        assert_eq!(config.nesting, NestingMode::Flat);
        assert_eq!(config.read_methods, vec!["GET", "HEAD"]);
        assert!(config.is_read_method(&Method::HEAD));
        assert_eq!(config.primary_key, "uuid");
        assert_eq!(config.default_per_page, 50);
    }

    #[test]
    fn test_from_json_partial() {
        let json = r#"{"nesting": "passthrough", "read_methods": ["get", "options"]}"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.nesting, NestingMode::Passthrough);
        assert!(config.is_read_method(&Method::OPTIONS));
        assert_eq!(config.primary_key, "id");
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(matches!(
            Config::from_json(r#"{"default_per_page": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{"verbose": true}"#),
            Err(ConfigError::Json(_))
        ));
    }
}
