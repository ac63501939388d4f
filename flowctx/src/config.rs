//! Configuration for queues, providers and logging.

use crate::errors::{FlowError, FlowResult};
use crate::request::claim_types;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding the queue capacity.
pub const ENV_QUEUE_CAPACITY: &str = "FLOWCTX_QUEUE_CAPACITY";
/// Environment variable overriding the log filter.
pub const ENV_LOG_FILTER: &str = "FLOWCTX_LOG";
/// Environment variable switching JSON log output on ("1"/"true").
pub const ENV_LOG_JSON: &str = "FLOWCTX_LOG_JSON";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Work queue settings.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Request provider settings.
    #[serde(default)]
    pub providers: ProviderConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FlowConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the queue configuration.
    #[must_use]
    pub fn with_queue(mut self, queue: QueueConfig) -> Self {
        self.queue = queue;
        self
    }

    /// Sets the provider configuration.
    #[must_use]
    pub fn with_providers(mut self, providers: ProviderConfig) -> Self {
        self.providers = providers;
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Parses a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the document is malformed or fails validation.
    pub fn from_json_str(json: &str) -> FlowResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| FlowError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FlowError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&contents)
    }

    /// Builds a configuration from defaults and `FLOWCTX_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a variable holds an unparsable value.
    pub fn from_env() -> FlowResult<Self> {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a variable holds an unparsable value.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> FlowResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_QUEUE_CAPACITY) {
            self.queue.capacity = raw.trim().parse().map_err(|_| {
                FlowError::Config(format!("{ENV_QUEUE_CAPACITY} must be a positive integer, got `{raw}`"))
            })?;
        }
        if let Some(filter) = lookup(ENV_LOG_FILTER) {
            self.logging.filter = filter;
        }
        if let Some(raw) = lookup(ENV_LOG_JSON) {
            self.logging.json = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns `Config` describing the first violation.
    pub fn validate(&self) -> FlowResult<()> {
        if self.queue.capacity == 0 {
            return Err(FlowError::Config("queue.capacity must be at least 1".to_string()));
        }
        if self.providers.subject_claim.trim().is_empty() || self.providers.tenant_claim.trim().is_empty() {
            return Err(FlowError::Config("claim types must not be blank".to_string()));
        }
        Ok(())
    }
}

/// Work queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Name used in logs and errors.
    #[serde(default = "default_queue_name")]
    pub name: String,
    /// Maximum number of resident items.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_queue_name() -> String {
    "background".to_string()
}

fn default_capacity() -> usize {
    100
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: default_queue_name(),
            capacity: default_capacity(),
        }
    }
}

impl QueueConfig {
    /// Creates a queue configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the queue name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Provider chain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Priority of the inbound request provider.
    #[serde(default = "default_inbound_priority")]
    pub inbound_priority: i32,
    /// Priority of the synthetic provider.
    #[serde(default = "default_synthetic_priority")]
    pub synthetic_priority: i32,
    /// Claim type carrying the user id.
    #[serde(default = "default_subject_claim")]
    pub subject_claim: String,
    /// Claim type carrying the tenant id.
    #[serde(default = "default_tenant_claim")]
    pub tenant_claim: String,
    /// Header consulted when the tenant claim is missing.
    #[serde(default = "default_tenant_header")]
    pub tenant_header: String,
    /// Authentication type stamped on synthetic principals.
    #[serde(default = "default_authentication_type")]
    pub authentication_type: String,
}

fn default_inbound_priority() -> i32 {
    0
}

fn default_synthetic_priority() -> i32 {
    10
}

fn default_subject_claim() -> String {
    claim_types::SUBJECT.to_string()
}

fn default_tenant_claim() -> String {
    claim_types::TENANT.to_string()
}

fn default_tenant_header() -> String {
    "X-Tenant-Id".to_string()
}

fn default_authentication_type() -> String {
    "BackgroundService".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            inbound_priority: default_inbound_priority(),
            synthetic_priority: default_synthetic_priority(),
            subject_claim: default_subject_claim(),
            tenant_claim: default_tenant_claim(),
            tenant_header: default_tenant_header(),
            authentication_type: default_authentication_type(),
        }
    }
}

impl ProviderConfig {
    /// Sets the tenant claim type.
    #[must_use]
    pub fn with_tenant_claim(mut self, claim: impl Into<String>) -> Self {
        self.tenant_claim = claim.into();
        self
    }

    /// Sets the subject claim type.
    #[must_use]
    pub fn with_subject_claim(mut self, claim: impl Into<String>) -> Self {
        self.subject_claim = claim.into();
        self
    }

    /// Sets the tenant header name.
    #[must_use]
    pub fn with_tenant_header(mut self, header: impl Into<String>) -> Self {
        self.tenant_header = header.into();
        self
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive string.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = FlowConfig::default();
        assert_eq!(config.queue.capacity, 100);
        assert_eq!(config.providers.inbound_priority, 0);
        assert_eq!(config.providers.synthetic_priority, 10);
        assert_eq!(config.providers.tenant_claim, "tenant_id");
        assert_eq!(config.logging.filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = FlowConfig::from_json_str(r#"{"queue": {"capacity": 8}}"#).unwrap();
        assert_eq!(config.queue.capacity, 8);
        assert_eq!(config.queue.name, "background");
        assert_eq!(config.providers, ProviderConfig::default());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = FlowConfig::from_json_str(r#"{"queue": {"capacity": 0}}"#).unwrap_err();
        assert!(matches!(err, FlowError::Config(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(FlowConfig::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_QUEUE_CAPACITY, "16"),
            (ENV_LOG_FILTER, "flowctx=debug"),
            (ENV_LOG_JSON, "true"),
        ]
        .into_iter()
        .collect();

        let config = FlowConfig::default()
            .with_env_overrides(|name| vars.get(name).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.queue.capacity, 16);
        assert_eq!(config.logging.filter, "flowctx=debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_env_override_bad_capacity() {
        let err = FlowConfig::default()
            .with_env_overrides(|name| (name == ENV_QUEUE_CAPACITY).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_QUEUE_CAPACITY));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"providers": {{"tenant_claim": "tid"}}}}"#).unwrap();

        let config = FlowConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.providers.tenant_claim, "tid");
    }

    #[test]
    fn test_missing_file() {
        let err = FlowConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, FlowError::Config(_)));
    }
}
