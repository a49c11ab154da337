//! Configuration
//!
//! [`SynapseConfig`] is read from a TOML file and then overridden from the
//! environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `GEMINI_API_KEY` | `backend.api_key` |
//! | `SYNAPSE_MODEL` | `backend.model` |
//! | `SYNAPSE_TIMEOUT_SECS` | `backend.timeout_secs` |
//! | `SYNAPSE_OUTPUT_DIR` | `output.output_root` |
//! | `SYNAPSE_ARCHIVE_PATH` | `output.archive_path` |
//! | `GITHUB_TOKEN` | `publisher.token` |
//!
//! Secrets are never serialized and print as `***` in `Debug` output.

use crate::backend::GenerationParams;
use crate::error::ConfigError;
use crate::redact::Redactor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use synapse_workspace::OutputLayout;

/// Credential that must not leak into logs or serialized config
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a credential
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value, for building requests only
    #[inline]
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the value is empty or whitespace
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

/// Generative backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// API base, without trailing `/models`
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// API key
    #[serde(skip_serializing)]
    pub api_key: Option<Secret>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Planner request parameters
    pub planning: GenerationParams,
    /// Project generation parameters
    pub generation: GenerationParams,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key: None,
            timeout_secs: 120,
            planning: GenerationParams::planning(),
            generation: GenerationParams::project(),
        }
    }
}

impl BackendConfig {
    /// With endpoint
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// With API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(key));
        self
    }

    /// With timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory generated files are written into (wiped each run)
    pub output_root: PathBuf,
    /// Archive destination, outside the output root
    pub archive_path: PathBuf,
    /// Maximum concurrent file writes
    pub write_concurrency: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("generated_project"),
            archive_path: PathBuf::from("generated_project.zip"),
            write_concurrency: 8,
        }
    }
}

impl OutputConfig {
    /// With output root and archive path
    #[inline]
    #[must_use]
    pub fn with_paths(mut self, output_root: impl Into<PathBuf>, archive: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self.archive_path = archive.into();
        self
    }
}

/// Repository publisher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// REST API base
    pub api_base: String,
    /// Repository owner; resolved from the token when unset
    pub owner: Option<String>,
    /// Access token
    #[serde(skip_serializing)]
    pub token: Option<Secret>,
    /// Label attached to created issues
    pub issue_label: String,
    /// Create new repositories as private
    pub private: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            owner: None,
            token: None,
            issue_label: "synapse-generated".to_string(),
            private: false,
            timeout_secs: 30,
        }
    }
}

impl PublisherConfig {
    /// With API base
    #[inline]
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// With token
    #[inline]
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Secret::new(token));
        self
    }

    /// With owner
    #[inline]
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynapseConfig {
    /// Generative backend
    pub backend: BackendConfig,
    /// Output locations
    pub output: OutputConfig,
    /// Publisher, if publishing is used
    pub publisher: Option<PublisherConfig>,
}

impl SynapseConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With backend settings
    #[inline]
    #[must_use]
    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    /// With output settings
    #[inline]
    #[must_use]
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    /// With publisher settings
    #[inline]
    #[must_use]
    pub fn with_publisher(mut self, publisher: PublisherConfig) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Parse TOML
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` on invalid TOML
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from an optional file, apply environment overrides and validate
    ///
    /// # Errors
    /// - `ConfigError::Io` / `ConfigError::Parse` for an unreadable file
    /// - `ConfigError::InvalidEnv` for a malformed override
    /// - `ConfigError::Invalid` if validation fails
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::io_error(path, e))?;
                tracing::debug!(path = %path.display(), "Loaded config file");
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        let config = config.apply_env_from(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidEnv` if `SYNAPSE_TIMEOUT_SECS` is not an integer
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY") {
            self.backend.api_key = Some(Secret::new(key));
        }
        if let Some(model) = non_empty("SYNAPSE_MODEL") {
            self.backend.model = model;
        }
        if let Some(value) = non_empty("SYNAPSE_TIMEOUT_SECS") {
            self.backend.timeout_secs =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    var: "SYNAPSE_TIMEOUT_SECS",
                    value,
                })?;
        }
        if let Some(dir) = non_empty("SYNAPSE_OUTPUT_DIR") {
            self.output.output_root = PathBuf::from(dir);
        }
        if let Some(path) = non_empty("SYNAPSE_ARCHIVE_PATH") {
            self.output.archive_path = PathBuf::from(path);
        }
        if let Some(token) = non_empty("GITHUB_TOKEN") {
            self.publisher
                .get_or_insert_with(PublisherConfig::default)
                .token = Some(Secret::new(token));
        }
        Ok(self)
    }

    /// Check values are usable
    ///
    /// A missing API key is not an error here: commands that never call the
    /// backend do not need one.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` describing the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.endpoint is empty".into()));
        }
        if self.backend.model.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.model is empty".into()));
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid("backend.timeout_secs must be positive".into()));
        }
        if self.output.write_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "output.write_concurrency must be positive".into(),
            ));
        }
        if self.output.output_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output.output_root is empty".into()));
        }
        OutputLayout::new(&self.output.output_root, &self.output.archive_path)
            .map_err(|e| ConfigError::Invalid(format!("output: {e}")))?;
        if let Some(publisher) = &self.publisher {
            if publisher.api_base.trim().is_empty() {
                return Err(ConfigError::Invalid("publisher.api_base is empty".into()));
            }
            if publisher.timeout_secs == 0 {
                return Err(ConfigError::Invalid(
                    "publisher.timeout_secs must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    /// Redactor that masks every configured secret
    #[must_use]
    pub fn redactor(&self) -> Redactor {
        let mut redactor = Redactor::new();
        if let Some(key) = &self.backend.api_key {
            redactor = redactor.with_secret(key.expose());
        }
        if let Some(token) = self.publisher.as_ref().and_then(|p| p.token.as_ref()) {
            redactor = redactor.with_secret(token.expose());
        }
        redactor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = SynapseConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.timeout_secs, 120);
        assert_eq!(config.output.output_root, PathBuf::from("generated_project"));
        assert!(config.publisher.is_none());
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let config = SynapseConfig::from_toml_str(
            r#"
            [backend]
            model = "gemini-pro"
            timeout_secs = 30

            [backend.generation]
            max_output_tokens = 4096

            [output]
            output_root = "out/project"
            archive_path = "out/project.zip"

            [publisher]
            owner = "octocat"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.model, "gemini-pro");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.backend.generation.max_output_tokens, 4096);
        assert_eq!(config.backend.generation.top_p, 0.9);
        assert_eq!(config.output.write_concurrency, 8);
        let publisher = config.publisher.unwrap();
        assert_eq!(publisher.owner.as_deref(), Some("octocat"));
        assert_eq!(publisher.issue_label, "synapse-generated");
    }

    #[test]
    fn env_overrides_file_values() {
        let config = SynapseConfig::new()
            .apply_env_from(env(&[
                ("GEMINI_API_KEY", "gem-key-123"),
                ("GITHUB_TOKEN", "gh-token-456"),
                ("SYNAPSE_OUTPUT_DIR", "/tmp/synapse/out"),
                ("SYNAPSE_TIMEOUT_SECS", " 45 "),
            ]))
            .unwrap();

        assert_eq!(config.backend.api_key.as_ref().unwrap().expose(), "gem-key-123");
        assert_eq!(config.backend.timeout_secs, 45);
        assert_eq!(config.output.output_root, PathBuf::from("/tmp/synapse/out"));
        let token = config.publisher.as_ref().unwrap().token.as_ref().unwrap();
        assert_eq!(token.expose(), "gh-token-456");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let config = SynapseConfig::new()
            .apply_env_from(env(&[("SYNAPSE_MODEL", "  ")]))
            .unwrap();
        assert_eq!(config.backend.model, "gemini-1.5-flash");
    }

    #[test]
    fn bad_timeout_env_is_rejected() {
        let result = SynapseConfig::new().apply_env_from(env(&[("SYNAPSE_TIMEOUT_SECS", "soon")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { var: "SYNAPSE_TIMEOUT_SECS", .. })
        ));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let zero_timeout =
            SynapseConfig::new().with_backend(BackendConfig::default().with_timeout_secs(0));
        assert!(zero_timeout.validate().is_err());

        let nested_archive = SynapseConfig::new().with_output(
            OutputConfig::default().with_paths("out", "out/project.zip"),
        );
        assert!(nested_archive.validate().is_err());

        let dotted_archive = SynapseConfig::new().with_output(
            OutputConfig::default().with_paths("out", "x/../out/project.zip"),
        );
        assert!(dotted_archive.validate().is_err());

        let blank_endpoint =
            SynapseConfig::new().with_backend(BackendConfig::default().with_endpoint(" "));
        assert!(blank_endpoint.validate().is_err());
    }

    #[test]
    fn secrets_do_not_leak() {
        let config = SynapseConfig::new()
            .with_backend(BackendConfig::default().with_api_key("gem-key-123"))
            .with_publisher(PublisherConfig::default().with_token("gh-token-456"));

        let debug = format!("{config:?}");
        assert!(!debug.contains("gem-key-123"));
        assert!(!debug.contains("gh-token-456"));

        let serialized = toml::to_string(&config).unwrap();
        assert!(!serialized.contains("gem-key-123"));
        assert!(!serialized.contains("gh-token-456"));

        let redacted = config.redactor().redact("key gem-key-123 token gh-token-456");
        assert_eq!(redacted, "key [REDACTED] token [REDACTED]");
    }
}
