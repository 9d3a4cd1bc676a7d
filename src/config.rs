//! Configuration management for abstraction sessions.
//!
//! A [`Config`] is an explicit value handed to each session; nothing here is
//! read from global state after construction.

use crate::error::{AbstractionError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the remote action token.
pub const ACTION_TOKEN_ENV: &str = "ZK_ABSTRACTOR_ACTION_TOKEN";

/// Main configuration for the abstraction engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote analysis provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Sensitivity classifier configuration
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Session limits
    #[serde(default)]
    pub session: SessionConfig,

    /// Remote retry policy
    #[serde(default)]
    pub retry: RetrySettings,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Remote analysis service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the analysis service
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// AI provider name, passed through opaquely
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name, passed through opaquely
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the credential the service should use (never the key itself)
    #[serde(default = "default_api_key_name")]
    pub api_key_name: String,

    /// Action token sent in the request header
    #[serde(default, skip_serializing)]
    pub action_token: Option<String>,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    /// Delay between job status polls in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Maximum number of status polls before giving up
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

/// Sensitivity classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Extra identifiers that stay PUBLIC
    #[serde(default)]
    pub allow_list: Vec<String>,

    /// Literal texts (as written, quotes included) that stay PUBLIC
    #[serde(default)]
    pub public_literals: Vec<String>,

    /// Relax `0`, `1`, `""`, `"true"` and friends to PUBLIC
    #[serde(default)]
    pub relax_common_literals: bool,

    /// Additional credential/PII regexes
    #[serde(default)]
    pub extra_secret_patterns: Vec<String>,

    /// Business terms that make a comment PROPRIETARY (case-insensitive)
    #[serde(default)]
    pub comment_terms: Vec<String>,

    /// Treat every comment as PROPRIETARY
    #[serde(default)]
    pub redact_comments: bool,

    /// Flag high-entropy string literals as SECRET
    #[serde(default = "default_true")]
    pub entropy_detection: bool,

    /// Identifiers shorter than this stay PUBLIC (0 redacts all)
    #[serde(default)]
    pub min_identifier_length: usize,
}

/// Per-session limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum estimated tokens sent to the remote service
    #[serde(default)]
    pub token_budget: Option<usize>,

    /// Overall deadline for the remote round trip in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Retry policy for transient remote failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Backoff cap in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Down-jitter factor (0.25 = up to 25% shorter)
    #[serde(default = "default_jitter")]
    pub jitter_factor: f64,
}

/// Output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Output file path (stdout if not specified)
    pub output_path: Option<PathBuf>,
}

/// Output format enumeration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
    /// Markdown review comment with unified diffs
    Markdown,
}

// Default value functions
fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_model() -> String {
    "claude-3-5-sonnet-latest".to_string()
}

fn default_api_key_name() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    10_000
}

fn default_max_polls() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    360
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> u64 {
    500
}

fn default_max_delay() -> u64 {
    8000
}

fn default_jitter() -> f64 {
    0.25
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            provider: default_provider(),
            model: default_model(),
            api_key_name: default_api_key_name(),
            action_token: std::env::var(ACTION_TOKEN_ENV).ok(),
            timeout_secs: default_http_timeout(),
            poll_interval_ms: default_poll_interval(),
            max_polls: default_max_polls(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            allow_list: Vec::new(),
            public_literals: Vec::new(),
            relax_common_literals: false,
            extra_secret_patterns: Vec::new(),
            comment_terms: Vec::new(),
            redact_comments: false,
            entropy_detection: true,
            min_identifier_length: 0,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_budget: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            jitter_factor: default_jitter(),
        }
    }
}

impl RetrySettings {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl SessionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        if config.provider.action_token.is_none() {
            config.provider.action_token = std::env::var(ACTION_TOKEN_ENV).ok();
        }
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings no session could run with.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(AbstractionError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            return Err(AbstractionError::Config(
                "retry.jitter_factor must be within [0, 1]".to_string(),
            ));
        }
        if self.session.request_timeout_secs == 0 {
            return Err(AbstractionError::Config(
                "session.request_timeout_secs must be positive".to_string(),
            ));
        }
        url::Url::parse(&self.provider.api_url)?;
        Ok(())
    }
}

/// Builder for creating configurations programmatically.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.provider.api_url = url.into();
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.config.provider.provider = provider.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.provider.model = model.into();
        self
    }

    pub fn api_key_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider.api_key_name = name.into();
        self
    }

    pub fn action_token(mut self, token: impl Into<String>) -> Self {
        self.config.provider.action_token = Some(token.into());
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.provider.poll_interval_ms = ms;
        self
    }

    pub fn max_polls(mut self, polls: u32) -> Self {
        self.config.provider.max_polls = polls;
        self
    }

    pub fn allow_list(mut self, identifiers: Vec<String>) -> Self {
        self.config.classifier.allow_list = identifiers;
        self
    }

    pub fn relax_common_literals(mut self, relax: bool) -> Self {
        self.config.classifier.relax_common_literals = relax;
        self
    }

    pub fn extra_secret_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.classifier.extra_secret_patterns = patterns;
        self
    }

    pub fn comment_terms(mut self, terms: Vec<String>) -> Self {
        self.config.classifier.comment_terms = terms;
        self
    }

    pub fn redact_comments(mut self, redact: bool) -> Self {
        self.config.classifier.redact_comments = redact;
        self
    }

    pub fn token_budget(mut self, budget: usize) -> Self {
        self.config.session.token_budget = Some(budget);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.session.request_timeout_secs = secs;
        self
    }

    pub fn retry(mut self, retry: RetrySettings) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output.format = format;
        self
    }

    pub fn output_path(mut self, path: PathBuf) -> Self {
        self.config.output.output_path = Some(path);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.session.token_budget, None);
        assert!(config.classifier.entropy_detection);
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[provider]
provider = "openai"
model = "gpt-4o"

[classifier]
allow_list = ["Invoice"]
comment_terms = ["merger"]

[session]
token_budget = 5000
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.provider.provider, "openai");
        assert_eq!(config.provider.api_url, "http://127.0.0.1:8000");
        assert_eq!(config.classifier.allow_list, vec!["Invoice"]);
        assert_eq!(config.session.token_budget, Some(5000));
        assert_eq!(config.session.request_timeout_secs, 360);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retry]\nmax_attempts = 0").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, AbstractionError::Config(_)));
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .provider("gemini")
            .token_budget(100)
            .redact_comments(true)
            .build();
        assert_eq!(config.provider.provider, "gemini");
        assert_eq!(config.session.token_budget, Some(100));
        assert!(config.classifier.redact_comments);
    }
}
