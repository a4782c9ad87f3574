//! Configuration loading and typed config structures for the Pulse engine.
//!
//! The canonical configuration lives in `pulse-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file and applies
//! environment overrides.

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `pulse-config.yaml`. All fields have
/// defaults, so a missing file or empty document yields a working
/// standalone configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PulseConfig {
    /// HTTP and WebSocket listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis relay settings.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Token-authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Generator cadence and seeding.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl PulseConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `SERVER_HOST` / `SERVER_PORT` override the listener address
    /// - `REDIS_URL` overrides `relay.url`
    /// - `JWT_SECRET` / `AUTH_ENABLED` override the auth settings
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override settings with environment variables when set.
    ///
    /// This allows Docker Compose (or any deployment) to configure the
    /// engine via env vars without modifying the YAML config file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(&process_env);
    }

    /// Override settings from the given variable lookup.
    ///
    /// Setting process environment variables is not possible under the
    /// workspace's `unsafe_code` forbid, so the lookup is a parameter and
    /// the public entry point binds it to the process environment.
    fn apply_overrides(&mut self, env: &impl Fn(&str) -> Option<String>) {
        self.server.apply_overrides(env);
        self.relay.apply_overrides(env);
        self.auth.apply_overrides(env);
    }
}

/// Variable lookup against the process environment.
fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// HTTP and WebSocket listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Override the listener address with `SERVER_HOST` / `SERVER_PORT`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(&process_env);
    }

    fn apply_overrides(&mut self, env: &impl Fn(&str) -> Option<String>) {
        if let Some(val) = env("SERVER_HOST") {
            self.host = val;
        }
        if let Some(val) = env("SERVER_PORT") {
            // An unparseable port keeps the configured value.
            if let Ok(port) = val.parse() {
                self.port = port;
            }
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Redis relay settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// Redis (or compatible) URL.
    #[serde(default = "default_relay_url")]
    pub url: String,

    /// Pub/sub channel snapshots are relayed on.
    #[serde(default = "default_relay_channel")]
    pub channel: String,
}

impl RelayConfig {
    /// Override the Redis URL with `REDIS_URL`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(&process_env);
    }

    fn apply_overrides(&mut self, env: &impl Fn(&str) -> Option<String>) {
        if let Some(val) = env("REDIS_URL") {
            self.url = val;
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: default_relay_url(),
            channel: default_relay_channel(),
        }
    }
}

/// Token-authentication settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthConfig {
    /// Whether HTTP and WebSocket access require a signed token.
    #[serde(default)]
    pub enabled: bool,

    /// HMAC secret used to verify tokens. Development fallback;
    /// deployments set `JWT_SECRET`.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
}

impl AuthConfig {
    /// Override auth settings with `JWT_SECRET` / `AUTH_ENABLED`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(&process_env);
    }

    fn apply_overrides(&mut self, env: &impl Fn(&str) -> Option<String>) {
        if let Some(val) = env("JWT_SECRET") {
            self.jwt_secret = val;
        }
        if let Some(val) = env("AUTH_ENABLED") {
            self.enabled = val == "1" || val.eq_ignore_ascii_case("true");
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            jwt_secret: default_jwt_secret(),
        }
    }
}

/// Generator cadence and seeding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratorConfig {
    /// Milliseconds between live ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Days of history to backfill at startup.
    #[serde(default = "default_backfill_days")]
    pub backfill_days: u32,

    /// Fixed RNG seed for reproducible streams. Unset means a random
    /// seed per process.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            backfill_days: default_backfill_days(),
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_server_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_server_port() -> u16 {
    8080
}

fn default_relay_url() -> String {
    "redis://localhost:6379".to_owned()
}

fn default_relay_channel() -> String {
    "metrics_channel".to_owned()
}

fn default_jwt_secret() -> String {
    "secret".to_owned()
}

const fn default_tick_interval_ms() -> u64 {
    1_000
}

const fn default_backfill_days() -> u32 {
    7
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PulseConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.relay.url, "redis://localhost:6379");
        assert_eq!(config.relay.channel, "metrics_channel");
        assert!(!config.auth.enabled);
        assert_eq!(config.generator.tick_interval_ms, 1_000);
        assert_eq!(config.generator.backfill_days, 7);
        assert_eq!(config.generator.seed, None);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9000

relay:
  url: "redis://testhost:6379"
  channel: "pulse_test"

auth:
  enabled: true
  jwt_secret: "not-a-real-secret"

generator:
  tick_interval_ms: 250
  backfill_days: 3
  seed: 7
"#;

        let config = PulseConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_else(PulseConfig::default);

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.relay.url, "redis://testhost:6379");
        assert_eq!(config.relay.channel, "pulse_test");
        assert!(config.auth.enabled);
        assert_eq!(config.generator.tick_interval_ms, 250);
        assert_eq!(config.generator.backfill_days, 3);
        assert_eq!(config.generator.seed, Some(7));
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "server:\n  port: 9999\n";
        let config = PulseConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_else(PulseConfig::default);

        // Port is overridden
        assert_eq!(config.server.port, 9999);
        // Everything else uses defaults
        assert_eq!(config.relay.channel, "metrics_channel");
        assert_eq!(config.generator.backfill_days, 7);
    }

    #[test]
    fn parse_empty_yaml() {
        let yaml = "";
        let config = PulseConfig::parse(yaml);
        assert!(config.is_ok());
    }

    fn fake_env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned())
        }
    }

    #[test]
    fn env_overrides_win_over_yaml_values() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9000

relay:
  url: "redis://testhost:6379"
  channel: "pulse_test"

auth:
  enabled: false
  jwt_secret: "file-secret"
"#;
        // Deserialized directly so the process environment never
        // participates in this test.
        let mut config: PulseConfig =
            serde_yml::from_str(yaml).ok().unwrap_or_else(PulseConfig::default);

        config.apply_overrides(&fake_env(&[
            ("SERVER_HOST", "10.0.0.5"),
            ("SERVER_PORT", "7070"),
            ("REDIS_URL", "redis://override:6380"),
            ("JWT_SECRET", "env-secret"),
            ("AUTH_ENABLED", "true"),
        ]));

        assert_eq!(config.server.host, "10.0.0.5");
        assert_eq!(config.server.port, 7070);
        assert_eq!(config.relay.url, "redis://override:6380");
        assert_eq!(config.auth.jwt_secret, "env-secret");
        assert!(config.auth.enabled);
        // No override variable touches the channel.
        assert_eq!(config.relay.channel, "pulse_test");
    }

    #[test]
    fn unset_variables_leave_configured_values_alone() {
        let mut config = PulseConfig::default();
        config.server.host = "127.0.0.1".to_owned();

        config.apply_overrides(&fake_env(&[]));

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.relay.url, "redis://localhost:6379");
    }

    #[test]
    fn unparseable_port_override_is_ignored() {
        let mut config = PulseConfig::default();
        config.apply_overrides(&fake_env(&[("SERVER_PORT", "not-a-port")]));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn auth_enabled_override_accepts_one_and_true_forms() {
        let mut config = PulseConfig::default();

        config.apply_overrides(&fake_env(&[("AUTH_ENABLED", "1")]));
        assert!(config.auth.enabled);

        config.apply_overrides(&fake_env(&[("AUTH_ENABLED", "TRUE")]));
        assert!(config.auth.enabled);

        config.apply_overrides(&fake_env(&[("AUTH_ENABLED", "no")]));
        assert!(!config.auth.enabled);
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("pulse-config.yaml");
        if path.exists() {
            let config = PulseConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
