//! Service settings: defaults, TOML file, `.env` file, environment.
//!
//! Each struct implements `Default` with the values a docker-compose
//! deployment expects, so the service starts with no configuration at all.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use super::defaults::{self, env};
use super::validation::{self, ValidationWarning};

// ============================================================================
// Top-Level Settings
// ============================================================================

/// Resolved, validated settings. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: AppSettings,

    #[serde(default)]
    pub server: ServerSettings,

    /// Neo4j connection
    #[serde(default)]
    pub graph: GraphSettings,

    /// Qdrant connection
    #[serde(default)]
    pub vector: VectorSettings,

    /// Redis connection
    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub timeouts: TimeoutSettings,
}

/// Where settings come from, besides the process environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// TOML settings file
    pub file: Option<PathBuf>,
    /// Dotenv file; its values sit below real environment variables
    pub env_file: Option<PathBuf>,
}

impl ConfigSources {
    /// Use the given paths, falling back to `./graphrag.toml` and `./.env`
    /// when they exist in the working directory.
    pub fn discover(file: Option<PathBuf>, env_file: Option<PathBuf>) -> Self {
        let local = |name: &str| {
            let p = PathBuf::from(name);
            p.exists().then_some(p)
        };
        Self {
            file: file.or_else(|| local(defaults::CONFIG_FILE)),
            env_file: env_file.or_else(|| local(defaults::ENV_FILE)),
        }
    }
}

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    /// Unknown keys found in the TOML file
    pub warnings: Vec<ValidationWarning>,
    /// The TOML file that was read, if any
    pub file: Option<PathBuf>,
    /// The dotenv file that was read, if any
    pub env_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the given sources and the process environment.
    ///
    /// Precedence, lowest first: defaults, TOML file, `.env` file, environment.
    pub fn load(sources: &ConfigSources) -> Result<LoadedSettings, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(sources, &vars)
    }

    /// Same as [`Settings::load`] with an explicit environment map.
    pub fn load_from(
        sources: &ConfigSources,
        vars: &HashMap<String, String>,
    ) -> Result<LoadedSettings, ConfigError> {
        let (mut settings, warnings) = match &sources.file {
            Some(path) => Self::read_file(path)?,
            None => (Self::default(), Vec::new()),
        };

        let mut merged = match &sources.env_file {
            Some(path) => read_env_file(path)?,
            None => HashMap::new(),
        };
        merged.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));

        settings.apply_env(&merged)?;
        settings.validate()?;

        Ok(LoadedSettings {
            settings,
            warnings,
            file: sources.file.clone(),
            env_file: sources.env_file.clone(),
        })
    }

    /// Parse a TOML file without applying the environment or validating.
    pub fn read_file(path: &Path) -> Result<(Self, Vec<ValidationWarning>), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let warnings = validation::validate_unknown_keys(&contents);
        let settings: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        Ok((settings, warnings))
    }

    /// Overlay environment variables onto the current values.
    ///
    /// Empty values clear optional fields and are ignored for required ones.
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<(), ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        if let Some(v) = get(env::ENVIRONMENT) {
            self.app.environment = v.to_string();
        }
        if let Some(v) = get(env::LOG_LEVEL) {
            self.app.log_level = v.to_string();
        }
        if let Some(v) = parse_env::<LogFormat>(vars, env::LOG_FORMAT)? {
            self.app.log_format = v;
        }
        if vars.contains_key(env::FRONTEND_DOMAIN) {
            self.app.frontend_domain = get(env::FRONTEND_DOMAIN).map(str::to_string);
        }
        if let Some(v) = parse_env_bool(vars, env::EXPOSE_CONFIG)? {
            self.app.expose_config = Some(v);
        }

        if let Some(v) = get(env::SERVER_ADDR) {
            self.server.addr = v.to_string();
        }

        if let Some(v) = get(env::NEO4J_URL) {
            self.graph.url = v.to_string();
        }
        if let Some(v) = get(env::NEO4J_USERNAME) {
            self.graph.username = v.to_string();
        }
        if let Some(v) = vars.get(env::NEO4J_PASSWORD) {
            self.graph.password.clone_from(v);
        }

        if let Some(v) = get(env::QDRANT_URL) {
            self.vector.url = v.to_string();
        }
        if vars.contains_key(env::QDRANT_API_KEY) {
            self.vector.api_key = get(env::QDRANT_API_KEY).map(str::to_string);
        }

        if let Some(v) = get(env::REDIS_URL) {
            self.cache.url = v.to_string();
        }

        if let Some(v) = parse_env::<u64>(vars, env::CONNECT_TIMEOUT_SECS)? {
            self.timeouts.connect_secs = v;
        }
        if let Some(v) = parse_env::<u64>(vars, env::PROBE_TIMEOUT_SECS)? {
            self.timeouts.probe_secs = v;
        }

        Ok(())
    }

    /// Validate the resolved settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = validation::validate_settings(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Whether `GET /config` may serve these settings.
    ///
    /// An explicit `expose_config` wins; otherwise only development exposes it.
    pub fn config_endpoint_enabled(&self) -> bool {
        self.app
            .expose_config
            .unwrap_or_else(|| self.is_development())
    }

    pub fn is_development(&self) -> bool {
        self.app
            .environment
            .eq_ignore_ascii_case(defaults::DEVELOPMENT_ENVIRONMENT)
    }

    /// Copy with passwords and API keys replaced by a placeholder.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.graph.password.is_empty() {
            copy.graph.password = defaults::REDACTED.to_string();
        }
        if copy.vector.api_key.is_some() {
            copy.vector.api_key = Some(defaults::REDACTED.to_string());
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let iter = dotenvy::from_path_iter(path)
        .map_err(|e| ConfigError::EnvFile(path.to_path_buf(), e))?;
    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| ConfigError::EnvFile(path.to_path_buf(), e))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

fn parse_env<T: FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn parse_env_bool(vars: &HashMap<String, String>, key: &str) -> Result<Option<bool>, ConfigError> {
    match vars.get(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => Ok(Some(true)),
        Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => Ok(Some(false)),
        Some(v) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: v,
        }),
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("env file error ({}): {}", .0.display(), .1)]
    EnvFile(PathBuf, #[source] dotenvy::Error),
    #[error("config serialization error: {0}")]
    Serialize(#[source] toml::ser::Error),
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
    #[error("config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Deployment name echoed in health reports ("development", "production", ...)
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Only origin allowed by CORS. Any origin when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_domain: Option<String>,

    /// Serve `GET /config`. Defaults to on in development only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose_config: Option<bool>,
}

fn default_environment() -> String {
    defaults::ENVIRONMENT.to_string()
}
fn default_log_level() -> String {
    defaults::LOG_LEVEL.to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            frontend_domain: None,
            expose_config: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSettings {
    #[serde(default = "default_graph_url")]
    pub url: String,
    #[serde(default = "default_graph_username")]
    pub username: String,
    #[serde(default = "default_graph_password")]
    pub password: String,
}

fn default_graph_url() -> String {
    defaults::GRAPH_URL.to_string()
}
fn default_graph_username() -> String {
    defaults::GRAPH_USERNAME.to_string()
}
fn default_graph_password() -> String {
    defaults::GRAPH_PASSWORD.to_string()
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            url: default_graph_url(),
            username: default_graph_username(),
            password: default_graph_password(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorSettings {
    #[serde(default = "default_vector_url")]
    pub url: String,
    /// Sent as the `api-key` header when set
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_vector_url() -> String {
    defaults::VECTOR_URL.to_string()
}

impl Default for VectorSettings {
    fn default() -> Self {
        Self {
            url: default_vector_url(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_url")]
    pub url: String,
}

fn default_cache_url() -> String {
    defaults::CACHE_URL.to_string()
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            url: default_cache_url(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_connect_secs")]
    pub connect_secs: u64,
    #[serde(default = "default_probe_secs")]
    pub probe_secs: u64,
}

const fn default_connect_secs() -> u64 {
    defaults::CONNECT_TIMEOUT_SECS
}
const fn default_probe_secs() -> u64 {
    defaults::PROBE_TIMEOUT_SECS
}

impl TimeoutSettings {
    pub const fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub const fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            connect_secs: default_connect_secs(),
            probe_secs: default_probe_secs(),
        }
    }
}
