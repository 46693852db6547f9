//! Config validation: unknown-key detection with Levenshtein suggestions
//! and structural checks on the resolved settings.
//!
//! Unknown keys only warn. Everything in [`validate_settings`] is fatal:
//! the caller turns a non-empty error list into `ConfigError::Validation`.

use std::collections::HashSet;
use std::net::SocketAddr;

use super::settings::Settings;

/// A non-fatal config warning (typo, unknown section).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path in the TOML file.
///
/// Keep in sync with the structs in `settings.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [app]
        "app",
        "app.environment",
        "app.log_level",
        "app.log_format",
        "app.frontend_domain",
        "app.expose_config",
        // [server]
        "server",
        "server.addr",
        // [graph]
        "graph",
        "graph.url",
        "graph.username",
        "graph.password",
        // [vector]
        "vector",
        "vector.url",
        "vector.api_key",
        // [cache]
        "cache",
        "cache.url",
        // [timeouts]
        "timeouts",
        "timeouts.connect_secs",
        "timeouts.probe_secs",
    ];
    keys.iter().copied().collect()
}

/// Collect every dotted key path present in a parsed TOML document.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Closest known key within edit distance 3. Ties go to the
/// lexicographically smaller key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

/// Warn about keys that no settings field will ever read.
///
/// Parse errors are ignored here; serde reports them with a better message.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Structural Checks
// ============================================================================

/// Log levels accepted in `LOG_LEVEL`, including the Python-style names
/// existing deployments already use.
pub const LOG_LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARN", "WARNING", "ERROR", "CRITICAL"];

const GRAPH_SCHEMES: &[&str] = &["neo4j", "neo4j+s", "neo4j+ssc", "bolt", "bolt+s", "bolt+ssc"];
const VECTOR_SCHEMES: &[&str] = &["http", "https"];
const CACHE_SCHEMES: &[&str] = &["redis", "rediss", "unix"];

/// Check the resolved settings. Returns every problem found, not just the first.
pub fn validate_settings(settings: &Settings) -> Vec<String> {
    let mut errors = Vec::new();

    if settings.app.environment.trim().is_empty() {
        errors.push("app.environment must not be empty".to_string());
    }

    if !is_known_log_level(&settings.app.log_level) {
        errors.push(format!(
            "app.log_level '{}' is not one of {}",
            settings.app.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if let Some(origin) = &settings.app.frontend_domain {
        match reqwest::Url::parse(origin) {
            Ok(url) if url.has_host() => {}
            _ => errors.push(format!(
                "app.frontend_domain '{origin}' is not a valid origin (expected e.g. https://app.example.com)"
            )),
        }
    }

    if settings.server.addr.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "server.addr '{}' is not a valid socket address",
            settings.server.addr
        ));
    }

    check_url_scheme("graph.url", &settings.graph.url, GRAPH_SCHEMES, &mut errors);
    check_url_scheme("vector.url", &settings.vector.url, VECTOR_SCHEMES, &mut errors);
    check_url_scheme("cache.url", &settings.cache.url, CACHE_SCHEMES, &mut errors);

    if settings.graph.username.is_empty() {
        errors.push("graph.username must not be empty".to_string());
    }

    if settings.timeouts.connect_secs == 0 {
        errors.push("timeouts.connect_secs must be > 0".to_string());
    }
    if settings.timeouts.probe_secs == 0 {
        errors.push("timeouts.probe_secs must be > 0".to_string());
    }

    errors
}

pub fn is_known_log_level(level: &str) -> bool {
    LOG_LEVELS.iter().any(|l| l.eq_ignore_ascii_case(level.trim()))
}

fn check_url_scheme(field: &str, value: &str, allowed: &[&str], errors: &mut Vec<String>) {
    match reqwest::Url::parse(value) {
        Ok(url) if allowed.contains(&url.scheme()) => {}
        Ok(url) => errors.push(format!(
            "{field} scheme '{}' is not supported (expected one of {})",
            url.scheme(),
            allowed.join(", ")
        )),
        Err(e) => errors.push(format!("{field} '{value}' is not a valid URL: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("graph.usename", "graph.username"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [graph]
            url = "bolt://localhost:7687"
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"graph".to_string()));
        assert!(keys.contains(&"graph.url".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys("[cache]\nulr = \"redis://localhost\"\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "cache.ulr");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("cache.url"));
    }

    #[test]
    fn test_unrelated_key_has_no_suggestion() {
        let warnings = validate_unknown_keys("[observability]\nexporter = \"otlp\"\n");
        assert!(!warnings.is_empty());
        assert!(warnings.iter().all(|w| w.suggestion.is_none()));
    }

    #[test]
    fn test_default_settings_pass_validation() {
        assert!(validate_settings(&Settings::default()).is_empty());
    }

    #[test]
    fn test_python_style_log_levels_are_accepted() {
        assert!(is_known_log_level("warning"));
        assert!(is_known_log_level("CRITICAL"));
        assert!(!is_known_log_level("VERBOSE"));
    }

    #[test]
    fn test_wrong_schemes_are_rejected() {
        let mut settings = Settings::default();
        settings.graph.url = "http://neo4j:7474".to_string();
        settings.cache.url = "memcached://cache:11211".to_string();
        let errors = validate_settings(&settings);
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].starts_with("graph.url"));
        assert!(errors[1].starts_with("cache.url"));
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        let mut settings = Settings::default();
        settings.timeouts.connect_secs = 0;
        settings.timeouts.probe_secs = 0;
        assert_eq!(validate_settings(&settings).len(), 2);
    }
}
