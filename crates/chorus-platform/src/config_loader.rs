//! Configuration file discovery and loading.
//!
//! The discovery order is:
//! 1. `CHORUS_CONFIG` environment variable (absolute path).
//! 2. `~/.chorus/config.json`
//! 3. If none found, return an empty JSON object (`{}`).
//!
//! JSON keys are normalized from camelCase to snake_case before returning,
//! so the typed [`Config`](chorus_types::config::Config) only has to know
//! one spelling.

use std::path::{Path, PathBuf};

use serde_json::Value;

use chorus_types::config::Config;
use chorus_types::{ChorusError, Result};

use crate::env::Environment;
use crate::fs::FileSystem;

/// Environment variable that overrides config discovery.
pub const CONFIG_ENV_VAR: &str = "CHORUS_CONFIG";

/// Discover the config file path.
///
/// Returns `None` if no config file exists at any of the candidate
/// locations. The environment variable is returned without an existence
/// check so a typo surfaces as a warning at load time instead of being
/// silently skipped.
pub fn discover_config_path(env: &dyn Environment, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(env_path) = env.get_var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(env_path));
    }

    let path = home_dir?.join(".chorus").join("config.json");
    path.exists().then_some(path)
}

/// Load raw JSON configuration using the discovery algorithm.
///
/// Returns the parsed and key-normalized JSON value. If no config file is
/// found, returns an empty JSON object.
pub async fn load_config_raw(fs: &dyn FileSystem, env: &dyn Environment) -> Result<Value> {
    let Some(path) = discover_config_path(env, fs.home_dir()) else {
        tracing::info!("no config file found, using defaults");
        return Ok(Value::Object(serde_json::Map::new()));
    };

    if !fs.exists(&path).await {
        tracing::warn!(
            path = %path.display(),
            "config path does not exist, using defaults"
        );
        return Ok(Value::Object(serde_json::Map::new()));
    }

    read_config_file(fs, &path).await
}

/// Read, parse and normalize one config file.
pub async fn read_config_file(fs: &dyn FileSystem, path: &Path) -> Result<Value> {
    tracing::debug!(path = %path.display(), "loading config file");
    let contents = fs.read_to_string(path).await?;
    let value: Value =
        serde_json::from_str(&contents).map_err(|e| ChorusError::ConfigInvalid {
            reason: format!("failed to parse {}: {e}", path.display()),
        })?;
    Ok(normalize_keys(value))
}

/// Load a typed, validated [`Config`].
///
/// `config_override` takes precedence over discovery and must exist.
pub async fn load_config(
    fs: &dyn FileSystem,
    env: &dyn Environment,
    config_override: Option<&Path>,
) -> Result<Config> {
    let raw = match config_override {
        Some(path) => {
            if !fs.exists(path).await {
                return Err(ChorusError::ConfigInvalid {
                    reason: format!("config file not found: {}", path.display()),
                });
            }
            read_config_file(fs, path).await?
        }
        None => load_config_raw(fs, env).await?,
    };

    let config: Config = serde_json::from_value(raw)?;
    config.validate()?;
    Ok(config)
}

/// Convert camelCase JSON keys to snake_case recursively.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| (camel_to_snake(&key), normalize_keys(val)))
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Convert a single camelCase string to snake_case.
///
/// A run of uppercase letters like `"HTML"` is kept together, with an
/// underscore inserted only before the last uppercase letter if it is
/// followed by a lowercase letter.
///
/// # Examples
/// ```
/// # use chorus_platform::config_loader::camel_to_snake;
/// assert_eq!(camel_to_snake("continuationTimeoutSecs"), "continuation_timeout_secs");
/// assert_eq!(camel_to_snake("already_snake"), "already_snake");
/// assert_eq!(camel_to_snake("HTMLParser"), "html_parser");
/// ```
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            if prev.is_lowercase()
                || (prev.is_uppercase() && next.is_some_and(|c| c.is_lowercase()))
            {
                result.push('_');
            }
        }
        result.push(ch.to_ascii_lowercase());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::NativeFileSystem;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_path(prefix: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let pid = std::process::id();
        std::env::temp_dir().join(format!("chorus_cfg_{prefix}_{pid}_{id}.json"))
    }

    struct MockEnv {
        vars: HashMap<String, String>,
    }

    impl MockEnv {
        fn new() -> Self {
            Self {
                vars: HashMap::new(),
            }
        }

        fn with_var(mut self, key: &str, value: &str) -> Self {
            self.vars.insert(key.to_string(), value.to_string());
            self
        }
    }

    impl Environment for MockEnv {
        fn get_var(&self, name: &str) -> Option<String> {
            self.vars.get(name).cloned()
        }
    }

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("parallelScoring"), "parallel_scoring");
        assert_eq!(camel_to_snake("getHTMLParser"), "get_html_parser");
        assert_eq!(camel_to_snake("Config"), "config");
        assert_eq!(camel_to_snake(""), "");
    }

    #[test]
    fn test_normalize_keys_nested_and_arrays() {
        let input = json!({
            "telephone": {
                "confirmBeforeCall": true,
                "contacts": [{"name": "Ann", "numbers": ["1"]}]
            }
        });
        let expected = json!({
            "telephone": {
                "confirm_before_call": true,
                "contacts": [{"name": "Ann", "numbers": ["1"]}]
            }
        });
        assert_eq!(normalize_keys(input), expected);
    }

    #[test]
    fn test_normalize_keys_primitives_unchanged() {
        assert_eq!(normalize_keys(json!(42)), json!(42));
        assert_eq!(normalize_keys(json!("someValue")), json!("someValue"));
    }

    #[test]
    fn test_discover_env_var_takes_precedence() {
        let env = MockEnv::new().with_var(CONFIG_ENV_VAR, "/custom/config.json");
        let result = discover_config_path(&env, Some(PathBuf::from("/home/user")));
        assert_eq!(result, Some(PathBuf::from("/custom/config.json")));
    }

    #[test]
    fn test_discover_no_home_no_env() {
        assert_eq!(discover_config_path(&MockEnv::new(), None), None);
    }

    #[test]
    fn test_discover_home_without_file() {
        let result = discover_config_path(
            &MockEnv::new(),
            Some(PathBuf::from("/tmp/chorus_test_nonexistent_home")),
        );
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_load_config_from_override() {
        let fs = NativeFileSystem;
        let path = temp_path("override");
        fs.write_string(
            &path,
            r#"{"locale": {"language": "it"}, "dispatch": {"executionTimeoutSecs": 3}}"#,
        )
        .await
        .unwrap();

        let cfg = load_config(&fs, &MockEnv::new(), Some(&path)).await.unwrap();
        assert_eq!(cfg.locale.language, "it");
        assert_eq!(cfg.dispatch.execution_timeout_secs, 3);

        fs.remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_config_missing_override_fails() {
        let fs = NativeFileSystem;
        let path = temp_path("absent");
        let err = load_config(&fs, &MockEnv::new(), Some(&path))
            .await
            .unwrap_err();
        assert!(matches!(err, ChorusError::ConfigInvalid { .. }));
    }

    #[tokio::test]
    async fn test_load_config_rejects_invalid_values() {
        let fs = NativeFileSystem;
        let path = temp_path("invalid");
        fs.write_string(&path, r#"{"dispatch": {"threshold": 3.0}}"#)
            .await
            .unwrap();

        let err = load_config(&fs, &MockEnv::new(), Some(&path))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("threshold"));

        fs.remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_env_var_pointing_nowhere_yields_defaults() {
        let fs = NativeFileSystem;
        let env = MockEnv::new().with_var(CONFIG_ENV_VAR, "/tmp/chorus_no_such_config.json");
        let raw = load_config_raw(&fs, &env).await.unwrap();
        assert_eq!(raw, json!({}));
    }
}
