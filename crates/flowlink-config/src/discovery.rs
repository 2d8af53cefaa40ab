//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. Built-in defaults
//! 2. `~/.config/flowlink/config.toml` (user config)
//! 3. `./flowlink.toml` (project-local)
//! 4. An explicit `--config` file
//! 5. Environment variables
//! 6. CLI arguments (handled externally)
//!
//! Files are merged key by key, so a project file that only sets `mcp.port`
//! keeps the webhook URL from the user config.

use std::path::{Path, PathBuf};

use crate::{ConfigError, FlowlinkConfig, Result};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "flowlink.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for config directory resolution.
const APP_NAME: &str = "flowlink";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "FLOWLINK_CONFIG_DIR";

/// Webhook URL of the workflow.
pub const WEBHOOK_URL_ENV: &str = "N8N_WEBHOOK_URL";
/// Extra candidate host, probed last.
pub const HOST_ENV: &str = "FLOWLINK_MCP_HOST";
/// Port for the default candidate hosts.
pub const PORT_ENV: &str = "FLOWLINK_MCP_PORT";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: FlowlinkConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Environment variables that overrode file settings.
    pub env_overrides: Vec<String>,
    /// Warnings generated during loading (e.g., unparsable layers).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration from every layer, environment included.
///
/// `explicit` must exist and parse; the discovered layers are optional and
/// a broken one is skipped with a warning.
pub fn load_config(project_dir: Option<&Path>, explicit: Option<&Path>) -> Result<LoadedConfig> {
    let mut loaded = load_config_with_options(project_dir, None, explicit)?;
    let mut env_warnings = Vec::new();
    loaded.env_overrides = apply_env_overrides(
        &mut loaded.config,
        |key| std::env::var(key).ok(),
        &mut env_warnings,
    );
    loaded.warnings.extend(env_warnings);
    Ok(loaded)
}

/// Load the file layers only, with explicit control over the user config
/// directory.
///
/// `config_dir` overrides both `FLOWLINK_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut merged = toml::Table::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    // 1. User config: explicit dir, then env var, then platform default
    let user_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => user_config_path(),
    };
    if let Some(path) = user_path {
        sources.push(load_layer(&mut merged, &path, &mut warnings));
    }

    // 2. Project-local config
    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut merged, &project_path, &mut warnings));

    // 3. Explicit file, which must be usable
    if let Some(path) = explicit {
        let layer = read_layer(path)?;
        merge_tables(&mut merged, layer);
        sources.push(ConfigSource {
            path: path.to_path_buf(),
            loaded: true,
        });
    }

    let config: FlowlinkConfig = toml::Value::Table(merged).try_into()?;

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    Ok(LoadedConfig {
        config,
        sources,
        env_overrides: Vec::new(),
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<FlowlinkConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    FlowlinkConfig::from_toml(&contents)
}

/// Apply environment overrides through `lookup`.
///
/// Returns the names of the variables that took effect. Unusable values
/// are skipped with a warning.
pub fn apply_env_overrides(
    config: &mut FlowlinkConfig,
    lookup: impl Fn(&str) -> Option<String>,
    warnings: &mut Vec<String>,
) -> Vec<String> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut applied = Vec::new();

    if let Some(url) = get(WEBHOOK_URL_ENV) {
        config.mcp.webhook_url = Some(url.trim().to_string());
        applied.push(WEBHOOK_URL_ENV.to_string());
    }

    if let Some(host) = get(HOST_ENV) {
        config.mcp.host_override = Some(host.trim().to_string());
        applied.push(HOST_ENV.to_string());
    }

    if let Some(port) = get(PORT_ENV) {
        match port.trim().parse::<u16>() {
            Ok(port) if port != 0 => {
                config.mcp.port = port;
                applied.push(PORT_ENV.to_string());
            }
            _ => warnings.push(format!("Ignoring {}={:?}: not a valid port", PORT_ENV, port)),
        }
    }

    applied
}

/// Path of the user config file.
pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// User config directory for flowlink.
///
/// Checks `FLOWLINK_CONFIG_DIR` first, then falls back to the platform
/// default (`~/.config/flowlink` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Directory for log files: the configured one, else `<config dir>/logs`.
pub fn log_dir(config: &FlowlinkConfig) -> Option<PathBuf> {
    config
        .logging
        .directory
        .clone()
        .or_else(|| config_dir().map(|d| d.join("logs")))
}

/// Try to load a config file and merge it into the accumulated table.
fn load_layer(merged: &mut toml::Table, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match read_layer(path) {
        Ok(layer) => {
            merge_tables(merged, layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

/// Read one layer, checking that it is a valid config on its own.
fn read_layer(path: &Path) -> Result<toml::Table> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let table: toml::Table = toml::from_str(&contents)?;
    let _: FlowlinkConfig = toml::Value::Table(table.clone()).try_into()?;
    Ok(table)
}

/// Merge `overlay` into `base`; nested tables merge, everything else replaces.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_user_config_path_shape() {
        if let Some(p) = user_config_path() {
            assert!(p.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[mcp]
webhook_url = "http://n8n:5678/webhook/abc/chat"
"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(
            config.mcp.webhook_url(),
            Some("http://n8n:5678/webhook/abc/chat")
        );
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_no_files() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let loaded =
            load_config_with_options(Some(project.path()), Some(user.path()), None).unwrap();
        assert_eq!(loaded.config, FlowlinkConfig::default());
        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.sources.len(), 2);
    }

    #[test]
    fn test_layers_merge_key_by_key() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        let explicit = TempDir::new().unwrap();

        fs::write(
            user.path().join("config.toml"),
            r#"
[mcp]
webhook_url = "http://n8n:5678/webhook/user/chat"
port = 8000

[mcp.headers]
Authorization = "Bearer user"
"#,
        )
        .unwrap();
        fs::write(
            project.path().join("flowlink.toml"),
            r#"
[mcp]
port = 9000

[bridge]
reply_limit = 1000
"#,
        )
        .unwrap();
        let explicit_path = explicit.path().join("ci.toml");
        fs::write(&explicit_path, "[bridge]\nreply_limit = 500\n").unwrap();

        let loaded = load_config_with_options(
            Some(project.path()),
            Some(user.path()),
            Some(&explicit_path),
        )
        .unwrap();
        let config = &loaded.config;

        assert_eq!(
            config.mcp.webhook_url(),
            Some("http://n8n:5678/webhook/user/chat")
        );
        assert_eq!(config.mcp.port, 9000);
        assert_eq!(config.mcp.headers["Authorization"], "Bearer user");
        assert_eq!(config.bridge.reply_limit, 500);
        assert_eq!(loaded.loaded_from().len(), 3);
    }

    #[test]
    fn test_malformed_layer_warns_but_continues() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            user.path().join("config.toml"),
            "[mcp]\nwebhook_url = \"http://n8n:5678/webhook/abc\"\n",
        )
        .unwrap();
        fs::write(project.path().join("flowlink.toml"), "[mcp]\nport = \"high\"\n").unwrap();

        let loaded =
            load_config_with_options(Some(project.path()), Some(user.path()), None).unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("Failed to load"));
        assert_eq!(loaded.config.mcp.port, 5678);
        assert!(loaded.config.mcp.webhook_url().is_some());
    }

    #[test]
    fn test_broken_explicit_file_is_an_error() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();

        let missing = project.path().join("missing.toml");
        let err = load_config_with_options(Some(project.path()), Some(user.path()), Some(&missing))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));

        let bad = project.path().join("bad.toml");
        fs::write(&bad, "nope {{").unwrap();
        let err = load_config_with_options(Some(project.path()), Some(user.path()), Some(&bad))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = FlowlinkConfig::new();
        config.mcp.webhook_url = Some("http://from-file/webhook/x".into());
        let mut warnings = Vec::new();

        let applied = apply_env_overrides(
            &mut config,
            env(&[
                (WEBHOOK_URL_ENV, " http://n8n:5678/webhook/env/chat "),
                (HOST_ENV, "10.0.0.5:5678"),
                (PORT_ENV, "6000"),
            ]),
            &mut warnings,
        );

        assert_eq!(applied.len(), 3);
        assert!(warnings.is_empty());
        assert_eq!(
            config.mcp.webhook_url(),
            Some("http://n8n:5678/webhook/env/chat")
        );
        assert_eq!(config.mcp.host_override(), Some("10.0.0.5:5678"));
        assert_eq!(config.mcp.port, 6000);
    }

    #[test]
    fn test_env_bad_port_and_blank_values() {
        let mut config = FlowlinkConfig::new();
        let mut warnings = Vec::new();

        let applied = apply_env_overrides(
            &mut config,
            env(&[(PORT_ENV, "eighty"), (WEBHOOK_URL_ENV, "   ")]),
            &mut warnings,
        );

        assert!(applied.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains(PORT_ENV));
        assert_eq!(config.mcp.port, 5678);
        assert!(config.mcp.webhook_url.is_none());
    }

    #[test]
    fn test_log_dir_prefers_configured() {
        let mut config = FlowlinkConfig::new();
        config.logging.directory = Some(PathBuf::from("/var/log/flowlink"));
        assert_eq!(log_dir(&config), Some(PathBuf::from("/var/log/flowlink")));
    }
}
