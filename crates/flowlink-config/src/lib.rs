//! Configuration system for the flowlink MCP bridge.
//!
//! Provides TOML-based configuration with:
//! - `[mcp]` connection settings (webhook URL, candidate hosts, timeouts)
//! - `[bridge]` chat routing settings (reply limit, workflow keywords)
//! - `[logging]` log file settings
//! - Config file layering (user config + project-local + explicit file)
//! - Environment overrides (`N8N_WEBHOOK_URL`, `FLOWLINK_MCP_HOST`, `FLOWLINK_MCP_PORT`)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, HOST_ENV, LoadedConfig, PORT_ENV, WEBHOOK_URL_ENV, apply_env_overrides,
    config_dir, load_config, load_config_file, load_config_with_options, log_dir,
    user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
