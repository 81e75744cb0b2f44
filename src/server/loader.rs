//! Layered configuration for the agentpad server
//!
//! Sources, lowest priority first:
//! 1. `config/default.toml` compiled into the binary
//! 2. On-disk `config/default.toml`, `config/$AGENTPAD_ENV.toml` (profile
//!    defaults to `development`) and `config/local.toml`, all optional
//! 3. `AGENTPAD_*` environment variables, `__` between nested keys:
//!    `AGENTPAD_STORE__BACKEND=redis`, `AGENTPAD_STORE__REDIS__HOST=cache`,
//!    `AGENTPAD_SERVER__PORT=9000`
//!
//! Store settings are checked separately by `StoreConfig::validate`.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, FileFormat, Map};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

const ENV_PREFIX: &str = "AGENTPAD";
const PROFILE_VAR: &str = "AGENTPAD_ENV";
const DEFAULT_PROFILE: &str = "development";

fn profile() -> String {
    std::env::var(PROFILE_VAR).unwrap_or_else(|_| DEFAULT_PROFILE.to_string())
}

/// Embedded defaults plus the optional files for `profile`
fn file_layers(profile: &str) -> ConfigBuilder<DefaultState> {
    Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", profile)).required(false))
        .add_source(File::with_name("config/local").required(false))
}

/// `AGENTPAD_STORE__TTL_HOURS` -> `store.ttl_hours`; `vars` replaces the
/// process environment when given
fn env_layer(vars: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(vars)
}

fn build(profile: &str, vars: Option<Map<String, String>>) -> Result<AppConfig> {
    file_layers(profile)
        .add_source(env_layer(vars))
        .build()
        .with_context(|| format!("Failed to build configuration (profile: {})", profile))?
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    build(&profile(), None)
}
