//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding `tenant=url` pairs, comma separated.
pub const ENV_UPSTREAMS: &str = "GATEWAY_UPSTREAMS";
pub const ENV_BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";
pub const ENV_TENANT_HEADER: &str = "GATEWAY_TENANT_HEADER";
pub const ENV_UPSTREAM_TIMEOUT_SECS: &str = "GATEWAY_UPSTREAM_TIMEOUT_SECS";
pub const ENV_ADMIN_API_KEY: &str = "GATEWAY_ADMIN_API_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid environment variable {var}: {reason}")]
    Env { var: &'static str, reason: String },
    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then
/// `GATEWAY_*` environment overrides. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, std::env::vars())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse and validate a TOML file without consulting the environment.
pub fn check_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let config = read_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply `GATEWAY_*` overrides from the given variables.
///
/// Upstreams from [`ENV_UPSTREAMS`] are merged over the file table, so a
/// tenant present in both takes the environment's URL.
pub fn apply_env_overrides<I>(config: &mut GatewayConfig, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        match key.as_str() {
            ENV_BIND_ADDRESS => config.listener.bind_address = value,
            ENV_TENANT_HEADER => config.routing.tenant_header = value,
            ENV_ADMIN_API_KEY => config.admin.api_key = value,
            ENV_UPSTREAM_TIMEOUT_SECS => {
                config.timeouts.upstream_secs =
                    value.trim().parse().map_err(|_| ConfigError::Env {
                        var: ENV_UPSTREAM_TIMEOUT_SECS,
                        reason: format!("expected whole seconds, got {value:?}"),
                    })?;
            }
            ENV_UPSTREAMS => {
                for (tenant, url) in parse_upstream_list(&value)? {
                    config.routing.upstreams.insert(tenant, url);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_upstream_list(value: &str) -> Result<Vec<(String, String)>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((tenant, url)) => Ok((tenant.trim().to_string(), url.trim().to_string())),
            None => Err(ConfigError::Env {
                var: ENV_UPSTREAMS,
                reason: format!("expected tenant=url, got {entry:?}"),
            }),
        })
        .collect()
}
