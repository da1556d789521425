//! Loading [`ServiceConfig`] from environment variables.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::defaults::{
    DEFAULT_BIND_ADDR, DEFAULT_BUILD_SHA, DEFAULT_CLONE_TIMEOUT_SECS, DEFAULT_GIT_BIN,
    DEFAULT_HTTP_PORT, DEFAULT_IR_TIMEOUT_SECS, DEFAULT_JAVA_BIN, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_SOURCE_TIMEOUT_SECS, DEFAULT_TOOL_ROOT, ENV_BIND_ADDR, ENV_BUILD_SHA,
    ENV_CLONE_TIMEOUT_SECS, ENV_GIT_BIN, ENV_HTTP_PORT, ENV_IR_TIMEOUT_SECS, ENV_JAVA_BIN,
    ENV_LOG_FORMAT, ENV_MAX_UPLOAD_BYTES, ENV_SOURCE_TIMEOUT_SECS, ENV_TOOL_JAR, ENV_TOOL_ROOT,
    ENV_WORKSPACE_ROOT,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ServiceConfig, Timeouts, ToolSettings};

impl ServiceConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for malformed values.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for malformed values.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let ip = parse_ip(get(ENV_BIND_ADDR).as_deref().unwrap_or(DEFAULT_BIND_ADDR))?;
        let port = parse_port(get(ENV_HTTP_PORT))?;

        let tool = ToolSettings {
            explicit_jar: get(ENV_TOOL_JAR).map(PathBuf::from),
            tool_root: PathBuf::from(get(ENV_TOOL_ROOT).as_deref().unwrap_or(DEFAULT_TOOL_ROOT)),
            java_bin: PathBuf::from(get(ENV_JAVA_BIN).as_deref().unwrap_or(DEFAULT_JAVA_BIN)),
        };

        let max_upload_bytes = parse_non_zero(
            get(ENV_MAX_UPLOAD_BYTES),
            ENV_MAX_UPLOAD_BYTES,
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;
        let timeouts = Timeouts {
            clone: parse_secs(
                get(ENV_CLONE_TIMEOUT_SECS),
                ENV_CLONE_TIMEOUT_SECS,
                DEFAULT_CLONE_TIMEOUT_SECS,
            )?,
            ir: parse_secs(
                get(ENV_IR_TIMEOUT_SECS),
                ENV_IR_TIMEOUT_SECS,
                DEFAULT_IR_TIMEOUT_SECS,
            )?,
            source: parse_secs(
                get(ENV_SOURCE_TIMEOUT_SECS),
                ENV_SOURCE_TIMEOUT_SECS,
                DEFAULT_SOURCE_TIMEOUT_SECS,
            )?,
        };

        let log_format = get(ENV_LOG_FORMAT)
            .map(|value| {
                let lowered = value.to_ascii_lowercase();
                match lowered.as_str() {
                    "json" | "pretty" => Ok(lowered),
                    _ => Err(ConfigError::invalid(
                        ENV_LOG_FORMAT,
                        &value,
                        "must be 'json' or 'pretty'",
                    )),
                }
            })
            .transpose()?;

        Ok(Self {
            bind_addr: SocketAddr::new(ip, port),
            tool,
            git_bin: PathBuf::from(get(ENV_GIT_BIN).as_deref().unwrap_or(DEFAULT_GIT_BIN)),
            workspace_root: get(ENV_WORKSPACE_ROOT).map_or_else(env::temp_dir, PathBuf::from),
            max_upload_bytes,
            timeouts,
            log_format,
            build_sha: get(ENV_BUILD_SHA).unwrap_or_else(|| DEFAULT_BUILD_SHA.to_string()),
        })
    }
}

fn parse_ip(raw: &str) -> ConfigResult<IpAddr> {
    raw.parse::<IpAddr>()
        .map_err(|_| ConfigError::invalid(ENV_BIND_ADDR, raw, "must be an IP address"))
}

fn parse_port(value: Option<String>) -> ConfigResult<u16> {
    let Some(raw) = value else {
        return Ok(DEFAULT_HTTP_PORT);
    };
    match raw.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::invalid(
            ENV_HTTP_PORT,
            &raw,
            "must be between 1 and 65535",
        )),
    }
}

fn parse_non_zero<T>(value: Option<String>, field: &'static str, default: T) -> ConfigResult<T>
where
    T: FromStr + PartialEq + Default,
{
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.parse::<T>() {
        Ok(parsed) if parsed != T::default() => Ok(parsed),
        Ok(_) => Err(ConfigError::invalid(field, &raw, "must be greater than zero")),
        Err(_) => Err(ConfigError::invalid(
            field,
            &raw,
            "must be a non-negative integer",
        )),
    }
}

fn parse_secs(value: Option<String>, field: &'static str, default: u64) -> ConfigResult<Duration> {
    parse_non_zero(value, field, default).map(Duration::from_secs)
}
