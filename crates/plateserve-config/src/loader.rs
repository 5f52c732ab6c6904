//! Environment-backed configuration loading.
//!
//! # Design
//! - Every key is optional; absent keys fall back to `defaults.rs`.
//! - Loading is driven through a lookup closure so tests never mutate the process environment.
//! - Values are validated eagerly; the first invalid key aborts startup.

use std::path::PathBuf;

use tracing::debug;

use crate::defaults;
use crate::error::ConfigResult;
use crate::model::{
    ListenerConfig, LogSettings, RecognitionPolicy, RecognizerConfig, ServiceConfig,
};
use crate::validate::{
    parse_bind_addr, parse_byte_limit, parse_country_code, parse_log_format, parse_port,
    parse_seconds, parse_token, split_list,
};

/// Listener interface.
pub const ENV_BIND_ADDR: &str = "PLATESERVE_BIND_ADDR";
/// Listener port.
pub const ENV_HTTP_PORT: &str = "PLATESERVE_HTTP_PORT";
/// Scratch directory for temporary images.
pub const ENV_SCRATCH_DIR: &str = "PLATESERVE_SCRATCH_DIR";
/// Recognizer program.
pub const ENV_RECOGNIZER_BIN: &str = "PLATESERVE_RECOGNIZER_BIN";
/// Recognizer pattern-region hint.
pub const ENV_RECOGNIZER_REGION: &str = "PLATESERVE_RECOGNIZER_REGION";
/// Recognizer timeout in seconds.
pub const ENV_RECOGNIZER_TIMEOUT_SECS: &str = "PLATESERVE_RECOGNIZER_TIMEOUT_SECS";
/// Remote fetch timeout in seconds.
pub const ENV_FETCH_TIMEOUT_SECS: &str = "PLATESERVE_FETCH_TIMEOUT_SECS";
/// Upload size limit in bytes.
pub const ENV_MAX_UPLOAD_BYTES: &str = "PLATESERVE_MAX_UPLOAD_BYTES";
/// Country-code allow-list.
pub const ENV_COUNTRY_CODES: &str = "PLATESERVE_COUNTRY_CODES";
/// Fallback country code.
pub const ENV_DEFAULT_COUNTRY: &str = "PLATESERVE_DEFAULT_COUNTRY";
/// Default tracing filter.
pub const ENV_LOG_LEVEL: &str = "PLATESERVE_LOG_LEVEL";
/// Log output format.
pub const ENV_LOG_FORMAT: &str = "PLATESERVE_LOG_FORMAT";

impl ServiceConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when any present variable holds an invalid value.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Blank values are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error when any present key holds an invalid value.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let base = Self::default();

        let listener = ListenerConfig {
            bind_addr: get(ENV_BIND_ADDR)
                .map(|raw| parse_bind_addr(ENV_BIND_ADDR, &raw))
                .transpose()?
                .unwrap_or(base.listener.bind_addr),
            http_port: get(ENV_HTTP_PORT)
                .map(|raw| parse_port(ENV_HTTP_PORT, &raw))
                .transpose()?
                .unwrap_or(base.listener.http_port),
        };

        let scratch_dir = get(ENV_SCRATCH_DIR).map_or(base.scratch_dir, PathBuf::from);

        let recognizer = RecognizerConfig {
            program: get(ENV_RECOGNIZER_BIN)
                .map(|raw| parse_token(ENV_RECOGNIZER_BIN, &raw))
                .transpose()?
                .map_or(base.recognizer.program, PathBuf::from),
            region_hint: get(ENV_RECOGNIZER_REGION)
                .map(|raw| parse_token(ENV_RECOGNIZER_REGION, &raw))
                .transpose()?
                .unwrap_or(base.recognizer.region_hint),
            timeout: get(ENV_RECOGNIZER_TIMEOUT_SECS)
                .map(|raw| parse_seconds(ENV_RECOGNIZER_TIMEOUT_SECS, &raw))
                .transpose()?
                .unwrap_or(base.recognizer.timeout),
        };

        let fetch_timeout = get(ENV_FETCH_TIMEOUT_SECS)
            .map(|raw| parse_seconds(ENV_FETCH_TIMEOUT_SECS, &raw))
            .transpose()?
            .unwrap_or(base.fetch_timeout);
        let max_upload_bytes = get(ENV_MAX_UPLOAD_BYTES)
            .map(|raw| parse_byte_limit(ENV_MAX_UPLOAD_BYTES, &raw))
            .transpose()?
            .unwrap_or(base.max_upload_bytes);

        let policy = match (get(ENV_COUNTRY_CODES), get(ENV_DEFAULT_COUNTRY)) {
            (None, None) => base.policy,
            (codes, default_country) => {
                let codes = codes.map_or_else(
                    || {
                        defaults::COUNTRY_CODES
                            .iter()
                            .map(ToString::to_string)
                            .collect()
                    },
                    |raw| split_list(&raw),
                );
                let default_country = default_country
                    .map(|raw| parse_country_code(ENV_DEFAULT_COUNTRY, &raw))
                    .transpose()?
                    .unwrap_or_else(|| defaults::DEFAULT_COUNTRY.to_string());
                RecognitionPolicy::new(codes, default_country)?
            }
        };

        let logging = LogSettings {
            level: get(ENV_LOG_LEVEL).map_or(base.logging.level, |raw| raw.trim().to_string()),
            format: get(ENV_LOG_FORMAT)
                .map(|raw| parse_log_format(ENV_LOG_FORMAT, &raw))
                .transpose()?,
        };

        let config = Self {
            listener,
            scratch_dir,
            recognizer,
            fetch_timeout,
            max_upload_bytes,
            policy,
            logging,
        };
        debug!(
            addr = %config.listener.socket_addr(),
            scratch_dir = %config.scratch_dir.display(),
            recognizer = %config.recognizer.program.display(),
            country_codes = ?config.policy.country_codes(),
            "configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use std::collections::HashMap;
    use std::time::Duration;

    fn load(pairs: &[(&str, &str)]) -> ConfigResult<ServiceConfig> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() -> ConfigResult<()> {
        let config = load(&[])?;
        assert_eq!(config.listener, ListenerConfig::default());
        assert_eq!(config.recognizer, RecognizerConfig::default());
        assert_eq!(config.policy, RecognitionPolicy::default());
        assert_eq!(config.max_upload_bytes, defaults::MAX_UPLOAD_BYTES);
        assert_eq!(config.logging, LogSettings::default());
        Ok(())
    }

    #[test]
    fn overrides_are_applied() -> ConfigResult<()> {
        let config = load(&[
            (ENV_BIND_ADDR, "127.0.0.1"),
            (ENV_HTTP_PORT, "9090"),
            (ENV_SCRATCH_DIR, "/var/tmp/plates"),
            (ENV_RECOGNIZER_BIN, "/usr/local/bin/alpr"),
            (ENV_RECOGNIZER_REGION, "cz"),
            (ENV_RECOGNIZER_TIMEOUT_SECS, "5"),
            (ENV_FETCH_TIMEOUT_SECS, "7"),
            (ENV_MAX_UPLOAD_BYTES, "2048"),
            (ENV_COUNTRY_CODES, "us,au"),
            (ENV_DEFAULT_COUNTRY, "au"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_LOG_FORMAT, "json"),
        ])?;
        assert_eq!(config.listener.socket_addr().to_string(), "127.0.0.1:9090");
        assert_eq!(config.scratch_dir, PathBuf::from("/var/tmp/plates"));
        assert_eq!(
            config.recognizer.program,
            PathBuf::from("/usr/local/bin/alpr")
        );
        assert_eq!(config.recognizer.region_hint, "cz");
        assert_eq!(config.recognizer.timeout, Duration::from_secs(5));
        assert_eq!(config.fetch_timeout, Duration::from_secs(7));
        assert_eq!(config.max_upload_bytes, 2048);
        assert_eq!(config.policy.country_codes(), ["us", "au"]);
        assert_eq!(config.policy.default_country(), "au");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        Ok(())
    }

    #[test]
    fn blank_values_fall_back_to_defaults() -> ConfigResult<()> {
        let config = load(&[(ENV_HTTP_PORT, "  "), (ENV_COUNTRY_CODES, "")])?;
        assert_eq!(config.listener.http_port, defaults::HTTP_PORT);
        assert_eq!(config.policy, RecognitionPolicy::default());
        Ok(())
    }

    #[test]
    fn invalid_values_name_the_offending_key() {
        let Err(ConfigError::InvalidField { field, reason, .. }) =
            load(&[(ENV_HTTP_PORT, "0")])
        else {
            panic!("expected invalid port");
        };
        assert_eq!(field, ENV_HTTP_PORT);
        assert_eq!(reason, "zero");

        let err = load(&[(ENV_COUNTRY_CODES, "us,gb")]).err();
        assert_eq!(
            err.map(|err| (err.field(), err.reason())),
            Some((ENV_DEFAULT_COUNTRY, "not_in_allow_list"))
        );
    }
}
