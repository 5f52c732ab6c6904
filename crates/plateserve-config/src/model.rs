//! Typed configuration models.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::validate::parse_country_code;

/// Complete service configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub listener: ListenerConfig,
    /// Directory that holds per-request temporary images.
    pub scratch_dir: PathBuf,
    /// External recognizer invocation settings.
    pub recognizer: RecognizerConfig,
    /// Upper bound for one remote image fetch.
    pub fetch_timeout: Duration,
    /// Upper bound for a buffered upload body, in bytes.
    pub max_upload_bytes: usize,
    /// Allow-lists and defaults applied while validating requests.
    pub policy: RecognitionPolicy,
    /// Logging preferences.
    pub logging: LogSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            scratch_dir: std::env::temp_dir(),
            recognizer: RecognizerConfig::default(),
            fetch_timeout: Duration::from_secs(defaults::FETCH_TIMEOUT_SECS),
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
            policy: RecognitionPolicy::default(),
            logging: LogSettings::default(),
        }
    }
}

/// Address the HTTP listener binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Interface address.
    pub bind_addr: IpAddr,
    /// TCP port, never zero.
    pub http_port: u16,
}

impl ListenerConfig {
    /// Socket address assembled from the interface and port.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            http_port: defaults::HTTP_PORT,
        }
    }
}

/// How the external recognizer is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerConfig {
    /// Program name or path.
    pub program: PathBuf,
    /// Pattern-region hint passed with `-p` on every invocation.
    pub region_hint: String,
    /// Upper bound for one invocation.
    pub timeout: Duration,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(defaults::RECOGNIZER_PROGRAM),
            region_hint: defaults::RECOGNIZER_REGION.to_string(),
            timeout: Duration::from_secs(defaults::RECOGNIZER_TIMEOUT_SECS),
        }
    }
}

/// Logging preferences; `RUST_LOG` still wins over `level`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Default filter directive.
    pub level: String,
    /// Explicit output format (`json` or `pretty`); inferred from the build when absent.
    pub format: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            format: None,
        }
    }
}

/// Read-only allow-lists shared by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionPolicy {
    country_codes: Vec<String>,
    default_country: String,
}

impl RecognitionPolicy {
    /// Build a policy from an allow-list and the fallback country.
    ///
    /// # Errors
    ///
    /// Returns an error when the allow-list is empty, contains a malformed code, or does
    /// not include the fallback country.
    pub fn new(
        country_codes: impl IntoIterator<Item = String>,
        default_country: impl Into<String>,
    ) -> ConfigResult<Self> {
        let mut codes: Vec<String> = Vec::new();
        for code in country_codes {
            let code = parse_country_code("PLATESERVE_COUNTRY_CODES", &code)?;
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        if codes.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "PLATESERVE_COUNTRY_CODES",
                reason: "empty",
                value: None,
            });
        }
        let default_country = default_country.into();
        if !codes.contains(&default_country) {
            return Err(ConfigError::invalid(
                "PLATESERVE_DEFAULT_COUNTRY",
                "not_in_allow_list",
                &default_country,
            ));
        }
        Ok(Self {
            country_codes: codes,
            default_country,
        })
    }

    /// Country codes callers may request. Matching is exact and case-sensitive.
    #[must_use]
    pub fn country_codes(&self) -> &[String] {
        &self.country_codes
    }

    /// Whether `code` is on the allow-list.
    #[must_use]
    pub fn accepts_country(&self, code: &str) -> bool {
        self.country_codes.iter().any(|known| known == code)
    }

    /// Country code used when the request carries none.
    #[must_use]
    pub fn default_country(&self) -> &str {
        &self.default_country
    }

    /// Whether a (lower-cased) extension names a supported image type.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn supports_type(&self, extension: &str) -> bool {
        defaults::SUPPORTED_TYPES.contains(&extension)
    }

    /// Extension used for uploads and extension-less remote sources.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn default_extension(&self) -> &'static str {
        defaults::DEFAULT_EXTENSION
    }
}

impl Default for RecognitionPolicy {
    fn default() -> Self {
        Self {
            country_codes: defaults::COUNTRY_CODES
                .iter()
                .map(ToString::to_string)
                .collect(),
            default_country: defaults::DEFAULT_COUNTRY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_builtin_allow_lists() {
        let policy = RecognitionPolicy::default();
        assert_eq!(policy.country_codes(), ["us", "eu", "gb"]);
        assert_eq!(policy.default_country(), "eu");
        assert!(policy.accepts_country("gb"));
        assert!(!policy.accepts_country("GB"));
        assert!(!policy.accepts_country("de"));
        assert!(policy.supports_type("jpg"));
        assert!(policy.supports_type("jpeg"));
        assert!(!policy.supports_type("png"));
        assert_eq!(policy.default_extension(), "jpg");
    }

    #[test]
    fn policy_rejects_default_outside_allow_list() {
        let err = RecognitionPolicy::new(vec!["us".to_string()], "eu")
            .err()
            .map(|err| err.reason());
        assert_eq!(err, Some("not_in_allow_list"));
    }

    #[test]
    fn policy_rejects_empty_allow_list() {
        let err = RecognitionPolicy::new(Vec::new(), "eu")
            .err()
            .map(|err| err.reason());
        assert_eq!(err, Some("empty"));
    }

    #[test]
    fn policy_deduplicates_codes() -> ConfigResult<()> {
        let policy = RecognitionPolicy::new(
            ["us", "us", "au"].into_iter().map(String::from),
            "au",
        )?;
        assert_eq!(policy.country_codes(), ["us", "au"]);
        Ok(())
    }

    #[test]
    fn listener_builds_socket_addr() {
        let listener = ListenerConfig::default();
        assert_eq!(listener.socket_addr().to_string(), "0.0.0.0:8080");
    }
}
