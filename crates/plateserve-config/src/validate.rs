//! Parsing helpers for raw configuration values.

use std::net::IpAddr;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Parse a listener address.
///
/// # Errors
///
/// Returns an error when the value is not an IPv4 or IPv6 address.
pub fn parse_bind_addr(field: &'static str, raw: &str) -> ConfigResult<IpAddr> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, "invalid_ip_addr", raw))
}

/// Parse a non-zero TCP port.
///
/// # Errors
///
/// Returns an error when the value is not an integer in `1..=65535`.
pub fn parse_port(field: &'static str, raw: &str) -> ConfigResult<u16> {
    let port: u32 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, "not_an_integer", raw))?;
    match u16::try_from(port) {
        Ok(0) => Err(ConfigError::invalid(field, "zero", raw)),
        Ok(port) => Ok(port),
        Err(_) => Err(ConfigError::invalid(field, "out_of_range", raw)),
    }
}

/// Parse a strictly positive number of seconds.
///
/// # Errors
///
/// Returns an error when the value is not a positive integer.
pub fn parse_seconds(field: &'static str, raw: &str) -> ConfigResult<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, "not_an_integer", raw))?;
    if secs == 0 {
        return Err(ConfigError::invalid(field, "zero", raw));
    }
    Ok(Duration::from_secs(secs))
}

/// Parse a strictly positive byte count.
///
/// # Errors
///
/// Returns an error when the value is not a positive integer.
pub fn parse_byte_limit(field: &'static str, raw: &str) -> ConfigResult<usize> {
    let bytes: usize = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, "not_an_integer", raw))?;
    if bytes == 0 {
        return Err(ConfigError::invalid(field, "zero", raw));
    }
    Ok(bytes)
}

/// Parse a country code: one to eight ASCII alphanumerics.
///
/// # Errors
///
/// Returns an error for empty or non-alphanumeric codes.
pub fn parse_country_code(field: &'static str, raw: &str) -> ConfigResult<String> {
    let code = raw.trim();
    if code.is_empty() || code.len() > 8 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::invalid(field, "invalid_country_code", raw));
    }
    Ok(code.to_string())
}

/// Split a comma-separated list, dropping blank entries.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse a non-blank free-form token such as a program name or region hint.
///
/// # Errors
///
/// Returns an error when the value is blank.
pub fn parse_token(field: &'static str, raw: &str) -> ConfigResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ConfigError::invalid(field, "blank", raw));
    }
    Ok(value.to_string())
}

/// Parse a log output format name.
///
/// # Errors
///
/// Returns an error for anything other than `json` or `pretty`.
pub fn parse_log_format(field: &'static str, raw: &str) -> ConfigResult<String> {
    let value = raw.trim().to_ascii_lowercase();
    match value.as_str() {
        "json" | "pretty" => Ok(value),
        _ => Err(ConfigError::invalid(field, "unknown_log_format", raw)),
    }
}
