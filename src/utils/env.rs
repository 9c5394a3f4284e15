//! Environment variable management
//!
//! Loads `.env` and turns environment variables into typed settings. Every
//! parser takes a lookup function so it can be exercised without touching
//! the process environment.

use std::env;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::settings::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::models::{OracleSettings, ScanSettings, ScoreWeighting};
use crate::oracle::http::validate_api_key;

pub const API_KEY_VAR: &str = "ORACLE_API_KEY";
pub const API_BASE_VAR: &str = "ORACLE_API_BASE";
pub const MODEL_VAR: &str = "ORACLE_MODEL";
pub const MAX_OUTPUT_TOKENS_VAR: &str = "ORACLE_MAX_OUTPUT_TOKENS";
pub const TASK_TIMEOUT_VAR: &str = "VIGIL_TASK_TIMEOUT_SECS";
pub const SCAN_TIMEOUT_VAR: &str = "VIGIL_SCAN_TIMEOUT_SECS";
pub const MAX_RETRIES_VAR: &str = "VIGIL_ORACLE_MAX_RETRIES";
pub const WEIGHTING_VAR: &str = "VIGIL_SCORE_WEIGHTING";

/// Load environment variables from .env file
///
/// Does not fail if .env file doesn't exist (optional configuration).
pub fn load_env() {
    dotenv::dotenv().ok();
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Scan settings from the process environment
pub fn load_scan_settings() -> Result<ScanSettings, ConfigError> {
    scan_settings_from(process_env)
}

/// Oracle connection settings from the process environment
///
/// # Errors
/// `ConfigError::Missing` if ORACLE_API_KEY is unset, `Invalid` if it is too short
pub fn load_oracle_settings() -> Result<OracleSettings, ConfigError> {
    oracle_settings_from(process_env)
}

pub fn scan_settings_from<F>(lookup: F) -> Result<ScanSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = ScanSettings::default();

    let task_timeout = match non_empty(&lookup, TASK_TIMEOUT_VAR) {
        Some(raw) => parse_secs(TASK_TIMEOUT_VAR, &raw)?,
        None => defaults.task_timeout,
    };
    let scan_timeout = non_empty(&lookup, SCAN_TIMEOUT_VAR)
        .map(|raw| parse_secs(SCAN_TIMEOUT_VAR, &raw))
        .transpose()?;
    let max_output_tokens = match non_empty(&lookup, MAX_OUTPUT_TOKENS_VAR) {
        Some(raw) => parse_positive(MAX_OUTPUT_TOKENS_VAR, &raw)?,
        None => defaults.max_output_tokens,
    };
    let max_retries = match non_empty(&lookup, MAX_RETRIES_VAR) {
        Some(raw) => parse_u32(MAX_RETRIES_VAR, &raw)?,
        None => defaults.max_retries,
    };
    let weighting = match non_empty(&lookup, WEIGHTING_VAR) {
        Some(raw) => ScoreWeighting::from_str(&raw).ok_or_else(|| ConfigError::Invalid {
            key: WEIGHTING_VAR,
            value: raw.clone(),
            reason: "expected 'unweighted' or 'by_check_count'".to_string(),
        })?,
        None => defaults.weighting,
    };

    Ok(ScanSettings {
        task_timeout,
        scan_timeout,
        max_output_tokens,
        max_retries,
        weighting,
    })
}

pub fn oracle_settings_from<F>(lookup: F) -> Result<OracleSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = lookup(API_KEY_VAR).ok_or(ConfigError::Missing(API_KEY_VAR))?;
    validate_api_key(&api_key)?;

    Ok(OracleSettings {
        api_key,
        api_base: non_empty(&lookup, API_BASE_VAR).unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        model: non_empty(&lookup, MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
    })
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_u32(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match parse_u32(key, raw)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        n => Ok(n),
    }
}

fn parse_secs(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    parse_positive(key, raw).map(|secs| Duration::from_secs(secs as u64))
}
