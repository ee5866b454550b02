//! Configuration resolution.
//!
//! Values arrive through a lookup function; the binary feeds it from `clap`
//! flags that fall back to these environment variables.
//!
//! | variable                 | effect                                         | default |
//! |--------------------------|------------------------------------------------|---------|
//! | `ICEERP_BACKEND_URL`     | base URL of the hosted backend                 | required|
//! | `ICEERP_BACKEND_KEY`     | API key sent as `apikey` and bearer token      | none    |
//! | `ICEERP_UNIT_COST_SCALE` | decimal places unit costs are stored at        | `6`     |
//! | `ICEERP_DISPLAY_SCALE`   | decimal places totals are displayed at         | `2`     |
//! | `ICEERP_TOLERANCE`       | largest difference still reported as matched   | `0.01`  |

use core::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use iceerp_costing::{
    DEFAULT_DISPLAY_SCALE, DEFAULT_UNIT_COST_SCALE, ReconciliationPolicy, RoundingPolicy,
};

pub const BACKEND_URL_VAR: &str = "ICEERP_BACKEND_URL";
pub const BACKEND_KEY_VAR: &str = "ICEERP_BACKEND_KEY";
pub const UNIT_COST_SCALE_VAR: &str = "ICEERP_UNIT_COST_SCALE";
pub const DISPLAY_SCALE_VAR: &str = "ICEERP_DISPLAY_SCALE";
pub const TOLERANCE_VAR: &str = "ICEERP_TOLERANCE";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL without trailing slash (e.g. `https://project.example.co`).
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build from any variable source (the CLI, or a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup(BACKEND_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(BACKEND_URL_VAR))?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: BACKEND_URL_VAR,
                value: url,
                reason: "expected an http(s) URL".to_string(),
            });
        }

        let mut config = Self::new(url.trim());
        config.api_key = lookup(BACKEND_KEY_VAR).filter(|v| !v.is_empty());
        Ok(config)
    }
}

/// Reconciliation policy from variables, falling back to the defaults.
pub fn policy_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ReconciliationPolicy, ConfigError> {
    let unit_cost_scale =
        parse_var(&lookup, UNIT_COST_SCALE_VAR)?.unwrap_or(DEFAULT_UNIT_COST_SCALE);
    let display_scale = parse_var(&lookup, DISPLAY_SCALE_VAR)?.unwrap_or(DEFAULT_DISPLAY_SCALE);
    let tolerance: Option<Decimal> = parse_var(&lookup, TOLERANCE_VAR)?;

    let rounding = RoundingPolicy::new(unit_cost_scale, display_scale).map_err(|e| {
        let (name, value) = if RoundingPolicy::new(unit_cost_scale, 0).is_err() {
            (UNIT_COST_SCALE_VAR, unit_cost_scale)
        } else {
            (DISPLAY_SCALE_VAR, display_scale)
        };
        ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        }
    })?;
    let tolerance = tolerance.unwrap_or(ReconciliationPolicy::default().tolerance);

    ReconciliationPolicy::new(rounding, tolerance).map_err(|e| ConfigError::Invalid {
        name: TOLERANCE_VAR,
        value: tolerance.to_string(),
        reason: e.to_string(),
    })
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}
