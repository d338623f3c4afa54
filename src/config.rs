//! Runtime settings.
//!
//! Layered with the `config` crate, later sources winning:
//! built-in defaults, an optional TOML file, `SERVICEWATCH_*` environment
//! variables, then command-line flags.
//!
//! ```toml
//! api_url = "http://metrics.internal:8000"
//! access_token = "..."
//! refresh_interval = "30s"
//! request_timeout = "10s"
//! time_range = "1h"
//! theme = "dark"
//! log_file = "/tmp/servicewatch.log"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::duration::parse_duration;
use crate::data::TimeRange;
use crate::ui::ThemeChoice;

/// Prefix of the environment variables read into the settings.
pub const ENV_PREFIX: &str = "SERVICEWATCH";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REFRESH_INTERVAL: &str = "30s";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "10s";

/// Resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Base URL of the metrics API.
    pub api_url: String,
    /// Sent as `X-Forwarded-Access-Token` when set.
    pub access_token: Option<String>,
    /// Auto-refresh interval of refreshable queries.
    pub refresh_interval: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Initial global time range.
    pub time_range: TimeRange,
    pub theme: ThemeChoice,
    /// Log destination; logging is off while the TUI runs without one.
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line, applied over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub refresh_interval: Option<String>,
    pub time_range: Option<TimeRange>,
    pub theme: Option<ThemeChoice>,
    pub log_file: Option<PathBuf>,
}

/// Shape of the merged configuration before durations are parsed.
#[derive(Debug, Deserialize)]
struct RawSettings {
    api_url: String,
    access_token: Option<String>,
    refresh_interval: String,
    request_timeout: String,
    time_range: TimeRange,
    theme: ThemeChoice,
    log_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the process environment, `file` and `overrides`.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(file, overrides, None)
    }

    /// Like [`Settings::load`], reading variables from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(
        file: Option<&Path>,
        overrides: &Overrides,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("refresh_interval", DEFAULT_REFRESH_INTERVAL)?
            .set_default("request_timeout", DEFAULT_REQUEST_TIMEOUT)?
            .set_default("time_range", TimeRange::default().as_str())?
            .set_default("theme", ThemeChoice::default().as_str())?;

        if let Some(path) = file {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).source(env))
            .set_override_option("api_url", overrides.api_url.clone())?
            .set_override_option("refresh_interval", overrides.refresh_interval.clone())?
            .set_override_option("time_range", overrides.time_range.map(|r| r.as_str()))?
            .set_override_option("theme", overrides.theme.map(|t| t.as_str()))?
            .set_override_option(
                "log_file",
                overrides.log_file.as_ref().map(|p| p.display().to_string()),
            )?
            .build()
            .context("Failed to read configuration")?;

        let raw: RawSettings = config
            .try_deserialize()
            .context("Invalid configuration")?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        let api_url = raw.api_url.trim().to_string();
        if api_url.is_empty() {
            bail!("api_url must not be empty");
        }

        let refresh_interval = parse_duration(&raw.refresh_interval)
            .with_context(|| format!("Invalid refresh_interval '{}'", raw.refresh_interval))?;
        if refresh_interval.is_zero() {
            bail!("refresh_interval must be greater than zero");
        }

        let request_timeout = parse_duration(&raw.request_timeout)
            .with_context(|| format!("Invalid request_timeout '{}'", raw.request_timeout))?;
        if request_timeout.is_zero() {
            bail!("request_timeout must be greater than zero");
        }

        Ok(Self {
            api_url,
            access_token: raw.access_token.filter(|t| !t.trim().is_empty()),
            refresh_interval,
            request_timeout,
            time_range: raw.time_range,
            theme: raw.theme,
            log_file: raw.log_file,
        })
    }
}
