//! Runtime settings, read from the environment

use std::time::Duration;

use once_cell::sync::Lazy;
use thiserror::Error;
use url::Url;

use crate::classroom::ClassroomClient;
use crate::engine::{SyncConfig, SyncEngine};
use crate::ical_source::HttpIcalSource;

/// The public endpoint of the Google Classroom API
pub static DEFAULT_CLASSROOM_API_URL: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://classroom.googleapis.com/v1").unwrap()
});

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub const ICAL_URL_VAR: &str = "TASK_AGGREGATOR_ICAL_URL";
pub const USER_ID_VAR: &str = "TASK_AGGREGATOR_USER_ID";
pub const CLASSROOM_TOKEN_VAR: &str = "TASK_AGGREGATOR_CLASSROOM_TOKEN";
pub const ICAL_PROXY_URL_VAR: &str = "TASK_AGGREGATOR_ICAL_PROXY_URL";
pub const CLASSROOM_API_URL_VAR: &str = "TASK_AGGREGATOR_CLASSROOM_API_URL";
pub const MAX_COURSE_FETCHES_VAR: &str = "TASK_AGGREGATOR_MAX_COURSE_FETCHES";
pub const HTTP_TIMEOUT_VAR: &str = "TASK_AGGREGATOR_HTTP_TIMEOUT_SECS";

#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("{var} is not a valid URL ({reason})")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Everything needed to run a sync against the real services
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub sync: SyncConfig,
    /// When set, iCal feeds are fetched through this proxy
    pub ical_proxy_url: Option<Url>,
    pub classroom_api_url: Url,
    pub max_concurrent_course_fetches: Option<usize>,
    pub http_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            ical_proxy_url: None,
            classroom_api_url: DEFAULT_CLASSROOM_API_URL.clone(),
            max_concurrent_course_fetches: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl Settings {
    /// Read the settings from the `TASK_AGGREGATOR_*` environment variables
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the settings from any key/value store. Empty values are treated as missing
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| v.is_empty() == false);

        let sync = SyncConfig {
            ical_source_url: get(ICAL_URL_VAR),
            ical_user_id: get(USER_ID_VAR),
            classroom_access_token: get(CLASSROOM_TOKEN_VAR),
        };

        let ical_proxy_url = get(ICAL_PROXY_URL_VAR)
            .map(|raw| parse_url(ICAL_PROXY_URL_VAR, &raw))
            .transpose()?;
        let classroom_api_url = match get(CLASSROOM_API_URL_VAR) {
            None => DEFAULT_CLASSROOM_API_URL.clone(),
            Some(raw) => parse_url(CLASSROOM_API_URL_VAR, &raw)?,
        };
        let max_concurrent_course_fetches = get(MAX_COURSE_FETCHES_VAR)
            .map(|raw| parse_positive(MAX_COURSE_FETCHES_VAR, &raw))
            .transpose()?;
        let http_timeout = match get(HTTP_TIMEOUT_VAR) {
            None => DEFAULT_HTTP_TIMEOUT,
            Some(raw) => Duration::from_secs(parse_positive(HTTP_TIMEOUT_VAR, &raw)? as u64),
        };

        Ok(Self { sync, ical_proxy_url, classroom_api_url, max_concurrent_course_fetches, http_timeout })
    }
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|err| SettingsError::InvalidUrl { var, reason: err.to_string() })
}

fn parse_positive(var: &'static str, raw: &str) -> Result<usize, SettingsError> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SettingsError::InvalidNumber { var, value: raw.to_string() }),
    }
}


/// A sync engine that talks to the real services
pub type HttpSyncEngine = SyncEngine<HttpIcalSource, ClassroomClient>;

impl SyncEngine<HttpIcalSource, ClassroomClient> {
    /// Build the HTTP sources these settings describe
    pub fn from_settings(settings: &Settings) -> Result<Self, Box<dyn std::error::Error>> {
        let ical = HttpIcalSource::new(settings.ical_proxy_url.clone(), settings.http_timeout)?;
        let classroom = ClassroomClient::new(settings.classroom_api_url.clone(), settings.http_timeout)?;

        Ok(SyncEngine::new(ical, classroom)
            .with_max_concurrent_course_fetches(settings.max_concurrent_course_fetches))
    }
}
