//! Retrieval of calendar exports over HTTP

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::ical::IcalParseResult;
use crate::traits::{IcalSource, SourceError};

#[derive(Error, Debug)]
pub enum IcalSourceError {
    #[error("Invalid iCal URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to fetch iCal feed: HTTP {status}")]
    Fetch { status: u16 },

    #[error("Failed to fetch iCal feed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("iCal parse failed: {0}")]
    Parse(String),
}

/// Decide whether a parse result is worth returning.
///
/// A document that produced errors and no task at all is considered as a failure of the whole source
pub fn check_parse_result(result: IcalParseResult) -> Result<IcalParseResult, IcalSourceError> {
    if result.tasks.is_empty() {
        if let Some(first) = result.errors.first() {
            return Err(IcalSourceError::Parse(first.clone()));
        }
    }
    Ok(result)
}

/// Validate a feed URL. `webcal://` URLs are fetched over HTTPS
pub fn feed_url(raw: &str) -> Result<Url, IcalSourceError> {
    let invalid = |reason: String| IcalSourceError::InvalidUrl { url: raw.to_string(), reason };

    let trimmed = raw.trim();
    let url = match trimmed.strip_prefix("webcal://") {
        Some(rest) => Url::parse(&format!("https://{}", rest)),
        None => Url::parse(trimmed),
    }.map_err(|err| invalid(err.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {:?}", other))),
    }
}


/// An [`IcalSource`] that downloads calendar exports, either directly or through a proxy
#[derive(Clone, Debug)]
pub struct HttpIcalSource {
    proxy_url: Option<Url>,
    http: reqwest::Client,
}

impl HttpIcalSource {
    /// Create a source. When `proxy_url` is set, feeds are requested as `<proxy_url>?icalUrl=<feed URL>`
    pub fn new(proxy_url: Option<Url>, timeout: Duration) -> Result<Self, IcalSourceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { proxy_url, http })
    }

    /// The URL that is actually requested to get this feed
    pub fn request_url(&self, feed: &Url) -> Url {
        match &self.proxy_url {
            None => feed.clone(),
            Some(proxy) => {
                let mut url = proxy.clone();
                url.query_pairs_mut().append_pair("icalUrl", feed.as_str());
                url
            },
        }
    }

    /// Download the raw content of a feed
    pub async fn fetch(&self, ical_url: &str) -> Result<String, IcalSourceError> {
        let feed = feed_url(ical_url)?;
        let response = self.http
            .get(self.request_url(&feed))
            .send()
            .await?;

        if response.status().is_success() == false {
            return Err(IcalSourceError::Fetch { status: response.status().as_u16() });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl IcalSource for HttpIcalSource {
    async fn ingest(&self, ical_url: &str, user_id: &str) -> Result<IcalParseResult, SourceError> {
        log::debug!("Fetching the iCal feed of user {}", user_id);
        let text = self.fetch(ical_url).await?;
        log::debug!("Fetched {} bytes of iCal data", text.len());

        let result = check_parse_result(crate::ical::parse(&text))?;
        log::info!("Retrieved {} tasks from the iCal feed", result.tasks.len());
        Ok(result)
    }
}
