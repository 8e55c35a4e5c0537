//! This module provides a client to connect to the classroom API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::classroom::types::Course;
use crate::classroom::parser::COURSE_WORK_KEY;
use crate::traits::{ClassroomSource, SourceError};

/// How many items are requested per page
const PAGE_SIZE: u32 = 100;

#[derive(Error, Debug)]
pub enum ClassroomError {
    /// The API rejected the access token. The user must re-authenticate.
    #[error("Classroom access token expired")]
    TokenExpired,

    #[error("Classroom API error: {status}")]
    Api { status: u16 },

    #[error("Classroom request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid Classroom API URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid Classroom API response: {0}")]
    InvalidResponse(String),
}


/// An HTTP client for the classroom API.
///
/// It holds no credentials: every request is authenticated with the access token it is given
#[derive(Clone, Debug)]
pub struct ClassroomClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ClassroomClient {
    /// Create a client. This does not start a connection
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ClassroomError> {
        if base_url.cannot_be_a_base() {
            return Err(ClassroomError::InvalidUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the courses of the token owner. Entries that do not look like courses are ignored
    pub async fn courses(&self, access_token: &str) -> Result<Vec<Course>, ClassroomError> {
        let url = self.endpoint(&["courses"])?;
        let items = self.get_all_pages(access_token, url, "courses").await?;

        let mut courses = Vec::with_capacity(items.len());
        for item in &items {
            match Course::deserialize(item) {
                Ok(course) => courses.push(course),
                Err(err) => log::warn!("Ignoring an invalid course entry: {}", err),
            }
        }
        log::debug!("Found {} courses", courses.len());
        Ok(courses)
    }

    /// Returns the raw coursework items of a course
    pub async fn course_work(&self, access_token: &str, course_id: &str) -> Result<Vec<Value>, ClassroomError> {
        let url = self.endpoint(&["courses", course_id, "courseWork"])?;
        let items = self.get_all_pages(access_token, url, COURSE_WORK_KEY).await?;
        log::debug!("Found {} coursework items in course {}", items.len(), course_id);
        Ok(items)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClassroomError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClassroomError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Follow `nextPageToken`s, and concatenate the lists found under `key`
    async fn get_all_pages(&self, access_token: &str, url: Url, key: &str) -> Result<Vec<Value>, ClassroomError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut page_url = url.clone();
            {
                let mut query = page_url.query_pairs_mut();
                query.append_pair("pageSize", &PAGE_SIZE.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let mut page = self.get_json(access_token, page_url).await?;
            match page.get_mut(key).map(Value::take) {
                None | Some(Value::Null) => (),
                Some(Value::Array(list)) => items.extend(list),
                Some(_) => return Err(ClassroomError::InvalidResponse(format!("\"{}\" is not a list", key))),
            }

            page_token = page.get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|token| token.is_empty() == false)
                .map(String::from);
            if page_token.is_none() {
                break;
            }
        }

        Ok(items)
    }

    async fn get_json(&self, access_token: &str, url: Url) -> Result<Value, ClassroomError> {
        log::trace!("GET {}", url);
        let response = self.http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClassroomError::TokenExpired);
        }
        if status.is_success() == false {
            return Err(ClassroomError::Api { status: status.as_u16() });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|err| ClassroomError::InvalidResponse(err.to_string()))
    }
}

#[async_trait]
impl ClassroomSource for ClassroomClient {
    async fn list_courses(&self, access_token: &str) -> Result<Vec<Course>, SourceError> {
        Ok(self.courses(access_token).await?)
    }

    async fn list_course_work(&self, access_token: &str, course_id: &str) -> Result<Vec<Value>, SourceError> {
        Ok(self.course_work(access_token, course_id).await?)
    }
}
