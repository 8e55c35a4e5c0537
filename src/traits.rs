//! The collaborators a [`SyncEngine`](crate::engine::SyncEngine) fetches its data from
//!
//! This crate provides HTTP-backed implementations of both traits ([`HttpIcalSource`](crate::ical_source::HttpIcalSource)
//! and [`ClassroomClient`](crate::classroom::ClassroomClient)), but any other implementation (a cache, a mock...) can be used instead.

use std::error::Error;

use async_trait::async_trait;

use crate::classroom::Course;
use crate::ical::IcalParseResult;

/// The error type returned by sources.
///
/// Sources may return any error, the sync engine only cares about its description (and, in some cases, about its concrete type)
pub type SourceError = Box<dyn Error + Send + Sync>;

#[async_trait]
pub trait IcalSource {
    /// Fetch the calendar export at `ical_url` on behalf of `user_id`, and parse it.
    ///
    /// The returned errors are the events that were skipped while parsing.
    /// Failures that prevent any task from being retrieved (unreachable feed, unreadable document...) must be returned as `Err`
    async fn ingest(&self, ical_url: &str, user_id: &str) -> Result<IcalParseResult, SourceError>;
}

#[async_trait]
pub trait ClassroomSource {
    /// Returns the courses the owner of `access_token` is enrolled in
    async fn list_courses(&self, access_token: &str) -> Result<Vec<Course>, SourceError>;

    /// Returns the raw coursework items of a course.
    ///
    /// Items are not validated at this stage, see [`crate::classroom::parse_response`]
    async fn list_course_work(&self, access_token: &str, course_id: &str) -> Result<Vec<serde_json::Value>, SourceError>;
}
