//! Payloads of the classroom API.
//!
//! Deserializing a payload into these types is how it is validated: a missing required field makes the whole item invalid.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    pub section: Option<String>,
    pub description: Option<String>,
    /// e.g. `ACTIVE` or `ARCHIVED`
    pub course_state: String,
}

/// A work item of a course
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWork {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DueDate>,
    /// Only meaningful along with a `due_date`
    pub due_time: Option<DueTime>,
    /// e.g. `PUBLISHED` or `DRAFT`
    pub state: String,
    pub course_id: String,
    pub alternate_link: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DueDate {
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

/// A time of day.
///
/// The API omits fields that are zero (e.g. midnight is `{}`), hence the defaults
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DueTime {
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub seconds: u32,
}
