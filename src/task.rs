//! Normalized academic tasks, as produced by every parser of this crate

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The category of a task.
///
/// Sources that do not tell (or that use a category outside of this set) end up as [`TaskType::Event`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Assignment,
    Quiz,
    Exam,
    Event,
}

impl TaskType {
    /// Normalize a free-form category (e.g. an iCal `CATEGORIES` value).
    ///
    /// Matching is case-insensitive. Unknown and missing categories are [`TaskType::Event`]
    pub fn from_category(category: Option<&str>) -> Self {
        category
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or(TaskType::Event)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Assignment => "assignment",
            TaskType::Quiz => "quiz",
            TaskType::Exam => "exam",
            TaskType::Event => "event",
        }
    }
}

impl Default for TaskType {
    fn default() -> Self {
        TaskType::Event
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "assignment" => Ok(TaskType::Assignment),
            "quiz" => Ok(TaskType::Quiz),
            "exam" => Ok(TaskType::Exam),
            "event" => Ok(TaskType::Event),
            other => Err(format!("Unknown task type {:?}", other)),
        }
    }
}

impl Display for TaskType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}


/// Where a task comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskSource {
    /// The calendar export feed
    #[serde(rename = "ical_source")]
    Ical,
    /// The classroom-management API
    #[serde(rename = "classroom_source")]
    Classroom,
}

impl TaskSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskSource::Ical => "ical_source",
            TaskSource::Classroom => "classroom_source",
        }
    }

    /// A human-readable name, used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskSource::Ical => "iCal",
            TaskSource::Classroom => "Classroom",
        }
    }
}

impl Display for TaskSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}


/// The key that identifies a task across the whole aggregated system.
///
/// External IDs are only unique within a source, hence the pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupKey {
    pub source: TaskSource,
    pub external_id: String,
}

impl Display for DedupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source, self.external_id)
    }
}


/// A course, as referenced by tasks. Persistence layers resolve course records from this pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRef {
    pub external_id: String,
    pub source: TaskSource,
}


/// A task, as parsed from a source, before it is persisted anywhere
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTask {
    /// Identifier given by the source. Never empty.
    pub external_id: String,
    /// Never empty.
    pub title: String,
    pub description: Option<String>,
    /// ISO-8601-like timestamp (date-only or date-time)
    pub due_date: Option<String>,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub source: TaskSource,
    /// Identifier of the course in the source, used to match courses later on
    pub course_external_id: Option<String>,
    /// Deep link to the original item
    pub url: Option<String>,
}

impl NormalizedTask {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            source: self.source,
            external_id: self.external_id.clone(),
        }
    }

    pub fn course_ref(&self) -> Option<CourseRef> {
        self.course_external_id.as_ref().map(|id| CourseRef {
            external_id: id.clone(),
            source: self.source,
        })
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_category_normalization() {
        assert_eq!(TaskType::from_category(Some("assignment")), TaskType::Assignment);
        assert_eq!(TaskType::from_category(Some("QUIZ")), TaskType::Quiz);
        assert_eq!(TaskType::from_category(Some(" Exam ")), TaskType::Exam);
        assert_eq!(TaskType::from_category(Some("lecture")), TaskType::Event);
        assert_eq!(TaskType::from_category(Some("")), TaskType::Event);
        assert_eq!(TaskType::from_category(None), TaskType::Event);
    }

    #[test]
    fn test_serialized_shape() {
        let task = NormalizedTask {
            external_id: "cw1".to_string(),
            title: "Assignment 1".to_string(),
            description: None,
            due_date: Some("2026-02-25".to_string()),
            task_type: TaskType::Assignment,
            source: TaskSource::Classroom,
            course_external_id: Some("c1".to_string()),
            url: None,
        };

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["externalId"], "cw1");
        assert_eq!(value["type"], "assignment");
        assert_eq!(value["source"], "classroom_source");
        assert_eq!(value["courseExternalId"], "c1");
        assert!(value["url"].is_null());
        assert_eq!(task.dedup_key().to_string(), "classroom_source:cw1");
    }
}
