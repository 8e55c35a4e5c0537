//! This modules fetches tasks from every configured source and merges them into a single list
//!
//! Sources are fetched concurrently, and no source failure is fatal: failures are reported as error messages
//! in the [`SyncResult`], along with whatever tasks could be retrieved.

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::classroom::{ClassroomError, Course};
use crate::task::{CourseRef, NormalizedTask, TaskSource};
use crate::traits::{ClassroomSource, IcalSource, SourceError};

pub mod sync_progress;
use sync_progress::SyncProgress;
use sync_progress::{FeedbackSender, SyncEvent};

/// What to sync. Sources that are not configured are skipped
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    pub ical_source_url: Option<String>,
    pub ical_user_id: Option<String>,
    pub classroom_access_token: Option<String>,
}

impl SyncConfig {
    /// The iCal feed and the user it belongs to, in case both are set
    pub fn ical(&self) -> Option<(&str, &str)> {
        match (non_empty(&self.ical_source_url), non_empty(&self.ical_user_id)) {
            (Some(url), Some(user_id)) => Some((url, user_id)),
            _ => None,
        }
    }

    pub fn classroom_access_token(&self) -> Option<&str> {
        non_empty(&self.classroom_access_token)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| s.is_empty() == false)
}


/// The outcome of a sync
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Deduplicated tasks, iCal tasks first
    pub tasks: Vec<NormalizedTask>,
    /// Human-readable descriptions of what went wrong, iCal errors first
    pub errors: Vec<String>,
}

impl SyncResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// The courses that tasks refer to, for persistence layers that store courses before tasks
    pub fn course_refs(&self) -> Vec<CourseRef> {
        crate::merge::course_refs(&self.tasks)
    }
}


/// Fetches tasks from an iCal source and a classroom source
#[derive(Debug)]
pub struct SyncEngine<I, C>
where
    I: IcalSource + Sync,
    C: ClassroomSource + Sync,
{
    ical: I,
    classroom: C,
    /// Maximum number of coursework requests in flight (unbounded if `None`)
    max_concurrent_course_fetches: Option<usize>,
}

impl<I, C> SyncEngine<I, C>
where
    I: IcalSource + Sync,
    C: ClassroomSource + Sync,
{
    pub fn new(ical: I, classroom: C) -> Self {
        Self { ical, classroom, max_concurrent_course_fetches: None }
    }

    /// Bound the number of concurrent coursework requests. `None` (the default) fetches every course at once
    pub fn with_max_concurrent_course_fetches(mut self, limit: Option<usize>) -> Self {
        self.max_concurrent_course_fetches = limit.map(|l| l.max(1));
        self
    }

    pub fn ical_source(&self) -> &I { &self.ical }
    pub fn classroom_source(&self) -> &C { &self.classroom }

    /// Fetch every configured source, and provide feedback to the user about the progress.
    ///
    /// See [`Self::sync`]
    pub async fn sync_with_feedback(&self, config: &SyncConfig, feedback_sender: FeedbackSender) -> SyncResult {
        let mut progress = SyncProgress::new_with_feedback_channel(feedback_sender);
        self.run_sync(config, &mut progress).await
    }

    /// Fetch every configured source, and merge their tasks.
    ///
    /// This never fails: the result contains every task that could be retrieved, and a description of every failure.
    /// A config with no source at all gives an empty result.
    pub async fn sync(&self, config: &SyncConfig) -> SyncResult {
        let mut progress = SyncProgress::new();
        self.run_sync(config, &mut progress).await
    }

    async fn run_sync(&self, config: &SyncConfig, progress: &mut SyncProgress) -> SyncResult {
        progress.info("Starting a sync.");
        progress.feedback(SyncEvent::Started);

        let mut ical_progress = progress.fork();
        let mut classroom_progress = progress.fork();
        let (ical_tasks, classroom_tasks) = futures::join!(
            self.sync_ical(config, &mut ical_progress),
            self.sync_classroom(config, &mut classroom_progress),
        );
        progress.absorb(ical_progress);
        progress.absorb(classroom_progress);

        let fetched = ical_tasks.len() + classroom_tasks.len();
        let tasks = crate::merge::merge_and_dedup(ical_tasks.into_iter().chain(classroom_tasks));
        progress.info(&format!("Sync finished: {} tasks ({} duplicates removed), {} errors",
            tasks.len(), fetched - tasks.len(), progress.errors().len()));
        progress.feedback(SyncEvent::Finished{ success: progress.is_success(), task_count: tasks.len() });

        let errors = std::mem::take(progress).into_errors();
        SyncResult { tasks, errors }
    }

    async fn sync_ical(&self, config: &SyncConfig, progress: &mut SyncProgress) -> Vec<NormalizedTask> {
        let (url, user_id) = match config.ical() {
            None => {
                progress.debug("No iCal source configured, skipping it");
                return Vec::new();
            },
            Some(ical) => ical,
        };

        progress.feedback(SyncEvent::InProgress{ source: TaskSource::Ical, details: String::from("fetching the calendar export") });
        match self.ical.ingest(url, user_id).await {
            Err(err) => {
                progress.error(&format!("{} sync failed: {}", TaskSource::Ical.display_name(), err));
                Vec::new()
            },
            Ok(result) => {
                for skipped in &result.errors {
                    progress.warn(skipped);
                }
                progress.debug(&format!("{} tasks from the iCal source", result.tasks.len()));
                result.tasks
            },
        }
    }

    async fn sync_classroom(&self, config: &SyncConfig, progress: &mut SyncProgress) -> Vec<NormalizedTask> {
        let access_token = match config.classroom_access_token() {
            None => {
                progress.debug("No classroom access token configured, skipping the classroom source");
                return Vec::new();
            },
            Some(token) => token,
        };

        match self.fetch_classroom(access_token, progress).await {
            Err(err) => {
                if let Some(ClassroomError::TokenExpired) = err.downcast_ref::<ClassroomError>() {
                    progress.info("The classroom access token has expired, the user must sign in again");
                }
                progress.error(&format!("{} sync failed: {}", TaskSource::Classroom.display_name(), err));
                Vec::new()
            },
            Ok(tasks) => {
                progress.debug(&format!("{} tasks from the classroom source", tasks.len()));
                tasks
            },
        }
    }

    /// Fetch the coursework of every course concurrently, and parse all of them at once.
    ///
    /// Only a failure to list courses is returned as an error. A course that cannot be fetched is reported and skipped.
    async fn fetch_classroom(&self, access_token: &str, progress: &mut SyncProgress) -> Result<Vec<NormalizedTask>, SourceError> {
        progress.feedback(SyncEvent::InProgress{ source: TaskSource::Classroom, details: String::from("listing courses") });
        let courses = self.classroom.list_courses(access_token).await?;

        progress.feedback(SyncEvent::InProgress{
            source: TaskSource::Classroom,
            details: format!("fetching the coursework of {} courses", courses.len()),
        });

        let classroom = &self.classroom;
        let fetches = courses.iter().map(move |course| async move {
            let outcome = classroom.list_course_work(access_token, &course.id).await;
            (course, outcome)
        });
        let outcomes: Vec<(&Course, Result<Vec<serde_json::Value>, SourceError>)> = match self.max_concurrent_course_fetches {
            None => join_all(fetches).await,
            Some(limit) => stream::iter(fetches).buffered(limit).collect().await,
        };

        let mut course_work = Vec::new();
        for (course, outcome) in outcomes {
            match outcome {
                Ok(items) => course_work.extend(items),
                Err(err) => progress.error(&format!("Failed to fetch courseWork for course {}: {}", course.id, err)),
            }
        }

        let response = serde_json::json!({ crate::classroom::COURSE_WORK_KEY: course_work });
        Ok(crate::classroom::parse_response(&response))
    }
}


#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;
    use crate::mock_behaviour::MockBehaviour;
    use crate::mock_sources::{MockClassroom, MockIcalSource};
    use crate::task::TaskType;
    use sync_progress::feedback_channel;

    const EXAMPLE_ICAL: &str = "BEGIN:VCALENDAR
VERSION:2.0
BEGIN:VEVENT
UID:12345
SUMMARY:Assignment 1
DESCRIPTION:Complete the worksheet
DTSTART:20260225T090000
CATEGORIES:assignment
END:VEVENT
BEGIN:VEVENT
UID:broken
DTSTART:20260226T090000
END:VEVENT
BEGIN:VEVENT
UID:67890
SUMMARY:Final exam
DTSTART:20260610T090000
CATEGORIES:exam
END:VEVENT
END:VCALENDAR
";

    fn course_work(id: &str, course_id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": format!("Homework {}", id),
            "state": "PUBLISHED",
            "courseId": course_id,
            "dueDate": { "year": 2026, "month": 3, "day": 1 },
        })
    }

    fn full_config() -> SyncConfig {
        SyncConfig {
            ical_source_url: Some(String::from("https://lms.example.edu/export.ics")),
            ical_user_id: Some(String::from("user-1")),
            classroom_access_token: Some(String::from("token")),
        }
    }

    fn ids(result: &SyncResult) -> Vec<&str> {
        result.tasks.iter().map(|t| t.external_id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_unconfigured_sync() {
        let _ = env_logger::builder().is_test(true).try_init();

        let engine = SyncEngine::new(MockIcalSource::new(EXAMPLE_ICAL), MockClassroom::new().with_course("c1", vec![course_work("cw1", "c1")]));
        let result = engine.sync(&SyncConfig::default()).await;
        assert_eq!(result, SyncResult::default());
        assert_eq!(engine.ical_source().calls(), 0);

        // Empty strings do not count as a configuration
        let empty = SyncConfig {
            ical_source_url: Some(String::new()),
            ical_user_id: Some(String::from("user-1")),
            classroom_access_token: Some(String::new()),
        };
        assert_eq!(engine.sync(&empty).await, SyncResult::default());
    }

    #[tokio::test]
    async fn test_ical_needs_a_user() {
        let _ = env_logger::builder().is_test(true).try_init();

        let engine = SyncEngine::new(MockIcalSource::new(EXAMPLE_ICAL), MockClassroom::new());
        let config = SyncConfig {
            ical_source_url: Some(String::from("https://lms.example.edu/export.ics")),
            ..SyncConfig::default()
        };
        assert_eq!(engine.sync(&config).await, SyncResult::default());
        assert_eq!(engine.ical_source().calls(), 0);
    }

    #[tokio::test]
    async fn test_full_sync() {
        let _ = env_logger::builder().is_test(true).try_init();

        let classroom = MockClassroom::new()
            .with_course("c1", vec![course_work("cw1", "c1"), course_work("cw2", "c1")])
            .with_course("c2", vec![course_work("cw3", "c2")]);
        let engine = SyncEngine::new(MockIcalSource::new(EXAMPLE_ICAL), classroom);

        let result = engine.sync(&full_config()).await;
        assert_eq!(ids(&result), vec!["12345", "67890", "cw1", "cw2", "cw3"]);
        assert_eq!(result.errors, vec![String::from("Skipped event broken: missing summary")]);

        assert_eq!(result.tasks[0].source, TaskSource::Ical);
        assert_eq!(result.tasks[1].task_type, TaskType::Exam);
        assert_eq!(result.tasks[2].source, TaskSource::Classroom);
        assert_eq!(result.tasks[2].due_date.as_deref(), Some("2026-03-01"));
        assert_eq!(result.course_refs().len(), 2);
    }

    #[tokio::test]
    async fn test_ical_failure_keeps_classroom_tasks() {
        let _ = env_logger::builder().is_test(true).try_init();

        let behaviour = Arc::new(Mutex::new(MockBehaviour { ingest_behaviour: (0, 1), ..MockBehaviour::default() }));
        let ical = MockIcalSource::new(EXAMPLE_ICAL).with_behaviour(behaviour);
        let classroom = MockClassroom::new().with_course("c1", vec![course_work("cw1", "c1")]);
        let engine = SyncEngine::new(ical, classroom);

        let result = engine.sync(&full_config()).await;
        assert_eq!(ids(&result), vec!["cw1"]);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("iCal sync failed: "));

        // The mock fails only once
        let result = engine.sync(&full_config()).await;
        assert_eq!(ids(&result), vec!["12345", "67890", "cw1"]);
    }

    #[tokio::test]
    async fn test_unreadable_ical_document() {
        let _ = env_logger::builder().is_test(true).try_init();

        let engine = SyncEngine::new(MockIcalSource::new("INVALID DATA"), MockClassroom::new());
        let result = engine.sync(&full_config()).await;
        assert!(result.tasks.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("iCal sync failed: iCal parse failed: iCal parse error"));
    }

    #[tokio::test]
    async fn test_one_failing_course() {
        let _ = env_logger::builder().is_test(true).try_init();

        let classroom = MockClassroom::new()
            .with_course("c1", vec![course_work("cw1", "c1")])
            .with_failing_course("c2")
            .with_course("c3", vec![course_work("cw3", "c3")]);
        let engine = SyncEngine::new(MockIcalSource::new(""), classroom);

        let result = engine.sync(&full_config()).await;
        assert_eq!(ids(&result), vec!["cw1", "cw3"]);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("c2"));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let _ = env_logger::builder().is_test(true).try_init();

        let classroom = MockClassroom::new()
            .with_course("c1", vec![course_work("cw1", "c1")])
            .accepting_only("fresh-token");
        let engine = SyncEngine::new(MockIcalSource::new(EXAMPLE_ICAL), classroom);

        let result = engine.sync(&full_config()).await;
        assert_eq!(ids(&result), vec!["12345", "67890"]);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0], "Skipped event broken: missing summary");
        assert_eq!(result.errors[1], "Classroom sync failed: Classroom access token expired");
    }

    #[tokio::test]
    async fn test_duplicates_across_courses() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut updated = course_work("shared", "c2");
        updated["title"] = json!("Group project (updated)");
        let classroom = MockClassroom::new()
            .with_course("c1", vec![course_work("shared", "c1"), course_work("cw1", "c1")])
            .with_course("c2", vec![updated]);
        let engine = SyncEngine::new(MockIcalSource::new(""), classroom);

        let result = engine.sync(&full_config()).await;
        assert_eq!(ids(&result), vec!["shared", "cw1"]);
        assert_eq!(result.tasks[0].title, "Group project (updated)");
        assert_eq!(result.tasks[0].course_external_id.as_deref(), Some("c2"));
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_course_work_is_fetched_concurrently() {
        let _ = env_logger::builder().is_test(true).try_init();

        // Each request waits for the three of them to be in flight: a sequential fetch would never complete
        let classroom = MockClassroom::new()
            .with_course("c1", vec![course_work("cw1", "c1")])
            .with_failing_course("c2")
            .with_course("c3", vec![course_work("cw3", "c3")])
            .waiting_for_concurrent_requests(3);
        let engine = SyncEngine::new(MockIcalSource::new(""), classroom);

        let result = tokio::time::timeout(std::time::Duration::from_secs(10), engine.sync(&full_config()))
            .await
            .expect("course work should be fetched concurrently");
        assert_eq!(ids(&result), vec!["cw1", "cw3"]);
        assert_eq!(result.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_bounded_concurrency() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut classroom = MockClassroom::new();
        for i in 0..10 {
            let course_id = format!("c{}", i);
            classroom = classroom.with_course(&course_id, vec![course_work(&format!("cw{}", i), &course_id)]);
        }
        let classroom = classroom.with_failing_course("c10");
        let engine = SyncEngine::new(MockIcalSource::new(""), classroom)
            .with_max_concurrent_course_fetches(Some(3));

        let result = engine.sync(&full_config()).await;
        assert_eq!(result.tasks.len(), 10);
        assert_eq!(result.tasks[9].external_id, "cw9");
        assert_eq!(result.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_listing_courses_fails() {
        let _ = env_logger::builder().is_test(true).try_init();

        let behaviour = Arc::new(Mutex::new(MockBehaviour { list_courses_behaviour: (0, 1), ..MockBehaviour::default() }));
        let classroom = MockClassroom::new()
            .with_course("c1", vec![course_work("cw1", "c1")])
            .with_behaviour(behaviour);
        let engine = SyncEngine::new(MockIcalSource::new(EXAMPLE_ICAL), classroom);

        let result = engine.sync(&full_config()).await;
        assert_eq!(ids(&result), vec!["12345", "67890"]);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[1].starts_with("Classroom sync failed: "));
    }

    #[tokio::test]
    async fn test_sync_is_repeatable() {
        let _ = env_logger::builder().is_test(true).try_init();

        let classroom = MockClassroom::new().with_course("c1", vec![course_work("cw1", "c1")]);
        let engine = SyncEngine::new(MockIcalSource::new(EXAMPLE_ICAL), classroom);

        let first = engine.sync(&full_config()).await;
        let second = engine.sync(&full_config()).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_feedback() {
        let _ = env_logger::builder().is_test(true).try_init();

        let classroom = MockClassroom::new().with_failing_course("c1");
        let engine = SyncEngine::new(MockIcalSource::new(EXAMPLE_ICAL), classroom);
        let (sender, receiver) = feedback_channel();
        assert_eq!(*receiver.borrow(), SyncEvent::NotStarted);

        let result = engine.sync_with_feedback(&full_config(), sender).await;
        assert_eq!(*receiver.borrow(), SyncEvent::Finished{ success: false, task_count: 2 });
        assert_eq!(result.errors.len(), 2);
    }
}
