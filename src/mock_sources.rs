//! In-memory sources, whose failures can be scripted with a [`MockBehaviour`]
#![cfg(any(test, feature = "mock_sources"))]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Barrier;

use crate::classroom::{ClassroomError, Course};
use crate::ical::IcalParseResult;
use crate::mock_behaviour::MockBehaviour;
use crate::traits::{ClassroomSource, IcalSource, SourceError};

/// An [`IcalSource`] that serves a fixed iCal document
#[derive(Debug, Default)]
pub struct MockIcalSource {
    ics: String,
    behaviour: Arc<Mutex<MockBehaviour>>,
    calls: AtomicUsize,
}

impl MockIcalSource {
    pub fn new<S: Into<String>>(ics: S) -> Self {
        Self { ics: ics.into(), ..Self::default() }
    }

    pub fn with_behaviour(mut self, behaviour: Arc<Mutex<MockBehaviour>>) -> Self {
        self.behaviour = behaviour;
        self
    }

    /// How many times this source has been asked for its content
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IcalSource for MockIcalSource {
    async fn ingest(&self, ical_url: &str, user_id: &str) -> Result<IcalParseResult, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.behaviour.lock().unwrap().can_ingest()?;
        log::debug!("Mock iCal source: serving {} for user {}", ical_url, user_id);

        let result = crate::ical_source::check_parse_result(crate::ical::parse(&self.ics))?;
        Ok(result)
    }
}


/// A [`ClassroomSource`] that serves fixed courses
#[derive(Debug, Default)]
pub struct MockClassroom {
    courses: Vec<Course>,
    course_work: HashMap<String, Vec<Value>>,
    failing_courses: HashSet<String>,
    accepted_token: Option<String>,
    barrier: Option<Arc<Barrier>>,
    behaviour: Arc<Mutex<MockBehaviour>>,
}

impl MockClassroom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an active course and its coursework items
    pub fn with_course(mut self, course_id: &str, course_work: Vec<Value>) -> Self {
        self.courses.push(Course {
            id: course_id.to_string(),
            name: format!("Course {}", course_id),
            section: None,
            description: None,
            course_state: String::from("ACTIVE"),
        });
        self.course_work.insert(course_id.to_string(), course_work);
        self
    }

    /// Every coursework request for this course will fail
    pub fn with_failing_course(mut self, course_id: &str) -> Self {
        self.failing_courses.insert(course_id.to_string());
        self.with_course(course_id, Vec::new())
    }

    /// Any other token will be rejected as expired
    pub fn accepting_only(mut self, token: &str) -> Self {
        self.accepted_token = Some(token.to_string());
        self
    }

    /// Coursework requests will wait until `n` of them are in flight at the same time.
    ///
    /// This blocks forever in case requests are issued one after the other
    pub fn waiting_for_concurrent_requests(mut self, n: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(n)));
        self
    }

    pub fn with_behaviour(mut self, behaviour: Arc<Mutex<MockBehaviour>>) -> Self {
        self.behaviour = behaviour;
        self
    }

    fn check_token(&self, access_token: &str) -> Result<(), SourceError> {
        match &self.accepted_token {
            Some(accepted) if accepted != access_token => Err(ClassroomError::TokenExpired.into()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ClassroomSource for MockClassroom {
    async fn list_courses(&self, access_token: &str) -> Result<Vec<Course>, SourceError> {
        self.check_token(access_token)?;
        self.behaviour.lock().unwrap().can_list_courses()?;
        Ok(self.courses.clone())
    }

    async fn list_course_work(&self, access_token: &str, course_id: &str) -> Result<Vec<Value>, SourceError> {
        self.check_token(access_token)?;
        self.behaviour.lock().unwrap().can_list_course_work()?;

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        if self.failing_courses.contains(course_id) {
            return Err(format!("Mocked failure for course {}", course_id).into());
        }
        Ok(self.course_work.get(course_id).cloned().unwrap_or_default())
    }
}
