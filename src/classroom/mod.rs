//! Support for the classroom-management API
//!
//! * [`types`] describes the payloads returned by the API
//! * [`parse_response`] converts coursework payloads into [`NormalizedTask`](crate::task::NormalizedTask)s
//! * [`ClassroomClient`] is an HTTP client for the API, that can be used as a [`ClassroomSource`](crate::traits::ClassroomSource)

pub mod types;
pub use types::{Course, CourseWork, DueDate, DueTime};
mod parser;
pub use parser::{parse_response, format_due_date, COURSE_WORK_KEY};
mod client;
pub use client::{ClassroomClient, ClassroomError};
