//! Conversion of coursework payloads into normalized tasks

use serde::Deserialize;
use serde_json::Value;

use crate::classroom::types::{CourseWork, DueDate, DueTime};
use crate::task::{NormalizedTask, TaskSource, TaskType};

/// The key that holds coursework items in an API response
pub const COURSE_WORK_KEY: &str = "courseWork";

/// Convert a coursework response (`{"courseWork": [...]}`) into tasks.
///
/// Anything that is not such a response yields no task. Items that do not have the expected shape are dropped.
pub fn parse_response(response: &Value) -> Vec<NormalizedTask> {
    let items = match response.get(COURSE_WORK_KEY).and_then(Value::as_array) {
        None => return Vec::new(),
        Some(items) => items,
    };

    items.iter()
        .filter_map(|item| match CourseWork::deserialize(item) {
            Err(err) => {
                log::debug!("Dropping an invalid coursework item: {}", err);
                None
            },
            Ok(cw) if cw.id.is_empty() || cw.title.is_empty() => {
                log::debug!("Dropping a coursework item with an empty id or title");
                None
            },
            Ok(cw) => Some(to_task(cw)),
        })
        .collect()
}

fn to_task(cw: CourseWork) -> NormalizedTask {
    let due_date = cw.due_date.map(|date| format_due_date(&date, cw.due_time.as_ref()));
    NormalizedTask {
        external_id: cw.id,
        title: cw.title,
        description: cw.description,
        due_date,
        task_type: TaskType::Assignment,
        source: TaskSource::Classroom,
        course_external_id: Some(cw.course_id),
        url: cw.alternate_link,
    }
}

/// `YYYY-MM-DD`, or `YYYY-MM-DDTHH:MM:SS` when a time is given
pub fn format_due_date(date: &DueDate, time: Option<&DueTime>) -> String {
    let day = format!("{:04}-{:02}-{:02}", date.year, date.month, date.day);
    match time {
        None => day,
        Some(t) => format!("{}T{:02}:{:02}:{:02}", day, t.hours, t.minutes, t.seconds),
    }
}
