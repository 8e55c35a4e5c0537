//! A module to parse iCal files

use chrono::{NaiveDate, NaiveDateTime};
use ical::parser::ical::component::{IcalCalendar, IcalEvent};

use crate::task::{NormalizedTask, TaskSource, TaskType};

/// Larger exports are rejected without being parsed
pub const MAX_ICAL_SIZE: usize = 5 * 1024 * 1024;

/// The tasks that could be extracted from an iCal file, and the reasons why some other could not
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IcalParseResult {
    pub tasks: Vec<NormalizedTask>,
    pub errors: Vec<String>,
}

impl IcalParseResult {
    fn failed(error: String) -> Self {
        Self { tasks: Vec::new(), errors: vec![error] }
    }
}


/// Parse an iCal file into [`NormalizedTask`]s
///
/// This never fails as a whole: a document that cannot be read produces no task and a single error,
/// and every `VEVENT` that misses a required property is skipped with an error that names it.
pub fn parse(ics: &str) -> IcalParseResult {
    if ics.len() > MAX_ICAL_SIZE {
        return IcalParseResult::failed(String::from("iCal file exceeds 5MB size limit"));
    }

    if ics.trim().is_empty() {
        return IcalParseResult::default();
    }

    let calendars = match read_calendars(ics) {
        Err(err) => return IcalParseResult::failed(format!("iCal parse error: {}", err)),
        Ok(calendars) => calendars,
    };

    let mut result = IcalParseResult::default();
    for event in calendars.iter().flat_map(|cal| cal.events.iter()) {
        match parse_event(event) {
            Ok(task) => result.tasks.push(task),
            Err(err) => {
                log::debug!("{}", err);
                result.errors.push(err);
            },
        }
    }

    log::debug!("Parsed {} tasks from iCal data ({} skipped events)", result.tasks.len(), result.errors.len());
    result
}

fn read_calendars(ics: &str) -> Result<Vec<IcalCalendar>, String> {
    let reader = ical::IcalParser::new(ics.as_bytes());
    let calendars = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| err.to_string())?;

    if calendars.is_empty() {
        return Err(String::from("no VCALENDAR component found"));
    }
    Ok(calendars)
}

fn parse_event(event: &IcalEvent) -> Result<NormalizedTask, String> {
    let uid = match property_value(event, "UID").map(unescape_text).filter(|s| !s.is_empty()) {
        None => return Err(String::from("Skipped unidentifiable event: missing uid")),
        Some(uid) => uid,
    };
    let summary = property_value(event, "SUMMARY").map(unescape_text).filter(|s| !s.is_empty());
    let dtstart = property_value(event, "DTSTART").map(str::trim).filter(|s| !s.is_empty());

    let (title, start) = match (summary, dtstart) {
        (Some(title), Some(start)) => (title, start),
        (None, Some(_)) => return Err(format!("Skipped event {}: missing summary", uid)),
        (Some(_), None) => return Err(format!("Skipped event {}: missing dtstart", uid)),
        (None, None) => return Err(format!("Skipped event {}: missing summary/dtstart", uid)),
    };

    let description = property_value(event, "DESCRIPTION")
        .map(unescape_text)
        .filter(|s| !s.is_empty());
    let category = property_value(event, "CATEGORIES")
        .and_then(|raw| text_list(raw).into_iter().next());

    Ok(NormalizedTask {
        external_id: uid,
        title,
        description,
        due_date: Some(normalize_date_value(start)),
        task_type: TaskType::from_category(category.as_deref()),
        source: TaskSource::Ical,
        course_external_id: None,
        url: None,
    })
}

/// The value of the first property with this name
fn property_value<'a>(event: &'a IcalEvent, name: &str) -> Option<&'a str> {
    event.properties
        .iter()
        .find(|prop| prop.name.eq_ignore_ascii_case(name))
        .and_then(|prop| prop.value.as_deref())
}

/// Renders an iCal `DATE` or `DATE-TIME` value the ISO way (e.g. `20260225T090000` becomes `2026-02-25T09:00:00`).
///
/// The wall-clock value is kept as-is (a `TZID` parameter is not applied). Unknown shapes are returned verbatim.
fn normalize_date_value(raw: &str) -> String {
    let (body, utc_suffix) = match raw.strip_suffix('Z') {
        Some(body) => (body, "Z"),
        None => (raw, ""),
    };

    if let Ok(dt) = NaiveDateTime::parse_from_str(body, "%Y%m%dT%H%M%S") {
        return format!("{}{}", dt.format("%Y-%m-%dT%H:%M:%S"), utc_suffix);
    }
    if utc_suffix.is_empty() {
        if let Ok(date) = NaiveDate::parse_from_str(body, "%Y%m%d") {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    raw.to_string()
}

/// Unescape an iCal TEXT value (RFC 5545, section 3.3.11)
fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out.trim().to_string()
}

/// Split a comma-separated list of TEXT values, unescaping each of them
fn text_list(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in raw.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' {
            items.push(unescape_text(&current));
            current.clear();
        } else {
            current.push(c);
        }
    }
    if escaped {
        current.push('\\');
    }
    items.push(unescape_text(&current));

    items.into_iter().filter(|s| !s.is_empty()).collect()
}
