//! Relative timestamps on task cards.

use std::rc::Rc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::trace;
use web_sys::Document;

use crate::dom::elements;
use crate::timers::{TimerId, TimerRegistry};

const STAMPED: &str = ".task-meta [data-timestamp]";

/// Human label for how long ago `then` was
pub fn format_relative(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        ago(minutes, "minute")
    } else if hours < 24 {
        ago(hours, "hour")
    } else {
        ago(days, "day")
    }
}

fn ago(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// RFC 3339 or epoch milliseconds
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let millis: i64 = raw.parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

pub fn now() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(js_sys::Date::now() as i64)
        .single()
        .unwrap_or_default()
}

/// Re-label every stamped element
pub fn refresh(document: &Document) {
    let now = now();
    let stamped = document
        .query_selector_all(STAMPED)
        .map(elements)
        .unwrap_or_default();
    for element in &stamped {
        if let Some(then) = element
            .get_attribute("data-timestamp")
            .as_deref()
            .and_then(parse_timestamp)
        {
            element.set_text_content(Some(&format_relative(now, then)));
        }
    }
    trace!(count = stamped.len(), "timestamps refreshed");
}

/// Refresh labels every `interval_ms` while the page is visible
pub fn start_refresh(document: &Document, timers: &Rc<TimerRegistry>, interval_ms: u32) -> TimerId {
    let document = document.clone();
    timers.every(interval_ms, move || {
        if !document.hidden() {
            refresh(&document);
        }
    })
}
