//! Wire Format
//!
//! Endpoint paths, request bodies and response envelopes of the task service.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BoardError, BoardResult};
use crate::models::{ListId, MoveRequest, Task, TaskId};

/// Everything but unreserved characters is escaped
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

// ========================
// Paths
// ========================

pub fn move_path(task: &TaskId) -> String {
    format!("/tasks/{}/move/", encode_segment(task.as_str()))
}

pub fn quick_create_path(list: &ListId) -> String {
    format!("/lists/{}/tasks/quick-create/", encode_segment(list.as_str()))
}

pub fn toggle_path(task: &TaskId) -> String {
    format!("/tasks/{}/toggle-complete/", encode_segment(task.as_str()))
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, COMPONENT).to_string()
}

// ========================
// Request Bodies
// ========================

/// The move endpoint reads a JSON body
#[derive(Serialize)]
struct MoveBody<'a> {
    new_list_id: &'a ListId,
    new_position: usize,
}

pub fn move_body(request: &MoveRequest) -> BoardResult<String> {
    serde_json::to_string(&MoveBody {
        new_list_id: &request.list,
        new_position: request.position,
    })
    .map_err(|e| BoardError::Encode(e.to_string()))
}

/// `application/x-www-form-urlencoded` body
pub fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, COMPONENT),
                utf8_percent_encode(value, COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

// ========================
// Responses
// ========================

#[derive(Deserialize)]
struct MoveReply {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct QuickCreateReply {
    success: bool,
    #[serde(default)]
    task: Option<Task>,
    #[serde(default)]
    error: Option<String>,
    /// Form validation errors, `{"field": ["message", ...]}`
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Deserialize)]
struct ToggleReply {
    success: bool,
    #[serde(default)]
    completed: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

fn parse<'a, T: Deserialize<'a>>(body: &'a str) -> BoardResult<T> {
    serde_json::from_str(body).map_err(|e| BoardError::Decode(e.to_string()))
}

fn rejection(error: Option<String>, errors: Option<&Value>) -> BoardError {
    if let Some(error) = error.filter(|e| !e.trim().is_empty()) {
        return BoardError::Rejected(error);
    }
    let details = errors.map(flatten_form_errors).unwrap_or_default();
    if details.is_empty() {
        BoardError::Rejected("request refused".to_string())
    } else {
        BoardError::Rejected(details)
    }
}

fn flatten_form_errors(errors: &Value) -> String {
    let Some(fields) = errors.as_object() else {
        return errors.as_str().unwrap_or_default().to_string();
    };
    fields
        .iter()
        .map(|(field, messages)| {
            let text = match messages {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}: {}", field, text)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn decode_move(body: &str) -> BoardResult<()> {
    let reply: MoveReply = parse(body)?;
    if reply.success {
        Ok(())
    } else {
        Err(rejection(reply.error, None))
    }
}

pub fn decode_quick_create(body: &str) -> BoardResult<Task> {
    let reply: QuickCreateReply = parse(body)?;
    if !reply.success {
        return Err(rejection(reply.error, reply.errors.as_ref()));
    }
    reply
        .task
        .ok_or_else(|| BoardError::Decode("success without a task".to_string()))
}

pub fn decode_toggle(body: &str) -> BoardResult<bool> {
    let reply: ToggleReply = parse(body)?;
    if !reply.success {
        return Err(rejection(reply.error, None));
    }
    reply
        .completed
        .ok_or_else(|| BoardError::Decode("success without a completion state".to_string()))
}
