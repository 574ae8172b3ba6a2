//! Board configuration.
//!
//! Read once at startup from `<script type="application/json"
//! id="board-config">`, or from a `window.boardConfig` object. Every field
//! has a default, so pages only set what they change.

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::error::{BoardError, BoardResult};

const CONFIG_ELEMENT_ID: &str = "board-config";
const CONFIG_GLOBAL: &str = "boardConfig";

/// What to do when a task is moved again before its previous move settled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovePolicy {
    /// Apply every response in arrival order
    #[default]
    LastWriteWins,
    /// Refuse to start a drag while the task has a move in flight
    IgnoreWhilePending,
    /// Drop responses of moves that a newer move of the same task replaced
    DiscardStale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Prefix for every task service path
    pub base_path: String,
    pub notification_ttl_ms: u32,
    /// How long server-rendered flash alerts stay before fading out
    pub flash_ttl_ms: u32,
    pub pulse_ms: u32,
    pub touch_threshold_px: f64,
    pub move_policy: MovePolicy,
    pub refresh_interval_ms: u32,
    pub autosave_debounce_ms: u32,
    pub autosave_settle_ms: u32,
    pub copy_feedback_ms: u32,
    pub submit_guard_ms: u32,
    pub search_min_chars: usize,
    pub csrf_field: String,
    pub csrf_cookie: String,
    pub csrf_header: String,
    pub log_level: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            notification_ttl_ms: 5_000,
            flash_ttl_ms: 5_000,
            pulse_ms: 1_000,
            touch_threshold_px: board_dnd::DEFAULT_TOUCH_THRESHOLD_PX,
            move_policy: MovePolicy::default(),
            refresh_interval_ms: 30_000,
            autosave_debounce_ms: 2_000,
            autosave_settle_ms: 1_000,
            copy_feedback_ms: 2_000,
            submit_guard_ms: 3_000,
            search_min_chars: 2,
            csrf_field: "csrfmiddlewaretoken".to_string(),
            csrf_cookie: "csrftoken".to_string(),
            csrf_header: "X-CSRFToken".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl BoardConfig {
    pub fn from_json(raw: &str) -> BoardResult<Self> {
        serde_json::from_str(raw).map_err(|e| BoardError::Config(e.to_string()))
    }

    /// Config embedded in the page, or the defaults when there is none
    pub fn load() -> BoardResult<Self> {
        let Some(window) = web_sys::window() else {
            return Ok(Self::default());
        };

        if let Some(element) = window
            .document()
            .and_then(|doc| doc.get_element_by_id(CONFIG_ELEMENT_ID))
        {
            let raw = element.text_content().unwrap_or_default();
            return Self::from_json(&raw);
        }

        let global = js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL))
            .map_err(|e| BoardError::Config(format!("{:?}", e)))?;
        if global.is_undefined() || global.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(global).map_err(|e| BoardError::Config(e.to_string()))
    }
}
