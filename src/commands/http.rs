//! Fetch-backed task service.

use async_trait::async_trait;
use tracing::debug;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCredentials, RequestInit, Response};

use super::csrf::{attaches_csrf, CsrfSource};
use super::wire;
use super::TaskService;
use crate::config::BoardConfig;
use crate::error::{BoardError, BoardResult};
use crate::models::{ListId, MoveRequest, Task, TaskId};

enum Body {
    Json(String),
    Form(Vec<(String, String)>),
}

/// Talks to the task service over `fetch`
pub struct HttpTaskService {
    base_path: String,
    csrf: CsrfSource,
}

impl HttpTaskService {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            base_path: config.base_path.trim_end_matches('/').to_string(),
            csrf: CsrfSource::new(config),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_path, path)
    }

    /// POST and return the body of a 2xx response
    async fn post(&self, path: &str, body: Body) -> BoardResult<String> {
        let window = web_sys::window().ok_or_else(|| BoardError::MissingElement("window".into()))?;
        let url = self.url(path);
        let origin = window.location().origin().map_err(BoardError::from_js)?;
        let token = if attaches_csrf(&url, &origin) {
            self.csrf.token()
        } else {
            None
        };

        let headers = Headers::new().map_err(BoardError::from_js)?;
        headers
            .set("X-Requested-With", "XMLHttpRequest")
            .map_err(BoardError::from_js)?;
        if let Some(token) = &token {
            headers.set(self.csrf.header(), token).map_err(BoardError::from_js)?;
        }

        let payload = match body {
            Body::Json(json) => {
                headers
                    .set("Content-Type", "application/json")
                    .map_err(BoardError::from_js)?;
                json
            }
            Body::Form(mut fields) => {
                headers
                    .set("Content-Type", "application/x-www-form-urlencoded; charset=UTF-8")
                    .map_err(BoardError::from_js)?;
                if let Some(token) = &token {
                    fields.push((self.csrf.field().to_string(), token.clone()));
                }
                let pairs: Vec<(&str, &str)> = fields
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str()))
                    .collect();
                wire::encode_form(&pairs)
            }
        };

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&payload));
        init.set_credentials(RequestCredentials::SameOrigin);

        let request = Request::new_with_str_and_init(&url, &init).map_err(BoardError::from_js)?;
        debug!(%url, csrf = token.is_some(), "POST");

        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(BoardError::from_js)?
            .dyn_into()
            .map_err(BoardError::from_js)?;
        if !response.ok() {
            return Err(BoardError::Status { status: response.status() });
        }

        let text = JsFuture::from(response.text().map_err(BoardError::from_js)?)
            .await
            .map_err(BoardError::from_js)?;
        text.as_string()
            .ok_or_else(|| BoardError::Decode("response body is not text".into()))
    }
}

#[async_trait(?Send)]
impl TaskService for HttpTaskService {
    async fn move_task(&self, request: &MoveRequest) -> BoardResult<()> {
        let body = wire::move_body(request)?;
        let reply = self.post(&wire::move_path(&request.task), Body::Json(body)).await?;
        wire::decode_move(&reply)
    }

    async fn quick_create(&self, list: &ListId, title: &str) -> BoardResult<Task> {
        let fields = vec![("title".to_string(), title.to_string())];
        let reply = self.post(&wire::quick_create_path(list), Body::Form(fields)).await?;
        wire::decode_quick_create(&reply)
    }

    async fn toggle_complete(&self, task: &TaskId) -> BoardResult<bool> {
        let reply = self.post(&wire::toggle_path(task), Body::Form(Vec::new())).await?;
        wire::decode_toggle(&reply)
    }
}
