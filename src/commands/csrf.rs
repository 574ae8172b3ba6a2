//! CSRF Token
//!
//! The token comes from the page's hidden form field, or the cookie when
//! the page has no form. It is only ever attached to same-origin requests.

use percent_encoding::percent_decode_str;
use wasm_bindgen::JsCast;

use crate::config::BoardConfig;

#[derive(Debug, Clone)]
pub struct CsrfSource {
    field: String,
    cookie: String,
    header: String,
}

impl CsrfSource {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            field: config.csrf_field.clone(),
            cookie: config.csrf_cookie.clone(),
            header: config.csrf_header.clone(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Current token from the page
    pub fn token(&self) -> Option<String> {
        let document = web_sys::window()?.document()?;

        let from_field = document
            .query_selector(&format!("[name=\"{}\"]", self.field))
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<web_sys::HtmlInputElement>().ok())
            .map(|input| input.value())
            .filter(|value| !value.is_empty());
        if from_field.is_some() {
            return from_field;
        }

        let cookies = document
            .dyn_into::<web_sys::HtmlDocument>()
            .ok()?
            .cookie()
            .ok()?;
        cookie_value(&cookies, &self.cookie)
    }
}

/// Value of cookie `name` in a `document.cookie` string
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(name)?.strip_prefix('='))
        .map(|raw| percent_decode_str(raw).decode_utf8_lossy().into_owned())
}

/// Whether a request to `url` may carry the token, given the page origin
pub fn attaches_csrf(url: &str, page_origin: &str) -> bool {
    let page_origin = page_origin.trim_end_matches('/');
    if let Some(rest) = url.strip_prefix("//") {
        // Protocol-relative: same scheme as the page
        let scheme = page_origin.split("://").next().unwrap_or("https");
        return same_origin(&format!("{}://{}", scheme, rest), page_origin);
    }
    if !url.contains("://") {
        return true;
    }
    same_origin(url, page_origin)
}

fn same_origin(url: &str, page_origin: &str) -> bool {
    origin_of(url).eq_ignore_ascii_case(page_origin)
}

fn origin_of(url: &str) -> &str {
    let Some(scheme_end) = url.find("://") else {
        return url;
    };
    let authority_start = scheme_end + 3;
    let authority_end = url[authority_start..]
        .find(['/', '?', '#'])
        .map(|i| authority_start + i)
        .unwrap_or(url.len());
    &url[..authority_end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value() {
        let cookies = "sessionid=abc; csrftoken=tok%2Ben; theme=dark";
        assert_eq!(cookie_value(cookies, "csrftoken").as_deref(), Some("tok+en"));
        assert_eq!(cookie_value(cookies, "theme").as_deref(), Some("dark"));
        assert_eq!(cookie_value(cookies, "missing"), None);
        // A longer name sharing the prefix is not a match
        assert_eq!(cookie_value("csrftokenx=1", "csrftoken"), None);
    }

    #[test]
    fn test_relative_urls_are_same_origin() {
        assert!(attaches_csrf("/tasks/1/move/", "https://board.example.com"));
        assert!(attaches_csrf("tasks/1/move/", "https://board.example.com"));
    }

    #[test]
    fn test_absolute_urls() {
        let origin = "https://board.example.com";
        assert!(attaches_csrf("https://board.example.com/tasks/1/move/", origin));
        assert!(attaches_csrf("HTTPS://Board.Example.com?x=1", origin));
        assert!(!attaches_csrf("https://evil.example.net/tasks/1/move/", origin));
        assert!(!attaches_csrf("http://board.example.com/tasks/", origin));
        assert!(!attaches_csrf("https://board.example.com:8443/tasks/", origin));
    }

    #[test]
    fn test_protocol_relative_urls() {
        let origin = "https://board.example.com";
        assert!(attaches_csrf("//board.example.com/tasks/", origin));
        assert!(!attaches_csrf("//cdn.example.net/tasks/", origin));
    }
}
