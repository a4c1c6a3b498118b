//! Client-side directives answered by web-mode mutations.
//!
//! The page submits forms over XHR and evaluates the response, so a
//! successful mutation answers with a short script instead of a redirect.

use axum::http::header;
use axum::response::{IntoResponse, Response};

/// Script telling the page what to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Reload the current page.
    Reload,
    /// Navigate to another location.
    RedirectTo(String),
}

impl Directive {
    #[must_use]
    pub fn script(&self) -> String {
        match self {
            Self::Reload => "window.location.reload();".to_string(),
            Self::RedirectTo(location) => {
                // A JSON string is a valid JS string literal.
                let literal = serde_json::Value::from(location.as_str()).to_string();
                format!("window.location.assign({literal});")
            }
        }
    }
}

impl IntoResponse for Directive {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, "application/javascript")],
            self.script(),
        )
            .into_response()
    }
}
