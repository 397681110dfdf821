//! Error and redirect responses.
//!
//! # Responsibilities
//! - Render handler errors as JSON
//! - Render 404 / 405 when nothing matched
//! - Render redirect routes
//!
//! # Design Decisions
//! - Server errors hide their message unless debug is on
//! - 405 always carries an `Allow` header listing the methods the path accepts

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::http::handler::HandlerError;
use crate::routing::{MatchOutcome, Redirect};

/// Turns errors into responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorResponder {
    debug: bool,
}

impl ErrorResponder {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn render(&self, error: &HandlerError) -> Response {
        let status = error.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %error, "Request failed");
        }

        let message = if status.is_server_error() && !self.debug {
            status.canonical_reason().unwrap_or("Internal Server Error").to_string()
        } else {
            error.message().to_string()
        };

        let mut body = json!({ "error": message, "status": status.as_u16() });
        if self.debug {
            body["causes"] = json!(error.causes());
        }
        (status, Json(body)).into_response()
    }

    /// 404 or 405 for an outcome that did not match.
    pub fn not_matched(&self, outcome: &MatchOutcome) -> Response {
        match outcome {
            MatchOutcome::MethodNotAllowed { allowed } => self.method_not_allowed(allowed),
            _ => self.not_found(),
        }
    }

    pub fn not_found(&self) -> Response {
        let status = StatusCode::NOT_FOUND;
        (status, Json(json!({ "error": "Not Found", "status": status.as_u16() }))).into_response()
    }

    pub fn method_not_allowed(&self, allowed: &[Method]) -> Response {
        let status = StatusCode::METHOD_NOT_ALLOWED;
        let allow = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let mut response = (
            status,
            Json(json!({ "error": "Method Not Allowed", "status": status.as_u16() })),
        )
            .into_response();
        if let Ok(value) = HeaderValue::from_str(&allow) {
            response.headers_mut().insert(header::ALLOW, value);
        }
        response
    }
}

/// Response for a redirect route.
pub fn redirect(redirect: &Redirect) -> Response {
    let status = StatusCode::from_u16(redirect.status).unwrap_or(StatusCode::FOUND);
    match HeaderValue::from_str(&redirect.to) {
        Ok(location) => (status, [(header::LOCATION, location)]).into_response(),
        Err(_) => {
            tracing::error!(to = %redirect.to, "Redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_server_error_hidden_without_debug() {
        let error = HandlerError::internal("database password is hunter2");

        let response = ErrorResponder::new(false).render(&error);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal Server Error");
        assert!(body.get("causes").is_none());

        let body = body_json(ErrorResponder::new(true).render(&error)).await;
        assert_eq!(body["error"], "database password is hunter2");
        assert_eq!(body["causes"][0], "database password is hunter2");
    }

    #[tokio::test]
    async fn test_client_error_message_always_shown() {
        let error = HandlerError::bad_request("page must be a number");
        let body = body_json(ErrorResponder::new(false).render(&error)).await;
        assert_eq!(body["error"], "page must be a number");
        assert_eq!(body["status"], 400);
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let response = ErrorResponder::default().method_not_allowed(&[Method::GET, Method::POST]);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, POST");
    }

    #[test]
    fn test_redirect_response() {
        let response = redirect(&Redirect {
            to: "/new".into(),
            status: 301,
        });
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "/new");
    }
}
