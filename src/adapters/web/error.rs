//! HTTP error responses for web adapter.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::domain::error::SignalPulseError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &SignalPulseError) -> StatusCode {
    match err {
        SignalPulseError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        SignalPulseError::NoSignalFiles { .. } | SignalPulseError::SignalParse { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SignalPulseError::ConfigMissing { .. }
        | SignalPulseError::ConfigInvalid { .. }
        | SignalPulseError::ConfigParse { .. }
        | SignalPulseError::Database { .. }
        | SignalPulseError::DatabaseQuery { .. }
        | SignalPulseError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SignalPulseError> for WebError {
    fn from(err: SignalPulseError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, "request failed");
        }
        let template = super::templates::ErrorTemplate {
            message: &self.message,
            status: self.status.as_u16(),
        };
        match template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ParamError;

    #[test]
    fn signal_errors_are_unprocessable() {
        let err = WebError::from(SignalPulseError::NoSignalFiles { dir: "x".into() });
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message, "no signal files found in x");
    }

    #[test]
    fn parameter_errors_are_bad_requests() {
        let err = WebError::from(SignalPulseError::from(ParamError::Empty { field: "delta" }));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_errors_are_internal() {
        let err = WebError::from(SignalPulseError::Database {
            reason: "locked".into(),
        });
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_response_renders_page() {
        let response = WebError::not_found("Page not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
