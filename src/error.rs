//! Unified client error model and mapping helpers.
//! One enum covers form validation, backend request failures, authorization
//! failures, transport and durable-storage problems, so every failure path
//! resolves to something a page can render (banner, denial view or redirect).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field name -> message, as shown inline next to form inputs.
pub type FieldErrors = BTreeMap<String, String>;

/// Code given to backend failures whose body carried no message of its own.
pub const NO_DETAIL: &str = "no_detail";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    #[error("{code}: {message}")]
    Validation { code: String, message: String, fields: FieldErrors },
    #[error("{code}: {message}")]
    Request { code: String, message: String, status: u16 },
    #[error("{code}: {message}")]
    Unauthorized { code: String, message: String },
    #[error("{code}: {message}")]
    Forbidden { code: String, message: String },
    #[error("{code}: {message}")]
    NotFound { code: String, message: String },
    #[error("{code}: {message}")]
    Transport { code: String, message: String },
    #[error("{code}: {message}")]
    Storage { code: String, message: String },
    #[error("{code}: {message}")]
    Config { code: String, message: String },
    #[error("{code}: {message}")]
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Validation { code, .. }
            | AppError::Request { code, .. }
            | AppError::Unauthorized { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Transport { code, .. }
            | AppError::Storage { code, .. }
            | AppError::Config { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message, .. }
            | AppError::Request { message, .. }
            | AppError::Unauthorized { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Transport { message, .. }
            | AppError::Storage { message, .. }
            | AppError::Config { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn validation(fields: FieldErrors) -> Self {
        let message = match fields.len() {
            1 => fields.values().next().cloned().unwrap_or_default(),
            n => format!("{n} fields need attention"),
        };
        AppError::Validation { code: "validation".into(), message, fields }
    }
    pub fn field<F: Into<String>, S: Into<String>>(field: F, msg: S) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.into(), msg.into());
        AppError::validation(fields)
    }
    pub fn request<S: Into<String>>(status: u16, msg: S) -> Self { AppError::Request { code: "request_failed".into(), message: msg.into(), status } }
    pub fn unauthorized<S: Into<String>>(msg: S) -> Self { AppError::Unauthorized { code: "unauthorized".into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(msg: S) -> Self { AppError::Forbidden { code: "forbidden".into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(msg: S) -> Self { AppError::NotFound { code: "not_found".into(), message: msg.into() } }
    pub fn transport<S: Into<String>>(code: S, msg: S) -> Self { AppError::Transport { code: code.into(), message: msg.into() } }
    pub fn storage<S: Into<String>>(code: S, msg: S) -> Self { AppError::Storage { code: code.into(), message: msg.into() } }
    pub fn config<S: Into<String>>(code: S, msg: S) -> Self { AppError::Config { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Classify a non-success HTTP status returned by the backend.
    pub fn from_status<S: Into<String>>(status: u16, msg: S) -> Self {
        match status {
            401 => AppError::unauthorized(msg),
            403 => AppError::forbidden(msg),
            404 => AppError::not_found(msg),
            s => AppError::request(s, msg),
        }
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Validation { .. } => 400,
            AppError::Request { status, .. } => *status,
            AppError::Unauthorized { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::NotFound { .. } => 404,
            AppError::Transport { .. } => 503,
            AppError::Storage { .. } | AppError::Config { .. } | AppError::Internal { .. } => 500,
        }
    }

    pub fn with_code<S: Into<String>>(mut self, new_code: S) -> Self {
        match &mut self {
            AppError::Validation { code, .. }
            | AppError::Request { code, .. }
            | AppError::Unauthorized { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Transport { code, .. }
            | AppError::Storage { code, .. }
            | AppError::Config { code, .. }
            | AppError::Internal { code, .. } => *code = new_code.into(),
        }
        self
    }

    /// Text to show the user: the backend's own message or a form error when
    /// there is one, `fallback` for everything else.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Validation { message, .. } => message.clone(),
            AppError::Request { code, message, .. }
            | AppError::Unauthorized { code, message }
            | AppError::Forbidden { code, message }
            | AppError::NotFound { code, message }
                if code != NO_DETAIL && !message.is_empty() =>
            {
                message.clone()
            }
            _ => fallback.to_string(),
        }
    }

    /// Same kind, with the message replaced by [`AppError::user_message`].
    pub fn into_user_facing(self, fallback: &str) -> AppError {
        let msg = self.user_message(fallback);
        match self {
            AppError::Validation { code, fields, .. } => AppError::Validation { code, message: msg, fields },
            AppError::Request { code, status, .. } => AppError::Request { code, message: msg, status },
            AppError::Unauthorized { code, .. } => AppError::Unauthorized { code, message: msg },
            AppError::Forbidden { code, .. } => AppError::Forbidden { code, message: msg },
            AppError::NotFound { code, .. } => AppError::NotFound { code, message: msg },
            AppError::Transport { code, .. } => AppError::Transport { code, message: msg },
            AppError::Storage { code, .. } => AppError::Storage { code, message: msg },
            AppError::Config { code, .. } => AppError::Config { code, message: msg },
            AppError::Internal { code, .. } => AppError::Internal { code, message: msg },
        }
    }

    pub fn is_unauthorized(&self) -> bool { matches!(self, AppError::Unauthorized { .. }) }

    /// Per-field messages for validation failures; empty for everything else.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return AppError::from_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return AppError::transport("decode_error".to_string(), err.to_string());
        }
        AppError::transport("transport_error".to_string(), err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::storage("io_error".to_string(), err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::transport("decode_error".to_string(), err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as Internal unless downcasted elsewhere
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(other) => AppError::internal("internal".to_string(), other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
