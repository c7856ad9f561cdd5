use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error as StdError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(#[source] anyhow::Error),

    #[error("Permission denied: {0}")]
    Permission(#[source] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("External service error: {0}")]
    ExternalService(#[source] anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Permission(_) => StatusCode::FORBIDDEN,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Provider failures are passed through as-is
    /// so the editor sees e.g. "Video not found" rather than a generic error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Authentication(e) => format!("{}", e),
            AppError::Permission(e) => format!("{}", e),
            AppError::Database(_) => "Database error".to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::ExternalService(e) => format!("{}", e),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Timeout(e) => format!("Operation timed out: {}", e),
            AppError::Unexpected(_) => "An unexpected error occurred".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = self.user_message();

        tracing::error!(
            error_type = %self,
            error_message = %error_message,
            status_code = %status,
            "Request error"
        );

        if let AppError::Unexpected(e) | AppError::Database(e) = &self {
            let mut source_chain = String::new();
            let mut current_err: Option<&(dyn StdError + 'static)> = Some(e.as_ref());
            while let Some(err) = current_err {
                source_chain.push_str(&format!("\n  Caused by: {}", err));
                current_err = err.source();
            }
            if !source_chain.is_empty() {
                tracing::error!("Error source chain:{}", source_chain);
            }
        }

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Database record not found".to_string()),
            _ => AppError::Database(anyhow::Error::new(err).context("SQLx operation failed")),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let error_type = match &err {
            e if e.is_timeout() => "Request Timeout",
            e if e.is_connect() => "Connection Failed",
            e if e.is_decode() => "Response Decode Failed",
            e if e.is_redirect() => "Redirect Loop or Invalid Redirect",
            e if e.is_request() => "Invalid Request",
            e if e.is_body() => "Request Body Error",
            _ => "Unknown HTTP Error",
        };

        tracing::error!(
            error = %err,
            status = ?err.status(),
            is_timeout = err.is_timeout(),
            is_connect = err.is_connect(),
            is_decode = err.is_decode(),
            error_type = error_type,
            "HTTP request failed with detailed context"
        );

        // The URL carries the provider API key, so it stays out of the message.
        AppError::ExternalService(anyhow::Error::new(err.without_url()).context(format!(
            "Failed to fetch YouTube data ({})",
            error_type
        )))
    }
}
