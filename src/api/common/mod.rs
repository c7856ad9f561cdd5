//! Shared pieces of the HTTP surface.

pub mod extractors;
pub mod middleware;
pub mod tracing;
pub mod utils;

use axum::Json;
use serde::{Deserialize, Serialize};

/// Envelope every JSON endpoint answers with. Errors produce the same shape
/// from `AppError::into_response`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}
