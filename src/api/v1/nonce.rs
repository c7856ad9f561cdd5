use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::common::middleware::CurrentUser;
use crate::api::common::ApiResponse;
use crate::authentication::nonce::create_nonce;
use crate::errors::AppError;
use crate::InnerState;

use super::actions;

#[derive(Debug, Deserialize)]
pub struct NonceQuery {
    pub action: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedNonce {
    pub action: String,
    pub nonce: String,
}

/// Issues a nonce for the caller (or for an anonymous visitor) and one action.
pub async fn issue_nonce(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<NonceQuery>,
) -> Result<Json<ApiResponse<IssuedNonce>>, AppError> {
    let action = query.action.trim();
    if !actions::ALL.contains(&action) {
        return Err(AppError::Validation(format!("Unknown action: {}", action)));
    }

    let nonce = create_nonce(action, user.user_id(), &state.config.nonce_secret, Utc::now());

    Ok(ApiResponse::success(IssuedNonce {
        action: action.to_string(),
        nonce,
    }))
}
