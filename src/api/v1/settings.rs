use axum::{extract::State, http::HeaderMap, Extension, Json};

use crate::api::common::extractors::ApiJson;
use crate::api::common::middleware::CurrentUser;
use crate::api::common::utils::timeout_query;
use crate::api::common::ApiResponse;
use crate::authentication::claims::Capability;
use crate::errors::AppError;
use crate::store::settings::{self, SettingsUpdate, SettingsView};
use crate::InnerState;

use super::{actions, authorize, authorize_action};

pub async fn get_settings(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<SettingsView>>, AppError> {
    authorize(&user, Capability::ManageOptions)?;

    let settings = timeout_query(settings::load(&state.db)).await?;
    Ok(ApiResponse::success(settings.public_view()))
}

#[tracing::instrument(name = "Save settings handler", skip_all)]
pub async fn save_settings(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    ApiJson(update): ApiJson<SettingsUpdate>,
) -> Result<Json<ApiResponse<SettingsView>>, AppError> {
    authorize_action(
        &state,
        &user,
        &headers,
        Capability::ManageOptions,
        actions::SAVE_SETTINGS,
    )?;

    let settings = timeout_query(settings::save(&state.db, &update)).await?;
    Ok(ApiResponse::success(settings.public_view()))
}
