//! Try-on generation route handler.

use axum::{Json, extract::State};
use tracing::instrument;
use tryon_core::{TryOnRequest, TryOnResponse};

use crate::error::{AppError, set_sentry_user};
use crate::extract::ApiJson;
use crate::state::AppState;

/// Generate a try-on image.
///
/// Blocks until synthesis, optional upscale and upload have finished.
#[instrument(skip(state, request), fields(user_id = %request.user_id, category = %request.category))]
pub async fn generate_tryon(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TryOnRequest>,
) -> Result<Json<TryOnResponse>, AppError> {
    set_sentry_user(&request.user_id);

    let result_image_url = state.tryon().generate(&request).await?;

    Ok(Json(TryOnResponse { result_image_url }))
}
