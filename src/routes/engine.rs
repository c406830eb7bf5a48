use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::services::attempt_source::PgAttemptSource;
use crate::services::file_store::PgFileStore;
use crate::services::quiz_store::PgQuizStore;
use crate::services::review_service::ReviewService;
use crate::services::settings_service::SettingsService;
use crate::AppState;

/// Hook called by the host quiz engine when a candidate submits an attempt.
#[axum::debug_handler]
pub async fn attempt_submitted(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> Result<Response> {
    let settings_service = SettingsService::new(state.pool.clone());
    let settings = settings_service.load().await?;
    let cipher_key = settings_service.cipher_key().await?;

    let service = ReviewService::new(
        PgQuizStore::new(state.pool.clone()),
        PgFileStore::new(state.pool.clone()),
        PgAttemptSource::new(state.pool.clone()),
    );
    let outcome = service
        .attempt_submitted(attempt_id, &settings, &cipher_key)
        .await?;
    Ok(Json(outcome).into_response())
}
