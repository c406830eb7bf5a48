use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::report_dto::ReportActionRequest;
use crate::error::{Error, Result};
use crate::middleware::auth::{Claims, ReportContext};
use crate::models::stored_file::MIME_XLSX;
use crate::services::archive_service::{ArchiveService, ZipPasswords};
use crate::services::archive_state::ArchiveAction;
use crate::services::attempt_source::PgAttemptSource;
use crate::services::file_store::PgFileStore;
use crate::services::quiz_store::PgQuizStore;
use crate::services::settings_service::SettingsService;
use crate::services::user_directory::PgUserDirectory;
use crate::AppState;

/// Download responses carry a fixed cache lifetime.
const DOWNLOAD_CACHE_CONTROL: &str = "private, max-age=86200";

fn archive_service(
    state: &AppState,
) -> ArchiveService<PgQuizStore, PgFileStore, PgAttemptSource, PgUserDirectory> {
    ArchiveService::new(
        PgQuizStore::new(state.pool.clone()),
        PgFileStore::new(state.pool.clone()),
        PgAttemptSource::new(state.pool.clone()),
        PgUserDirectory::new(state.pool.clone()),
    )
}

fn attachment(filename: &str, mimetype: &str, content: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mimetype.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
            (
                header::CACHE_CONTROL,
                DOWNLOAD_CACHE_CONTROL.to_string(),
            ),
        ],
        content,
    )
        .into_response()
}

#[axum::debug_handler]
pub async fn report_view(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Response> {
    let ctx = ReportContext::from_claims(&claims);
    let settings = SettingsService::new(state.pool.clone()).load().await?;
    let view = archive_service(&state)
        .report(quiz_id, &ctx, &settings)
        .await?;
    Ok(Json(view).into_response())
}

#[axum::debug_handler]
pub async fn perform_action(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<Uuid>,
    Json(payload): Json<ReportActionRequest>,
) -> Result<Response> {
    payload.validate()?;
    let Some(action) = ArchiveAction::parse(&payload.action) else {
        return Err(Error::BadRequest(format!(
            "Unknown action: {}",
            payload.action
        )));
    };

    let ctx = ReportContext::from_claims(&claims);
    ctx.require(action.required_capability())?;

    let service = archive_service(&state);
    if action == ArchiveAction::DownloadGrades {
        let (filename, bytes) = service.grades_download(quiz_id, &ctx).await?;
        return Ok(attachment(&filename, MIME_XLSX, bytes));
    }

    let settings = SettingsService::new(state.pool.clone()).load().await?;
    let passwords = payload.password.map(|password| ZipPasswords {
        password,
        confirm: payload.password_confirm.unwrap_or_default(),
    });

    let report = service
        .perform(quiz_id, action, &ctx, &settings, passwords.as_ref())
        .await?;

    Ok(Json(json!({
        "performed": report.performed(),
        "action": report.action,
        "outcome": report.outcome,
        "notices": report.notices,
    }))
    .into_response())
}

#[axum::debug_handler]
pub async fn download_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((quiz_id, category, path)): Path<(Uuid, String, String)>,
) -> Result<Response> {
    let ctx = ReportContext::from_claims(&claims);

    let (filepath, filename) = match path.rsplit_once('/') {
        Some((dir, name)) => (format!("/{}/", dir), name.to_string()),
        None => ("/".to_string(), path),
    };

    let file = archive_service(&state)
        .download(quiz_id, &category, &filepath, &filename, &ctx)
        .await?;
    Ok(attachment(&file.filename, &file.mimetype, file.content))
}
