use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::operations::syllabus::Subject;
use crate::response::AppError;
use crate::routes::parse_json_body;
use crate::services::syllabus::{self, InitializeOutcome, SeedOutcome, SyllabusError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/:subject_id/chapters/:chapter_id", patch(update_chapter))
        .route("/seed", post(seed))
        .route("/initialize", post(initialize))
}

#[derive(Debug, Deserialize)]
struct ChapterUpdate {
    #[serde(default)]
    field: String,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct SubjectsResponse {
    message: &'static str,
    subjects: Vec<Subject>,
}

impl From<SyllabusError> for AppError {
    fn from(err: SyllabusError) -> Self {
        match err {
            SyllabusError::Invalid(message) => AppError::validation(message),
            SyllabusError::ChapterNotFound => AppError::not_found("Chapter not found"),
            SyllabusError::Database(err) => AppError::internal(err.to_string()),
        }
    }
}

async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Subject>>, AppError> {
    let subjects = syllabus::get_syllabus(state.db_proxy().pool(), &user.id).await?;
    Ok(Json(subjects))
}

async fn update_chapter(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((subject_id, chapter_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, AppError> {
    let update: ChapterUpdate = parse_json_body(&body)?;
    syllabus::update_chapter(
        state.db_proxy().pool(),
        &user.id,
        &subject_id,
        &chapter_id,
        &update.field,
        &update.value,
    )
    .await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn seed(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let subjects: Vec<Subject> = parse_json_body(&body)?;
    let message = match syllabus::seed(state.db_proxy().pool(), &user.id, &subjects).await? {
        SeedOutcome::AlreadyExists => "Syllabus already exists for this user",
        SeedOutcome::Seeded => "Seeded successfully",
    };
    Ok(Json(MessageResponse { message }))
}

/// An empty body, `null` or `[]` selects the default syllabus.
async fn initialize(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<SubjectsResponse>, AppError> {
    let submitted: Option<Vec<Subject>> = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        parse_json_body(&body)?
    };

    let response = match syllabus::initialize(state.db_proxy().pool(), &user.id, submitted).await? {
        InitializeOutcome::AlreadyInitialized(subjects) => SubjectsResponse {
            message: "Syllabus already initialized",
            subjects,
        },
        InitializeOutcome::Initialized(subjects) => SubjectsResponse {
            message: "Syllabus initialized",
            subjects,
        },
    };
    Ok(Json(response))
}
