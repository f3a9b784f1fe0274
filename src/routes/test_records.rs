use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::operations::test_record::TestRecord;
use crate::response::AppError;
use crate::routes::parse_json_body;
use crate::services::test_records::{self, TestRecordError, TestRecordInput};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", delete(remove))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    subject_id: Option<String>,
    #[serde(rename = "type")]
    test_type: Option<String>,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

impl From<TestRecordError> for AppError {
    fn from(err: TestRecordError) -> Self {
        match err {
            TestRecordError::Invalid(message) => AppError::validation(message),
            TestRecordError::Duplicate => AppError::conflict("A test with this id already exists"),
            TestRecordError::Database(err) => AppError::internal(err.to_string()),
        }
    }
}

async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<TestRecord>>, AppError> {
    let filter = test_records::parse_filter(query.subject_id, query.test_type)?;
    let records = test_records::list(state.db_proxy().pool(), &user.id, &filter).await?;
    Ok(Json(records))
}

async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<TestRecord>, AppError> {
    let input: TestRecordInput = parse_json_body(&body)?;
    let record = test_records::create(state.db_proxy().pool(), &user.id, input).await?;
    Ok(Json(record))
}

async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    test_records::delete(state.db_proxy().pool(), &user.id, &id).await?;
    Ok(Json(MessageResponse { message: "Deleted" }))
}
