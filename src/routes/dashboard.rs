use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::auth::AuthUser;
use crate::db::operations::syllabus::list_subjects;
use crate::db::operations::test_record::{list_test_records, TestRecordFilter};
use crate::response::AppError;
use crate::services::dashboard::{compute_dashboard, DashboardStats};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(stats))
}

async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardStats>, AppError> {
    let pool = state.db_proxy().pool();
    let subjects = list_subjects(pool, &user.id)
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;
    let tests = list_test_records(pool, &user.id, &TestRecordFilter::default())
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;
    Ok(Json(compute_dashboard(&subjects, &tests)))
}
