use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Extension, Json, Router};

use crate::auth::AuthUser;
use crate::response::AppError;
use crate::routes::parse_json_body;
use crate::services::mentor::{self, MentorError, MentorReply, MentorRequest};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

async fn chat(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<MentorReply>, AppError> {
    let request: MentorRequest = parse_json_body(&body)?;
    let system_prompt = &state.config().mentor_system_prompt;

    match mentor::ask(state.llm(), system_prompt, &request).await {
        Ok(reply) => Ok(Json(reply)),
        Err(MentorError::EmptyPrompt) => Err(AppError::validation("Prompt is required")),
        Err(MentorError::NotConfigured) => {
            Err(AppError::service_unavailable("AI mentor is not configured"))
        }
        Err(MentorError::Upstream(err)) => {
            tracing::warn!(user_id = %user.id, error = %err, "mentor upstream call failed");
            Err(AppError::bad_gateway(
                "Sorry, I encountered an error connecting to the AI service.",
            ))
        }
    }
}
