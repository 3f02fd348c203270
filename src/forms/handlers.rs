use axum::{extract::State, routing::post, Json, Router};
use tracing::{instrument, warn};

use super::dto::SubmitFormsRequest;
use crate::{
    auth::AuthPatient,
    error::{AppError, MessageResponse},
    extract::ApiJson,
    state::AppState,
};

pub fn forms_routes() -> Router<AppState> {
    Router::new().route("/submit_forms", post(submit_forms))
}

#[instrument(skip(state, payload))]
pub async fn submit_forms(
    State(state): State<AppState>,
    AuthPatient(subject): AuthPatient,
    ApiJson(payload): ApiJson<SubmitFormsRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if !subject.eq_ignore_ascii_case(payload.email.trim()) {
        warn!(subject = %subject, email = %payload.email, "forms submitted for another patient");
    }

    let submission = state.forms.submit(&payload.email, payload.forms).await?;
    if !submission.is_synced() {
        return Err(AppError::Upstream);
    }
    Ok(Json(MessageResponse::new("Forms submitted successfully!")))
}
