use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{dto::send_dto::UpdateNotesPayload, error::Result, AppState};

pub async fn list_leads(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let leads = state.lead_service.list_leads().await?;
    Ok(Json(leads))
}

pub async fn get_lead_messages(
    State(state): State<AppState>,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let messages = state.message_service.get_by_lead(lead_id).await?;
    Ok(Json(messages))
}

pub async fn update_notes(
    State(state): State<AppState>,
    Path(lead_id): Path<Uuid>,
    Json(payload): Json<UpdateNotesPayload>,
) -> Result<impl IntoResponse> {
    let lead = state
        .lead_service
        .update_notes(lead_id, payload.notes.as_deref())
        .await?
        .ok_or_else(|| crate::error::Error::NotFound("Lead not found".to_string()))?;
    Ok(Json(lead))
}
