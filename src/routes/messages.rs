use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::send_dto::{
        DeleteMessagePayload, SendMediaPayload, SendTemplatePayload, SendTextPayload,
    },
    error::{Error, Result},
    AppState,
};

pub async fn send_text(
    State(state): State<AppState>,
    Json(payload): Json<SendTextPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let lead_id = payload
        .lead_id
        .ok_or_else(|| Error::BadRequest("lead_id is required".to_string()))?;
    let text = payload
        .text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::BadRequest("text is required".to_string()))?;

    let message = state
        .send_service
        .send_text(
            lead_id,
            text,
            payload.recipient_wa_id.as_deref(),
            payload.recipient_id.as_deref(),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "wa_message_id": message.wa_message_id,
    })))
}

pub async fn send_template(
    State(state): State<AppState>,
    Json(payload): Json<SendTemplatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let lead_id = payload
        .lead_id
        .ok_or_else(|| Error::BadRequest("lead_id is required".to_string()))?;
    let template_name = payload
        .template_name
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::BadRequest("template_name is required".to_string()))?;
    let recipient = payload
        .recipient_wa_id
        .as_deref()
        .filter(|r| !r.is_empty())
        .ok_or_else(|| Error::BadRequest("recipient_wa_id is required".to_string()))?;

    let message = state
        .send_service
        .send_template(lead_id, recipient, template_name, &payload.language)
        .await?;

    Ok(Json(json!({
        "success": true,
        "wa_message_id": message.wa_message_id,
    })))
}

pub async fn send_media(
    State(state): State<AppState>,
    Json(payload): Json<SendMediaPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let lead_id = payload
        .lead_id
        .ok_or_else(|| Error::BadRequest("lead_id is required".to_string()))?;
    let media_url = payload
        .media_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::BadRequest("media_url is required".to_string()))?;
    let recipient = payload
        .recipient_wa_id
        .as_deref()
        .filter(|r| !r.is_empty())
        .ok_or_else(|| Error::BadRequest("recipient_wa_id is required".to_string()))?;

    let message = state
        .send_service
        .send_media(lead_id, recipient, media_url, payload.caption.as_deref())
        .await?;

    Ok(Json(json!({
        "success": true,
        "wa_message_id": message.wa_message_id,
    })))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Json(payload): Json<DeleteMessagePayload>,
) -> Result<impl IntoResponse> {
    let message = state.send_service.delete_message(payload.message_id).await?;
    Ok(Json(json!({ "success": true, "message": message })))
}

pub async fn list_templates(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let templates = state.graph_service.list_templates().await?;
    Ok(Json(json!({ "success": true, "templates": templates })))
}
