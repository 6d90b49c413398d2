use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::{
    config::get_config,
    dto::webhook_dto::{VerifyParams, WebhookPayload},
    error::{Error, Result},
    models::message::{is_wire_status, CreateMessage, STATUS_DELIVERED, STATUS_SENT},
    services::event_service::{self, InboundEvent},
    utils::signature::verify_meta_signature,
    AppState,
};

/// Subscription handshake: echo `hub.challenge` when mode and token match.
pub async fn verify_webhook(Query(params): Query<VerifyParams>) -> Response {
    let config = get_config();
    let mode_ok = params.mode.as_deref() == Some("subscribe");
    let token_ok = params.verify_token.as_deref() == Some(config.meta_verify_token.as_str());
    match (mode_ok && token_ok, params.challenge) {
        (true, Some(challenge)) => {
            info!("Webhook subscription verified");
            (StatusCode::OK, challenge).into_response()
        }
        _ => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
    }
}

/// Webhook delivery dispatcher.
///
/// Verification failures are hard 401s: the provider must not believe a
/// forged delivery was accepted. Every failure past verification is logged
/// and converted to a success acknowledgment, because a non-2xx makes the
/// provider redeliver the same event indefinitely, which is worse than
/// dropping one event with a server-side log entry.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    // Verify over the exact raw bytes before any parsing.
    if !verify_meta_signature(&get_config().meta_app_secret, &body, signature) {
        return Error::Unauthorized("invalid_signature".to_string()).into_response();
    }

    if let Err(e) = process_delivery(&state, &body).await {
        error!(error = ?e, "Webhook processing failed; acknowledging anyway");
    }

    (StatusCode::OK, Json(json!({ "success": true }))).into_response()
}

async fn process_delivery(state: &AppState, body: &[u8]) -> Result<()> {
    let payload: WebhookPayload = serde_json::from_slice(body)?;

    match event_service::classify(&payload) {
        InboundEvent::Messenger {
            psid,
            mid,
            text,
            attachment,
            is_echo,
        } => {
            let lead_id = match state.lead_service.find_by_messenger_psid(&psid).await? {
                Some(id) => id,
                None => {
                    let profile = state.graph_service.fetch_messenger_profile(&psid).await;
                    state.lead_service.resolve_messenger(&psid, profile).await?
                }
            };

            let body_text = text.unwrap_or_else(|| {
                attachment
                    .as_ref()
                    .map(|(kind, _)| event_service::fallback_label(kind).to_string())
                    .unwrap_or_default()
            });
            let metadata = attachment.as_ref().map(|(kind, url)| {
                json!({ "media_url": url, "media_type": kind })
            });
            let (direction, sender, status) = if is_echo {
                ("outbound", "page", STATUS_SENT)
            } else {
                ("inbound", "user", STATUS_DELIVERED)
            };
            state
                .message_service
                .create(CreateMessage {
                    lead_id,
                    sender: sender.to_string(),
                    body: body_text,
                    direction: direction.to_string(),
                    status: status.to_string(),
                    wa_message_id: mid,
                    metadata,
                })
                .await?;
            if !is_echo {
                state.lead_service.touch_last_interaction(lead_id).await?;
            }
        }

        InboundEvent::LeadSubmission { leadgen_id } => {
            if state
                .lead_service
                .find_by_leadgen_id(&leadgen_id)
                .await?
                .is_some()
            {
                debug!(%leadgen_id, "Lead submission already ingested");
                return Ok(());
            }
            // Field data is not inline in the webhook; a failed fetch falls
            // back to a placeholder lead rather than blocking creation.
            let fields = match state.graph_service.fetch_lead_fields(&leadgen_id).await {
                Ok(fields) => fields,
                Err(e) => {
                    tracing::warn!(%leadgen_id, error = ?e, "Lead field fetch failed");
                    Vec::new()
                }
            };
            let lead_id = state
                .lead_service
                .resolve_lead_ad(&leadgen_id, &fields)
                .await?;

            if state.sheet_service.is_enabled() {
                if let Some(lead) = state.lead_service.get_lead(lead_id).await? {
                    let sheets = state.sheet_service.clone();
                    tokio::spawn(async move {
                        sheets.sync_lead(&lead).await;
                    });
                }
            }
        }

        InboundEvent::StatusUpdate {
            wa_message_id,
            status,
        } => {
            // An unrecognized status would trip the column constraint;
            // drop it instead of failing the whole delivery.
            if !is_wire_status(&status) {
                warn!(%wa_message_id, %status, "Ignoring unrecognized delivery status");
                return Ok(());
            }
            let applied = state
                .message_service
                .update_status(&wa_message_id, &status)
                .await?;
            if !applied {
                debug!(%wa_message_id, %status, "Status update matched no row or was a replay");
            }
        }

        InboundEvent::WhatsAppMessage {
            wa_number,
            contact,
            wa_message_id,
            kind,
            text,
            media,
        } => {
            let lead_id = state
                .lead_service
                .resolve_whatsapp(&wa_number, contact.as_ref())
                .await?;

            let mut metadata = None;
            if let Some(media_ref) = &media {
                let stored_url = state
                    .media_service
                    .fetch_and_store(&media_ref.media_id, media_ref.mime_type.as_deref())
                    .await;
                metadata = Some(json!({
                    "media_url": stored_url,
                    "media_type": kind,
                }));
            }
            let body_text = text
                .or_else(|| media.as_ref().and_then(|m| m.caption.clone()))
                .unwrap_or_else(|| event_service::fallback_label(&kind).to_string());

            state
                .message_service
                .create(CreateMessage {
                    lead_id,
                    sender: "user".to_string(),
                    body: body_text,
                    direction: "inbound".to_string(),
                    status: STATUS_DELIVERED.to_string(),
                    wa_message_id: Some(wa_message_id),
                    metadata,
                })
                .await?;
            state.lead_service.touch_last_interaction(lead_id).await?;
        }

        InboundEvent::Unsupported => {
            debug!("Ignoring unsupported webhook payload shape");
        }
    }

    Ok(())
}
