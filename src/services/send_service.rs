use crate::error::{Error, Result};
use crate::models::message::{CreateMessage, Message, STATUS_SENT};
use crate::services::event_service::fallback_label;
use crate::services::graph_service::{media_kind_from_url, GraphService};
use crate::services::lead_service::LeadService;
use crate::services::message_service::MessageService;
use crate::utils::time::{now, session_window_open};
use serde_json::json;
use uuid::Uuid;

/// Outbound message gateway. Free-form WhatsApp sends are only attempted
/// inside the 24h session window; templates bypass the window but never
/// advance it, since only a genuine inbound reply re-opens a session.
#[derive(Clone)]
pub struct SendService {
    graph: GraphService,
    leads: LeadService,
    messages: MessageService,
}

impl SendService {
    pub fn new(graph: GraphService, leads: LeadService, messages: MessageService) -> Self {
        Self {
            graph,
            leads,
            messages,
        }
    }

    pub async fn send_text(
        &self,
        lead_id: Uuid,
        text: &str,
        recipient_wa_id: Option<&str>,
        recipient_psid: Option<&str>,
    ) -> Result<Message> {
        match (recipient_wa_id, recipient_psid) {
            (None, None) => Err(Error::BadRequest(
                "Either recipient_wa_id or recipient_id is required".to_string(),
            )),
            (Some(wa_id), _) => {
                let lead = self.lead_or_not_found(lead_id).await?;
                self.require_open_session(lead.last_interaction_at)?;
                let wa_message_id = self.graph.send_wa_text(wa_id, text).await?;
                self.record_outbound(lead_id, text, Some(wa_message_id), None)
                    .await
            }
            (None, Some(psid)) => {
                // Messenger sends are routed by psid and carry no
                // session-window restriction.
                self.lead_or_not_found(lead_id).await?;
                let mid = self.graph.send_messenger_text(psid, text).await?;
                self.record_outbound(lead_id, text, mid, None).await
            }
        }
    }

    pub async fn send_template(
        &self,
        lead_id: Uuid,
        recipient_wa_id: &str,
        template_name: &str,
        language: &str,
    ) -> Result<Message> {
        self.lead_or_not_found(lead_id).await?;

        let wa_message_id = self
            .graph
            .send_wa_template(recipient_wa_id, template_name, language)
            .await?;
        let body = format!("Template: {}", template_name);
        let metadata = json!({ "template_name": template_name, "language": language });
        self.record_outbound(lead_id, &body, Some(wa_message_id), Some(metadata))
            .await
    }

    pub async fn send_media(
        &self,
        lead_id: Uuid,
        recipient_wa_id: &str,
        media_url: &str,
        caption: Option<&str>,
    ) -> Result<Message> {
        let lead = self.lead_or_not_found(lead_id).await?;
        self.require_open_session(lead.last_interaction_at)?;

        let wa_message_id = self
            .graph
            .send_wa_media(recipient_wa_id, media_url, caption)
            .await?;
        let kind = media_kind_from_url(media_url);
        let body = caption
            .map(|c| c.to_string())
            .unwrap_or_else(|| fallback_label(kind).to_string());
        let metadata = json!({ "media_url": media_url, "media_type": kind });
        self.record_outbound(lead_id, &body, Some(wa_message_id), Some(metadata))
            .await
    }

    /// Revoke a message at the provider and mark the local row `deleted`.
    pub async fn delete_message(&self, message_id: Uuid) -> Result<Message> {
        let message = self
            .messages
            .get_by_id(message_id)
            .await?
            .ok_or_else(|| Error::NotFound("Message not found".to_string()))?;
        let wa_message_id = message.wa_message_id.as_deref().ok_or_else(|| {
            Error::BadRequest("Message has no provider id and cannot be revoked".to_string())
        })?;
        let recipient = self
            .leads
            .whatsapp_number(message.lead_id)
            .await?
            .ok_or_else(|| {
                Error::BadRequest("Lead has no WhatsApp number on file".to_string())
            })?;

        self.graph.revoke_wa_message(&recipient, wa_message_id).await?;

        self.messages
            .mark_deleted(message_id)
            .await?
            .ok_or_else(|| Error::NotFound("Message not found".to_string()))
    }

    async fn lead_or_not_found(&self, lead_id: Uuid) -> Result<crate::models::lead::Lead> {
        self.leads
            .get_lead(lead_id)
            .await?
            .ok_or_else(|| Error::NotFound("Lead not found".to_string()))
    }

    fn require_open_session(
        &self,
        last_interaction_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<()> {
        if session_window_open(last_interaction_at, now()) {
            Ok(())
        } else {
            Err(Error::SessionExpired(
                "24h session window has expired; use a template message".to_string(),
            ))
        }
    }

    async fn record_outbound(
        &self,
        lead_id: Uuid,
        body: &str,
        wa_message_id: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<Message> {
        self.messages
            .create(CreateMessage {
                lead_id,
                sender: "page".to_string(),
                body: body.to_string(),
                direction: "outbound".to_string(),
                status: STATUS_SENT.to_string(),
                wa_message_id,
                metadata,
            })
            .await
    }
}
