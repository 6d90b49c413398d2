//! Raw serde shapes for Meta webhook deliveries (Graph API v21.0).
//! Messenger, WhatsApp Business and Lead Ads all post the same outer
//! envelope; the inner optional fields decide which channel it is
//! (see `services::event_service::classify`).

use serde::Deserialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub object: Option<String>,
    pub entry: Option<Vec<WebhookEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEntry {
    pub id: Option<String>,
    pub messaging: Option<Vec<MessagingEvent>>,
    pub changes: Option<Vec<WebhookChange>>,
}

// --- Messenger ---

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingEvent {
    pub sender: Option<MessagingParty>,
    pub recipient: Option<MessagingParty>,
    pub message: Option<MessengerMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingParty {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessengerMessage {
    pub mid: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub is_echo: bool,
    pub attachments: Option<Vec<MessengerAttachment>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessengerAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Option<AttachmentPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentPayload {
    pub url: Option<String>,
}

// --- Lead Ads / WhatsApp (both arrive under entry[].changes[]) ---

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookChange {
    pub field: Option<String>,
    pub value: Option<ChangeValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeValue {
    /// Lead Ads: numeric in the wire format, so kept as raw JSON.
    pub leadgen_id: Option<JsonValue>,
    pub form_id: Option<JsonValue>,
    pub statuses: Option<Vec<WaStatusEvent>>,
    pub messages: Option<Vec<WaInboundMessage>>,
    /// Sender contact blocks, kept as raw JSON so the identity row can
    /// store the provider payload verbatim.
    pub contacts: Option<Vec<JsonValue>>,
    pub metadata: Option<WaMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaMetadata {
    pub display_phone_number: Option<String>,
    pub phone_number_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaStatusEvent {
    pub id: String,
    pub status: String,
    pub recipient_id: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaInboundMessage {
    pub from: String,
    pub id: String,
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: Option<WaTextBody>,
    pub image: Option<WaMediaBody>,
    pub video: Option<WaMediaBody>,
    pub document: Option<WaMediaBody>,
    pub audio: Option<WaMediaBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaTextBody {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaMediaBody {
    pub id: String,
    pub mime_type: Option<String>,
    pub caption: Option<String>,
    pub filename: Option<String>,
}

/// Query parameters for the GET subscription handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}
