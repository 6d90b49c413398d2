use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SendTextPayload {
    #[serde(alias = "leadId")]
    pub lead_id: Option<Uuid>,
    #[serde(alias = "message")]
    #[validate(length(min = 1, max = 4096))]
    pub text: Option<String>,
    /// WhatsApp recipient phone number.
    #[serde(alias = "recipientWaId")]
    #[validate(length(min = 5, max = 20))]
    pub recipient_wa_id: Option<String>,
    /// Messenger page-scoped id; no session-window restriction on this route.
    #[serde(alias = "recipientId")]
    #[validate(length(min = 1))]
    pub recipient_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendTemplatePayload {
    #[serde(alias = "leadId")]
    pub lead_id: Option<Uuid>,
    #[serde(alias = "templateName")]
    #[validate(length(min = 1, max = 512))]
    pub template_name: Option<String>,
    #[serde(alias = "recipientWaId")]
    #[validate(length(min = 5, max = 20))]
    pub recipient_wa_id: Option<String>,
    #[serde(default = "default_template_language")]
    #[validate(length(min = 2, max = 10))]
    pub language: String,
}

fn default_template_language() -> String {
    "de".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMediaPayload {
    #[serde(alias = "leadId")]
    pub lead_id: Option<Uuid>,
    #[serde(alias = "mediaUrl")]
    #[validate(url)]
    pub media_url: Option<String>,
    #[validate(length(max = 1024))]
    pub caption: Option<String>,
    #[serde(alias = "recipientWaId")]
    #[validate(length(min = 5, max = 20))]
    pub recipient_wa_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMessagePayload {
    #[serde(alias = "messageId")]
    pub message_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotesPayload {
    pub notes: Option<String>,
}
