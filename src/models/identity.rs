use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Binding between one platform-scoped contact handle and a Lead.
/// Each of the three channel keys is unique across all rows when present;
/// the unique constraints are the dedup guard for concurrent first contact.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub messenger_psid: Option<String>,
    pub whatsapp_number: Option<String>,
    pub leadgen_id: Option<String>,
    /// Raw provider profile/field payload, stored verbatim for display.
    pub profile: Option<JsonValue>,
    pub created_at: Option<DateTime<Utc>>,
}
