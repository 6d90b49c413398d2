use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One prospective customer, unique across channels.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    /// `messenger`, `whatsapp` or `meta_ad`.
    pub source: String,
    /// Geofencing verdict, written by an external batch process.
    pub is_filtered: bool,
    /// Most recent inbound contact; gates the WhatsApp 24h session window.
    pub last_interaction_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateLead {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub source: String,
}

pub const SOURCE_MESSENGER: &str = "messenger";
pub const SOURCE_WHATSAPP: &str = "whatsapp";
pub const SOURCE_META_AD: &str = "meta_ad";
