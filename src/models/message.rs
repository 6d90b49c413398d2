use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// One chat turn. Rows are never removed; "deleted" is a status value
/// because the provider's revoke operation is itself asynchronous.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub lead_id: Uuid,
    /// `user` or `page`.
    pub sender: String,
    pub body: String,
    /// `inbound` or `outbound`.
    pub direction: String,
    /// `sent`, `delivered`, `read`, `failed` or `deleted`.
    pub status: String,
    /// Provider message id; unique when present, the sole lookup key for
    /// status updates and deletions.
    pub wa_message_id: Option<String>,
    /// Media url/type and status-update audit trail.
    pub metadata: Option<JsonValue>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessage {
    pub lead_id: Uuid,
    pub sender: String,
    pub body: String,
    pub direction: String,
    pub status: String,
    pub wa_message_id: Option<String>,
    pub metadata: Option<JsonValue>,
}

pub const STATUS_SENT: &str = "sent";
pub const STATUS_DELIVERED: &str = "delivered";
pub const STATUS_READ: &str = "read";
pub const STATUS_FAILED: &str = "failed";
pub const STATUS_DELETED: &str = "deleted";

/// Status values the provider may deliver over the wire. `deleted` is a
/// local tombstone and is never accepted from a webhook.
pub fn is_wire_status(status: &str) -> bool {
    matches!(
        status,
        STATUS_SENT | STATUS_DELIVERED | STATUS_READ | STATUS_FAILED
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_and_unknown_statuses_are_not_wire_statuses() {
        assert!(is_wire_status(STATUS_DELIVERED));
        assert!(is_wire_status(STATUS_READ));
        assert!(is_wire_status(STATUS_FAILED));
        assert!(!is_wire_status(STATUS_DELETED));
        assert!(!is_wire_status("warning"));
    }
}
