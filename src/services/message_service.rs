use crate::error::Result;
use crate::models::message::{CreateMessage, Message, STATUS_DELETED};
use sqlx::PgPool;
use uuid::Uuid;

const MESSAGE_COLUMNS: &str =
    "id, lead_id, sender, body, direction, status, wa_message_id, metadata, created_at";

#[derive(Clone)]
pub struct MessageService {
    pool: PgPool,
}

impl MessageService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one chat turn. When the row carries a provider message id the
    /// insert is idempotent under webhook redelivery: a conflicting id
    /// returns the existing row instead of duplicating it.
    pub async fn create(&self, msg: CreateMessage) -> Result<Message> {
        let inserted = sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages (lead_id, sender, body, direction, status, wa_message_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (wa_message_id) DO NOTHING
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(msg.lead_id)
        .bind(&msg.sender)
        .bind(&msg.body)
        .bind(&msg.direction)
        .bind(&msg.status)
        .bind(&msg.wa_message_id)
        .bind(&msg.metadata)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(message) = inserted {
            return Ok(message);
        }
        // Redelivery: the id already exists, hand back the original row.
        let Some(wa_message_id) = msg.wa_message_id.as_deref() else {
            return Err(crate::error::Error::Internal(
                "Insert returned no row for a message without a provider id".to_string(),
            ));
        };
        let existing = self
            .get_by_wa_message_id(wa_message_id)
            .await?
            .ok_or_else(|| {
                crate::error::Error::Internal(format!(
                    "Conflicting message {} vanished between insert and read",
                    wa_message_id
                ))
            })?;
        Ok(existing)
    }

    /// Apply a delivery-status update by provider message id, appending the
    /// transition to the audit trail in `metadata`. Replaying the same
    /// status is a full no-op, so redelivered status webhooks cannot grow
    /// the trail or touch the row.
    pub async fn update_status(&self, wa_message_id: &str, status: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET status = $2,
                metadata = COALESCE(metadata, '{}'::jsonb)
                    || jsonb_build_object(
                        'status_history',
                        COALESCE(metadata->'status_history', '[]'::jsonb)
                            || jsonb_build_array(jsonb_build_object('status', $2, 'at', NOW()))
                    )
            WHERE wa_message_id = $1 AND status IS DISTINCT FROM $2
            "#,
        )
        .bind(wa_message_id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a row `deleted`. The row itself is never removed; the provider's
    /// revoke is asynchronous and may fail, and the dashboard renders the
    /// tombstone.
    pub async fn mark_deleted(&self, id: Uuid) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "UPDATE messages SET status = $2 WHERE id = $1 RETURNING {}",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .bind(STATUS_DELETED)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    pub async fn get_by_wa_message_id(&self, wa_message_id: &str) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages WHERE wa_message_id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(wa_message_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    pub async fn get_by_lead(&self, lead_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages WHERE lead_id = $1 ORDER BY created_at ASC",
            MESSAGE_COLUMNS
        ))
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }
}
