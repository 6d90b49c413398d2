use crate::error::Result;
use crate::models::identity::Identity;
use crate::models::lead::{CreateLead, Lead, SOURCE_MESSENGER, SOURCE_META_AD, SOURCE_WHATSAPP};
use crate::services::graph_service::LeadField;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

const LEAD_COLUMNS: &str = "id, full_name, email, phone, postal_code, city, source, is_filtered, last_interaction_at, notes, created_at";
const IDENTITY_COLUMNS: &str =
    "id, lead_id, messenger_psid, whatsapp_number, leadgen_id, profile, created_at";

/// Maps platform-scoped sender identifiers to internal leads, creating the
/// lead and its identity link on first contact. The unique constraints on
/// the identity key columns are the sole dedup guard: the loser of a
/// concurrent first-contact race re-reads instead of erroring.
#[derive(Clone)]
pub struct LeadService {
    pool: PgPool,
}

impl LeadService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The contact block is stored on the identity row exactly as the
    /// provider delivered it; the display name is only derived from it.
    pub async fn resolve_whatsapp(
        &self,
        wa_number: &str,
        contact: Option<&JsonValue>,
    ) -> Result<Uuid> {
        if let Some(lead_id) = self.lookup_identity("whatsapp_number", wa_number).await? {
            return Ok(lead_id);
        }
        let name = contact.and_then(|c| c["profile"]["name"].as_str());
        let lead = CreateLead {
            full_name: name
                .map(|n| n.to_string())
                .unwrap_or_else(|| wa_number.to_string()),
            phone: Some(wa_number.to_string()),
            source: SOURCE_WHATSAPP.to_string(),
            ..Default::default()
        };
        self.create_linked("whatsapp_number", wa_number, lead, contact.cloned())
            .await
    }

    pub async fn resolve_messenger(
        &self,
        psid: &str,
        profile: Option<JsonValue>,
    ) -> Result<Uuid> {
        if let Some(lead_id) = self.lookup_identity("messenger_psid", psid).await? {
            return Ok(lead_id);
        }
        let lead = CreateLead {
            full_name: profile
                .as_ref()
                .and_then(messenger_display_name)
                .unwrap_or_else(|| "Facebook User".to_string()),
            source: SOURCE_MESSENGER.to_string(),
            ..Default::default()
        };
        self.create_linked("messenger_psid", psid, lead, profile)
            .await
    }

    pub async fn resolve_lead_ad(
        &self,
        leadgen_id: &str,
        fields: &[LeadField],
    ) -> Result<Uuid> {
        if let Some(lead_id) = self.lookup_identity("leadgen_id", leadgen_id).await? {
            return Ok(lead_id);
        }
        let lead = map_lead_fields(fields);
        let profile = serde_json::to_value(fields).ok();
        self.create_linked("leadgen_id", leadgen_id, lead, profile)
            .await
    }

    /// Pre-lookups used by the dispatcher to skip remote profile/field
    /// fetches for senders we already know.
    pub async fn find_by_messenger_psid(&self, psid: &str) -> Result<Option<Uuid>> {
        self.lookup_identity("messenger_psid", psid).await
    }

    pub async fn find_by_leadgen_id(&self, leadgen_id: &str) -> Result<Option<Uuid>> {
        self.lookup_identity("leadgen_id", leadgen_id).await
    }

    async fn lookup_identity(&self, key_column: &str, key: &str) -> Result<Option<Uuid>> {
        let query = format!(
            "SELECT {} FROM identities WHERE {} = $1",
            IDENTITY_COLUMNS, key_column
        );
        let identity: Option<Identity> = sqlx::query_as(&query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(identity.map(|i| i.lead_id))
    }

    /// Insert the lead and its identity link in one transaction so a crash
    /// cannot leave an orphaned lead that would fork duplicates on the next
    /// contact. A unique violation on the key means a concurrent delivery
    /// won the race; re-read and attach to its lead.
    async fn create_linked(
        &self,
        key_column: &str,
        key: &str,
        lead: CreateLead,
        profile: Option<JsonValue>,
    ) -> Result<Uuid> {
        let mut tx = self.pool.begin().await?;

        let (lead_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO leads (full_name, email, phone, postal_code, city, source)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&lead.full_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.postal_code)
        .bind(&lead.city)
        .bind(&lead.source)
        .fetch_one(&mut *tx)
        .await?;

        let insert = format!(
            "INSERT INTO identities (lead_id, {}, profile) VALUES ($1, $2, $3)",
            key_column
        );
        let inserted = sqlx::query(&insert)
            .bind(lead_id)
            .bind(key)
            .bind(&profile)
            .execute(&mut *tx)
            .await;

        match inserted {
            Ok(_) => {
                tx.commit().await?;
                info!(%lead_id, key, source = %lead.source, "Created lead and identity");
                Ok(lead_id)
            }
            Err(err) if is_unique_violation(&err) => {
                tx.rollback().await?;
                self.lookup_identity(key_column, key)
                    .await?
                    .ok_or_else(|| err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Advance the session-window anchor. Only genuine inbound contact calls
    /// this; outbound sends (template included) never do.
    pub async fn touch_last_interaction(&self, lead_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE leads SET last_interaction_at = NOW() WHERE id = $1")
            .bind(lead_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>> {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            "SELECT {} FROM leads WHERE id = $1",
            LEAD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lead)
    }

    pub async fn list_leads(&self) -> Result<Vec<Lead>> {
        let leads = sqlx::query_as::<_, Lead>(&format!(
            "SELECT {} FROM leads ORDER BY created_at DESC",
            LEAD_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(leads)
    }

    pub async fn update_notes(&self, id: Uuid, notes: Option<&str>) -> Result<Option<Lead>> {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            "UPDATE leads SET notes = $2 WHERE id = $1 RETURNING {}",
            LEAD_COLUMNS
        ))
        .bind(id)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lead)
    }

    /// WhatsApp recipient number for a lead, needed for sends and revokes.
    pub async fn whatsapp_number(&self, lead_id: Uuid) -> Result<Option<String>> {
        let identity: Option<Identity> = sqlx::query_as(&format!(
            "SELECT {} FROM identities WHERE lead_id = $1 AND whatsapp_number IS NOT NULL",
            IDENTITY_COLUMNS
        ))
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(identity.and_then(|i| i.whatsapp_number))
    }
}

/// Combine Graph's `first_name`/`last_name` fields into a display name.
pub fn messenger_display_name(profile: &JsonValue) -> Option<String> {
    let first = profile["first_name"].as_str().unwrap_or("");
    let last = profile["last_name"].as_str().unwrap_or("");
    let name = format!("{} {}", first, last).trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

/// Map lead-form field data by name, case-insensitively and tolerant of the
/// naming variants ad forms use in the wild.
pub fn map_lead_fields(fields: &[LeadField]) -> CreateLead {
    let mut lead = CreateLead {
        full_name: "Meta Lead".to_string(),
        source: SOURCE_META_AD.to_string(),
        ..Default::default()
    };
    for field in fields {
        let Some(value) = field.values.first().filter(|v| !v.is_empty()) else {
            continue;
        };
        match field.name.to_ascii_lowercase().as_str() {
            "full_name" | "name" | "full name" => lead.full_name = value.clone(),
            "email" | "e-mail" => lead.email = Some(value.clone()),
            "phone" | "phone_number" | "phone number" => lead.phone = Some(value.clone()),
            "zip" | "zip_code" | "postal_code" | "post_code" | "plz" => {
                lead.postal_code = Some(value.clone())
            }
            "city" | "ort" => lead.city = Some(value.clone()),
            _ => {}
        }
    }
    lead
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, value: &str) -> LeadField {
        LeadField {
            name: name.to_string(),
            values: vec![value.to_string()],
        }
    }

    #[test]
    fn maps_standard_field_names() {
        let lead = map_lead_fields(&[
            field("full_name", "Erika Muster"),
            field("email", "erika@example.com"),
            field("phone_number", "+4915112345"),
            field("zip", "50667"),
            field("city", "Köln"),
        ]);
        assert_eq!(lead.full_name, "Erika Muster");
        assert_eq!(lead.email.as_deref(), Some("erika@example.com"));
        assert_eq!(lead.phone.as_deref(), Some("+4915112345"));
        assert_eq!(lead.postal_code.as_deref(), Some("50667"));
        assert_eq!(lead.city.as_deref(), Some("Köln"));
        assert_eq!(lead.source, SOURCE_META_AD);
    }

    #[test]
    fn maps_variant_and_mixed_case_names() {
        let lead = map_lead_fields(&[
            field("NAME", "Hans"),
            field("E-Mail", "hans@example.com"),
            field("PLZ", "10115"),
        ]);
        assert_eq!(lead.full_name, "Hans");
        assert_eq!(lead.email.as_deref(), Some("hans@example.com"));
        assert_eq!(lead.postal_code.as_deref(), Some("10115"));
    }

    #[test]
    fn display_name_joins_and_trims_profile_parts() {
        let full = serde_json::json!({ "first_name": "Max", "last_name": "Muster" });
        assert_eq!(messenger_display_name(&full).as_deref(), Some("Max Muster"));

        let first_only = serde_json::json!({ "first_name": "Max" });
        assert_eq!(messenger_display_name(&first_only).as_deref(), Some("Max"));

        let empty = serde_json::json!({ "id": "123" });
        assert_eq!(messenger_display_name(&empty), None);
    }

    #[test]
    fn empty_fields_keep_placeholder_name() {
        let lead = map_lead_fields(&[LeadField {
            name: "full_name".to_string(),
            values: vec![],
        }]);
        assert_eq!(lead.full_name, "Meta Lead");
    }
}
