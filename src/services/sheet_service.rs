use crate::models::lead::Lead;
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

/// Fire-and-forget sync of new lead-ad submissions to an external sheet
/// endpoint. Disabled when no URL is configured; failures are logged and
/// never surface in the webhook response.
#[derive(Clone)]
pub struct SheetService {
    client: Client,
    sync_url: Option<String>,
}

impl SheetService {
    pub fn new(client: Client, sync_url: Option<String>) -> Self {
        let sync_url = sync_url.filter(|url| !url.trim().is_empty());
        if let Some(ref url) = sync_url {
            info!("Sheet sync enabled, endpoint: {}", url);
        } else {
            info!("Sheet sync disabled (SHEET_SYNC_URL not set)");
        }
        Self { client, sync_url }
    }

    pub fn is_enabled(&self) -> bool {
        self.sync_url.is_some()
    }

    pub async fn sync_lead(&self, lead: &Lead) {
        let Some(url) = &self.sync_url else {
            return;
        };
        let payload = json!({
            "lead_id": lead.id,
            "full_name": lead.full_name,
            "email": lead.email,
            "phone": lead.phone,
            "postal_code": lead.postal_code,
            "city": lead.city,
            "source": lead.source,
            "created_at": lead.created_at,
        });
        match self.client.post(url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(lead_id = %lead.id, "Lead synced to sheet");
            }
            Ok(resp) => {
                warn!(lead_id = %lead.id, status = %resp.status(), "Sheet sync rejected");
            }
            Err(e) => {
                warn!(lead_id = %lead.id, error = ?e, "Sheet sync failed");
            }
        }
    }
}
