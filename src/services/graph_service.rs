use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::warn;

/// Client for the Meta Graph API: WhatsApp Business sends, Messenger sends,
/// lead-form retrieval and template listing.
#[derive(Clone)]
pub struct GraphService {
    client: Client,
    base: String,
    wa_access_token: String,
    wa_phone_number_id: String,
    wa_business_account_id: String,
    page_access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadField {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LeadFieldData {
    #[serde(default)]
    pub field_data: Vec<LeadField>,
}

impl GraphService {
    pub fn new(client: Client) -> Self {
        let config = crate::config::get_config();
        Self {
            client,
            base: config.graph_api_base.clone(),
            wa_access_token: config.wa_access_token.clone(),
            wa_phone_number_id: config.wa_phone_number_id.clone(),
            wa_business_account_id: config.wa_business_account_id.clone(),
            page_access_token: config.page_access_token.clone(),
        }
    }

    /// Send a plain text message over WhatsApp. Returns the provider
    /// message id used later for status reconciliation.
    pub async fn send_wa_text(&self, to: &str, text: &str) -> Result<String> {
        let body = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": text }
        });
        self.post_wa_message(body).await
    }

    /// Send a pre-approved template. Templates may initiate contact outside
    /// the session window.
    pub async fn send_wa_template(&self, to: &str, name: &str, language: &str) -> Result<String> {
        let body = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "template",
            "template": {
                "name": name,
                "language": { "code": language }
            }
        });
        self.post_wa_message(body).await
    }

    /// Send an image or video by link; the kind is inferred from the URL
    /// extension.
    pub async fn send_wa_media(
        &self,
        to: &str,
        media_url: &str,
        caption: Option<&str>,
    ) -> Result<String> {
        let kind = media_kind_from_url(media_url);
        let mut media = json!({ "link": media_url });
        if let Some(caption) = caption {
            media["caption"] = json!(caption);
        }
        let body = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": kind,
            kind: media
        });
        self.post_wa_message(body).await
    }

    /// Ask the provider to revoke a previously sent message ("delete for
    /// everyone"). The row is marked `deleted` locally regardless, since the
    /// provider-side removal is asynchronous.
    pub async fn revoke_wa_message(&self, to: &str, wa_message_id: &str) -> Result<()> {
        let url = format!("{}/{}/messages", self.base, self.wa_phone_number_id);
        let body = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "revoke",
            "message_id": wa_message_id
        });
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.wa_access_token)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(provider_error(resp).await);
        }
        Ok(())
    }

    async fn post_wa_message(&self, body: JsonValue) -> Result<String> {
        let url = format!("{}/{}/messages", self.base, self.wa_phone_number_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.wa_access_token)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(provider_error(resp).await);
        }
        let json: JsonValue = resp.json().await?;
        json["messages"][0]["id"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Upstream("Send response carried no message id".to_string()))
    }

    /// Send a text message to a Messenger recipient by page-scoped id.
    pub async fn send_messenger_text(&self, psid: &str, text: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/me/messages?access_token={}",
            self.base, self.page_access_token
        );
        let body = json!({
            "recipient": { "id": psid },
            "message": { "text": text }
        });
        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(provider_error(resp).await);
        }
        let json: JsonValue = resp.json().await?;
        Ok(json["message_id"].as_str().map(|s| s.to_string()))
    }

    /// Fetch the profile block for a Messenger page-scoped id, returned as
    /// received so it can be stored verbatim. Best effort: any failure
    /// yields `None` and the caller falls back to a placeholder.
    pub async fn fetch_messenger_profile(&self, psid: &str) -> Option<JsonValue> {
        let url = format!(
            "{}/{}?fields=first_name,last_name&access_token={}",
            self.base, psid, self.page_access_token
        );
        let resp = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(psid, status = %resp.status(), "Profile fetch rejected");
                return None;
            }
            Err(e) => {
                warn!(psid, error = ?e, "Profile fetch failed");
                return None;
            }
        };
        resp.json().await.ok()
    }

    /// Retrieve the field data of a lead-form submission; not inline in the
    /// webhook delivery.
    pub async fn fetch_lead_fields(&self, leadgen_id: &str) -> Result<Vec<LeadField>> {
        let url = format!(
            "{}/{}?access_token={}",
            self.base, leadgen_id, self.page_access_token
        );
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(provider_error(resp).await);
        }
        let data: LeadFieldData = resp.json().await?;
        Ok(data.field_data)
    }

    /// List the message templates approved for the business account.
    pub async fn list_templates(&self) -> Result<JsonValue> {
        let url = format!(
            "{}/{}/message_templates",
            self.base, self.wa_business_account_id
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.wa_access_token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(provider_error(resp).await);
        }
        let json: JsonValue = resp.json().await?;
        Ok(json["data"].clone())
    }
}

/// Turn a failed Graph response into an error, extracting `error.message`
/// from the body and falling back to the raw text.
async fn provider_error(resp: reqwest::Response) -> Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    classify_provider_error(status, &body)
}

/// Graph error code 100 covers invalid-parameter rejections such as an
/// unknown template name or a malformed recipient; those are the caller's
/// to correct. Everything else is the provider's problem.
const CALLER_ERROR_CODES: [u64; 2] = [100, 132001];

fn classify_provider_error(status: reqwest::StatusCode, body: &str) -> Error {
    let parsed = serde_json::from_str::<JsonValue>(body).ok();
    let code = parsed.as_ref().and_then(|v| v["error"]["code"].as_u64());
    let message = parsed
        .as_ref()
        .and_then(|v| v["error"]["message"].as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| body.to_string());
    let message = format!("Graph API error {}: {}", status, message);
    match code {
        Some(code) if CALLER_ERROR_CODES.contains(&code) => Error::BadRequest(message),
        _ => Error::Upstream(message),
    }
}

pub fn media_kind_from_url(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "mp4" | "mov" | "3gp" | "webm" => "video",
        _ => "image",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_extensions_map_to_video() {
        assert_eq!(media_kind_from_url("https://cdn.example/a/clip.mp4"), "video");
        assert_eq!(media_kind_from_url("https://cdn.example/clip.MOV?x=1"), "video");
    }

    #[test]
    fn everything_else_maps_to_image() {
        assert_eq!(media_kind_from_url("https://cdn.example/pic.jpg"), "image");
        assert_eq!(media_kind_from_url("https://cdn.example/pic.png#frag"), "image");
        assert_eq!(media_kind_from_url("https://cdn.example/no-extension"), "image");
    }

    #[test]
    fn invalid_parameter_rejections_are_bad_requests() {
        let body = r#"{"error":{"message":"Template name does not exist","code":132001}}"#;
        let err = classify_provider_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, Error::BadRequest(_)), "{:?}", err);

        let body = r#"{"error":{"message":"Invalid parameter","code":100}}"#;
        let err = classify_provider_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, Error::BadRequest(_)), "{:?}", err);
    }

    #[test]
    fn provider_side_failures_stay_upstream() {
        let body = r#"{"error":{"message":"Service temporarily unavailable","code":2}}"#;
        let err = classify_provider_error(reqwest::StatusCode::SERVICE_UNAVAILABLE, body);
        assert!(matches!(err, Error::Upstream(_)), "{:?}", err);

        let err = classify_provider_error(reqwest::StatusCode::BAD_GATEWAY, "not json");
        assert!(matches!(err, Error::Upstream(_)), "{:?}", err);
    }
}
