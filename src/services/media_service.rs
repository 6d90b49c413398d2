use reqwest::Client;
use serde_json::Value as JsonValue;
use tracing::warn;

/// Relocates WhatsApp media into durable object storage. Every step is best
/// effort: a failure at any point yields `None` and the message is ingested
/// with its caption or fallback label and no media reference.
#[derive(Clone)]
pub struct MediaService {
    client: Client,
    graph_base: String,
    wa_access_token: String,
    storage_url: String,
    storage_bucket: String,
    storage_service_key: String,
}

impl MediaService {
    pub fn new(client: Client) -> Self {
        let config = crate::config::get_config();
        Self {
            client,
            graph_base: config.graph_api_base.clone(),
            wa_access_token: config.wa_access_token.clone(),
            storage_url: config.storage_url.clone(),
            storage_bucket: config.storage_bucket.clone(),
            storage_service_key: config.storage_service_key.clone(),
        }
    }

    /// Resolve the media handle to a short-lived download URL, pull the
    /// bytes, upload them under a name derived from the handle (repeat
    /// deliveries overwrite instead of duplicating) and return the public
    /// URL.
    pub async fn fetch_and_store(&self, media_id: &str, mime_type: Option<&str>) -> Option<String> {
        let download_url = self.resolve_download_url(media_id).await?;

        let resp = match self
            .client
            .get(&download_url)
            .bearer_auth(&self.wa_access_token)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(media_id, status = %resp.status(), "Media download rejected");
                return None;
            }
            Err(e) => {
                warn!(media_id, error = ?e, "Media download failed");
                return None;
            }
        };
        let bytes = resp.bytes().await.ok()?;

        let mime = mime_type.unwrap_or("application/octet-stream");
        let object_name = format!("{}.{}", media_id, extension_for(mime));
        self.upload(&object_name, mime, bytes.to_vec()).await
    }

    async fn resolve_download_url(&self, media_id: &str) -> Option<String> {
        let meta_url = format!("{}/{}", self.graph_base, media_id);
        let resp = match self
            .client
            .get(&meta_url)
            .bearer_auth(&self.wa_access_token)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(media_id, status = %resp.status(), "Media metadata lookup rejected");
                return None;
            }
            Err(e) => {
                warn!(media_id, error = ?e, "Media metadata lookup failed");
                return None;
            }
        };
        let json: JsonValue = resp.json().await.ok()?;
        json["url"].as_str().map(|s| s.to_string())
    }

    async fn upload(&self, object_name: &str, mime: &str, bytes: Vec<u8>) -> Option<String> {
        let upload_url = format!(
            "{}/object/{}/{}",
            self.storage_url, self.storage_bucket, object_name
        );
        let resp = self
            .client
            .post(&upload_url)
            .bearer_auth(&self.storage_service_key)
            .header("content-type", mime)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await;
        match resp {
            Ok(resp) if resp.status().is_success() => Some(format!(
                "{}/object/public/{}/{}",
                self.storage_url, self.storage_bucket, object_name
            )),
            Ok(resp) => {
                warn!(object_name, status = %resp.status(), "Storage upload rejected");
                None
            }
            Err(e) => {
                warn!(object_name, error = ?e, "Storage upload failed");
                None
            }
        }
    }
}

/// File extension for the storage object name; trims codec parameters like
/// `audio/ogg; codecs=opus`.
fn extension_for(mime: &str) -> &'static str {
    let base = mime.split(';').next().unwrap_or(mime).trim();
    match base {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/3gpp" => "3gp",
        "audio/ogg" => "ogg",
        "audio/mpeg" => "mp3",
        "audio/aac" => "aac",
        "audio/amr" => "amr",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_codec_parameters() {
        assert_eq!(extension_for("audio/ogg; codecs=opus"), "ogg");
    }

    #[test]
    fn unknown_mime_falls_back_to_bin() {
        assert_eq!(extension_for("application/x-thing"), "bin");
    }
}
