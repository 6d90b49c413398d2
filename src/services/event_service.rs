use crate::dto::webhook_dto::{WaMediaBody, WebhookPayload};
use serde_json::Value as JsonValue;

/// Media reference extracted from a WhatsApp inbound message, handed to the
/// media fetcher for best-effort relocation into object storage.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRef {
    pub media_id: String,
    pub mime_type: Option<String>,
    pub caption: Option<String>,
}

/// Closed classification of one verified webhook delivery. Provider payloads
/// are a tagged union distinguished by which optional fields are present, so
/// classification is evaluated in a fixed priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Messenger chat message. Echoes of our own sends carry `is_echo` and
    /// are keyed by the recipient psid instead of the sender.
    Messenger {
        psid: String,
        mid: Option<String>,
        text: Option<String>,
        attachment: Option<(String, String)>,
        is_echo: bool,
    },
    /// Lead Ads form submission; field data is fetched separately.
    LeadSubmission { leadgen_id: String },
    /// WhatsApp delivery-status update, reconciled by provider message id
    /// only. No identity resolution.
    StatusUpdate {
        wa_message_id: String,
        status: String,
    },
    /// WhatsApp chat message (text or media). The contact block is the raw
    /// provider payload, persisted verbatim on first contact.
    WhatsAppMessage {
        wa_number: String,
        contact: Option<JsonValue>,
        wa_message_id: String,
        kind: String,
        text: Option<String>,
        media: Option<MediaRef>,
    },
    /// Anything else. Acknowledged without processing so the provider does
    /// not retry.
    Unsupported,
}

pub fn classify(payload: &WebhookPayload) -> InboundEvent {
    let Some(entry) = payload.entry.as_ref().and_then(|e| e.first()) else {
        return InboundEvent::Unsupported;
    };

    // 1. Messenger: entry[0].messaging[0]
    if let Some(event) = entry.messaging.as_ref().and_then(|m| m.first()) {
        let Some(message) = event.message.as_ref() else {
            return InboundEvent::Unsupported;
        };
        let is_echo = message.is_echo;
        // For an echo the sender is our page; the counterparty is the recipient.
        let party = if is_echo {
            event.recipient.as_ref()
        } else {
            event.sender.as_ref()
        };
        let Some(party) = party else {
            return InboundEvent::Unsupported;
        };
        let attachment = message.attachments.as_ref().and_then(|atts| {
            atts.first().and_then(|a| {
                a.payload
                    .as_ref()
                    .and_then(|p| p.url.clone())
                    .map(|url| (a.kind.clone(), url))
            })
        });
        return InboundEvent::Messenger {
            psid: party.id.clone(),
            mid: message.mid.clone(),
            text: message.text.clone(),
            attachment,
            is_echo,
        };
    }

    let Some(value) = entry
        .changes
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.value.as_ref())
    else {
        return InboundEvent::Unsupported;
    };

    // 2. Lead Ads: entry[0].changes[0].value.leadgen_id (numeric on the wire)
    if let Some(raw) = value.leadgen_id.as_ref() {
        let leadgen_id = match raw.as_str() {
            Some(s) => s.to_string(),
            None => raw.to_string(),
        };
        return InboundEvent::LeadSubmission { leadgen_id };
    }

    // 3. WhatsApp status update: entry[0].changes[0].value.statuses[0]
    if let Some(status) = value.statuses.as_ref().and_then(|s| s.first()) {
        return InboundEvent::StatusUpdate {
            wa_message_id: status.id.clone(),
            status: status.status.clone(),
        };
    }

    // 4. WhatsApp message: entry[0].changes[0].value.messages[0]
    if let Some(msg) = value.messages.as_ref().and_then(|m| m.first()) {
        let contact = value.contacts.as_ref().and_then(|c| c.first()).cloned();
        let media = media_body(msg.kind.as_str(), msg).map(|m| MediaRef {
            media_id: m.id.clone(),
            mime_type: m.mime_type.clone(),
            caption: m.caption.clone(),
        });
        return InboundEvent::WhatsAppMessage {
            wa_number: msg.from.clone(),
            contact,
            wa_message_id: msg.id.clone(),
            kind: msg.kind.clone(),
            text: msg.text.as_ref().map(|t| t.body.clone()),
            media,
        };
    }

    InboundEvent::Unsupported
}

fn media_body<'a>(
    kind: &str,
    msg: &'a crate::dto::webhook_dto::WaInboundMessage,
) -> Option<&'a WaMediaBody> {
    match kind {
        "image" => msg.image.as_ref(),
        "video" => msg.video.as_ref(),
        "document" => msg.document.as_ref(),
        "audio" => msg.audio.as_ref(),
        _ => None,
    }
}

/// Caption shown when a media message carries no text of its own.
pub fn fallback_label(kind: &str) -> &'static str {
    match kind {
        "image" => "Sent a photo",
        "video" => "Sent a video",
        "document" => "Sent a document",
        "audio" => "Sent a voice message",
        _ => "Sent an unsupported message",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> WebhookPayload {
        serde_json::from_str(json).expect("valid payload json")
    }

    #[test]
    fn classifies_messenger_text() {
        let payload = parse(
            r#"{"object":"page","entry":[{"id":"123","messaging":[{
                "sender":{"id":"psid-1"},"recipient":{"id":"page-1"},
                "message":{"mid":"m.1","text":"hello"}}]}]}"#,
        );
        match classify(&payload) {
            InboundEvent::Messenger {
                psid,
                text,
                is_echo,
                ..
            } => {
                assert_eq!(psid, "psid-1");
                assert_eq!(text.as_deref(), Some("hello"));
                assert!(!is_echo);
            }
            other => panic!("expected Messenger, got {:?}", other),
        }
    }

    #[test]
    fn messenger_echo_keys_on_recipient() {
        let payload = parse(
            r#"{"object":"page","entry":[{"id":"123","messaging":[{
                "sender":{"id":"page-1"},"recipient":{"id":"psid-9"},
                "message":{"mid":"m.2","text":"our reply","is_echo":true}}]}]}"#,
        );
        match classify(&payload) {
            InboundEvent::Messenger { psid, is_echo, .. } => {
                assert_eq!(psid, "psid-9");
                assert!(is_echo);
            }
            other => panic!("expected Messenger echo, got {:?}", other),
        }
    }

    #[test]
    fn classifies_lead_submission_numeric_id() {
        let payload = parse(
            r#"{"object":"page","entry":[{"id":"123","changes":[{
                "field":"leadgen","value":{"leadgen_id":4211093255,"form_id":99}}]}]}"#,
        );
        assert_eq!(
            classify(&payload),
            InboundEvent::LeadSubmission {
                leadgen_id: "4211093255".to_string()
            }
        );
    }

    #[test]
    fn classifies_status_update() {
        let payload = parse(
            r#"{"object":"whatsapp_business_account","entry":[{"id":"w","changes":[{
                "value":{"statuses":[{"id":"wamid.X","status":"read"}]}}]}]}"#,
        );
        assert_eq!(
            classify(&payload),
            InboundEvent::StatusUpdate {
                wa_message_id: "wamid.X".to_string(),
                status: "read".to_string()
            }
        );
    }

    #[test]
    fn classifies_whatsapp_text() {
        let payload = parse(
            r#"{"object":"whatsapp_business_account","entry":[{"id":"w","changes":[{
                "value":{"contacts":[{"wa_id":"4915112345","profile":{"name":"Max"}}],
                "messages":[{"from":"4915112345","id":"wamid.A","type":"text",
                "text":{"body":"hi there"}}]}}]}]}"#,
        );
        match classify(&payload) {
            InboundEvent::WhatsAppMessage {
                wa_number,
                contact,
                kind,
                text,
                media,
                ..
            } => {
                assert_eq!(wa_number, "4915112345");
                let contact = contact.expect("contact block");
                assert_eq!(contact["profile"]["name"].as_str(), Some("Max"));
                assert_eq!(contact["wa_id"].as_str(), Some("4915112345"));
                assert_eq!(kind, "text");
                assert_eq!(text.as_deref(), Some("hi there"));
                assert!(media.is_none());
            }
            other => panic!("expected WhatsAppMessage, got {:?}", other),
        }
    }

    #[test]
    fn classifies_whatsapp_image_with_caption() {
        let payload = parse(
            r#"{"object":"whatsapp_business_account","entry":[{"id":"w","changes":[{
                "value":{"messages":[{"from":"4915112345","id":"wamid.B","type":"image",
                "image":{"id":"media-1","mime_type":"image/jpeg","caption":"our roof"}}]}}]}]}"#,
        );
        match classify(&payload) {
            InboundEvent::WhatsAppMessage { kind, media, .. } => {
                assert_eq!(kind, "image");
                let media = media.expect("media ref");
                assert_eq!(media.media_id, "media-1");
                assert_eq!(media.caption.as_deref(), Some("our roof"));
            }
            other => panic!("expected WhatsAppMessage, got {:?}", other),
        }
    }

    #[test]
    fn status_takes_priority_over_message_in_same_value() {
        let payload = parse(
            r#"{"object":"whatsapp_business_account","entry":[{"id":"w","changes":[{
                "value":{"statuses":[{"id":"wamid.S","status":"delivered"}],
                "messages":[{"from":"4915","id":"wamid.M","type":"text","text":{"body":"x"}}]}}]}]}"#,
        );
        assert!(matches!(classify(&payload), InboundEvent::StatusUpdate { .. }));
    }

    #[test]
    fn unknown_shapes_are_unsupported() {
        for json in [
            r#"{"object":"page"}"#,
            r#"{"object":"page","entry":[]}"#,
            r#"{"object":"page","entry":[{"id":"1"}]}"#,
            r#"{"object":"page","entry":[{"id":"1","changes":[{"field":"feed","value":{}}]}]}"#,
        ] {
            assert_eq!(classify(&parse(json)), InboundEvent::Unsupported, "{}", json);
        }
    }

    #[test]
    fn fallback_labels_per_kind() {
        assert_eq!(fallback_label("image"), "Sent a photo");
        assert_eq!(fallback_label("audio"), "Sent a voice message");
        assert_eq!(fallback_label("sticker"), "Sent an unsupported message");
    }
}
