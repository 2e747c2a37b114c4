//! Push payload parsing
//!
//! Inbound push bodies are untrusted bytes. They are parsed exactly once, at
//! the event boundary, into a `PayloadParse` before any field is read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::shared::config::WorkerConfig;

/// A button attached to a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A push payload after validation; optional fields are kept as received
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    pub require_interaction: Option<bool>,
    pub actions: Vec<ActionDescriptor>,
    pub data: Map<String, Value>,
}

/// Wire shape of the push body. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePayload {
    title: Option<String>,
    body: Option<String>,
    icon: Option<String>,
    badge: Option<String>,
    tag: Option<String>,
    require_interaction: Option<bool>,
    actions: Option<Vec<ActionDescriptor>>,
    data: Option<Map<String, Value>>,
}

/// Outcome of the boundary parse
#[derive(Debug)]
pub enum PayloadParse {
    /// The push event carried no body
    Absent,
    Valid(NotificationPayload),
    Malformed(AppError),
}

/// Display options handed to the host, with every default resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<ActionDescriptor>,
    pub data: Map<String, Value>,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        NotificationDefaults::default().options_with_body(String::new())
    }
}

/// Fallback values applied to fields a payload omits
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDefaults {
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub fallback_url: String,
    pub sync_tag: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self::from(&WorkerConfig::default())
    }
}

impl From<&WorkerConfig> for NotificationDefaults {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            icon: config.default_icon.clone(),
            badge: config.default_badge.clone(),
            tag: config.default_tag.clone(),
            fallback_url: config.fallback_url.clone(),
            sync_tag: config.sync_tag.clone(),
        }
    }
}

impl NotificationDefaults {
    fn options_with_body(&self, body: String) -> NotificationOptions {
        NotificationOptions {
            body,
            icon: self.icon.clone(),
            badge: self.badge.clone(),
            tag: self.tag.clone(),
            require_interaction: false,
            actions: Vec::new(),
            data: Map::new(),
        }
    }
}

impl NotificationPayload {
    /// Parse the raw push body. `None` means the event had no payload at all.
    pub fn parse(raw: Option<&[u8]>) -> PayloadParse {
        let Some(bytes) = raw else {
            return PayloadParse::Absent;
        };

        let wire: WirePayload = match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(object)) => match serde_json::from_value(Value::Object(object)) {
                Ok(wire) => wire,
                Err(e) => {
                    return PayloadParse::Malformed(AppError::malformed_payload_with_source(
                        "payload fields have unexpected types",
                        e,
                    ))
                }
            },
            Ok(other) => {
                return PayloadParse::Malformed(AppError::malformed_payload(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
            Err(e) => {
                return PayloadParse::Malformed(AppError::malformed_payload_with_source(
                    "payload is not valid JSON",
                    e,
                ))
            }
        };

        let Some(title) = wire.title else {
            return PayloadParse::Malformed(AppError::malformed_payload("missing required field 'title'"));
        };

        PayloadParse::Valid(NotificationPayload {
            title,
            body: wire.body.unwrap_or_default(),
            icon: wire.icon,
            badge: wire.badge,
            tag: wire.tag,
            require_interaction: wire.require_interaction,
            actions: wire.actions.unwrap_or_default(),
            data: wire.data.unwrap_or_default(),
        })
    }

    /// Split into the title and the fully-resolved display options
    pub fn resolve(self, defaults: &NotificationDefaults) -> (String, NotificationOptions) {
        let mut options = defaults.options_with_body(self.body);
        if let Some(icon) = self.icon {
            options.icon = icon;
        }
        if let Some(badge) = self.badge {
            options.badge = badge;
        }
        if let Some(tag) = self.tag {
            options.tag = tag;
        }
        options.require_interaction = self.require_interaction.unwrap_or(false);
        options.actions = self.actions;
        options.data = self.data;
        (self.title, options)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_valid(raw: &str) -> NotificationPayload {
        match NotificationPayload::parse(Some(raw.as_bytes())) {
            PayloadParse::Valid(payload) => payload,
            other => panic!("expected valid payload, got {:?}", other),
        }
    }

    fn assert_malformed(raw: &[u8]) {
        assert!(
            matches!(NotificationPayload::parse(Some(raw)), PayloadParse::Malformed(_)),
            "expected malformed for {:?}",
            String::from_utf8_lossy(raw)
        );
    }

    #[test]
    fn test_absent_payload() {
        assert!(matches!(NotificationPayload::parse(None), PayloadParse::Absent));
    }

    #[test]
    fn test_minimal_payload_gets_every_default() {
        let payload = parse_valid(r#"{"title": "Appointment Reminder"}"#);
        let (title, options) = payload.resolve(&NotificationDefaults::default());

        assert_eq!(title, "Appointment Reminder");
        assert_eq!(options.body, "");
        assert_eq!(options.icon, "/icons/icon-192x192.png");
        assert_eq!(options.badge, "/icons/badge-72x72.png");
        assert_eq!(options.tag, "default");
        assert!(!options.require_interaction);
        assert!(options.actions.is_empty());
        assert!(options.data.is_empty());
    }

    #[test]
    fn test_defaults_apply_independently() {
        let payload = parse_valid(
            r#"{"title": "Lab results", "body": "Ready", "badge": "/b.png", "requireInteraction": true}"#,
        );
        let (_, options) = payload.resolve(&NotificationDefaults::default());

        assert_eq!(options.badge, "/b.png");
        assert_eq!(options.icon, "/icons/icon-192x192.png");
        assert!(options.require_interaction);
        assert_eq!(options.tag, "default");
        assert!(options.data.is_empty());
    }

    #[test]
    fn test_full_payload_is_carried_through() {
        let payload = parse_valid(
            r#"{
                "title": "Prescription ready",
                "body": "Pick up at the pharmacy",
                "icon": "/rx.png",
                "tag": "rx-7",
                "actions": [{"action": "view", "title": "View"}, {"action": "dismiss", "title": "Dismiss", "icon": "/x.png"}],
                "data": {"url": "/patient/prescriptions/7", "prescriptionId": 7},
                "extra": "ignored"
            }"#,
        );
        let (_, options) = payload.resolve(&NotificationDefaults::default());

        assert_eq!(options.tag, "rx-7");
        assert_eq!(options.actions.len(), 2);
        assert_eq!(options.actions[0].action, "view");
        assert_eq!(options.actions[1].icon.as_deref(), Some("/x.png"));
        assert_eq!(options.data.get("url"), Some(&json!("/patient/prescriptions/7")));
    }

    #[test]
    fn test_null_data_treated_as_absent() {
        let payload = parse_valid(r#"{"title": "t", "data": null, "tag": null}"#);
        let (_, options) = payload.resolve(&NotificationDefaults::default());
        assert!(options.data.is_empty());
        assert_eq!(options.tag, "default");
    }

    #[test]
    fn test_malformed_payloads() {
        assert_malformed(b"");
        assert_malformed(b"not json");
        assert_malformed(br#"["title"]"#);
        assert_malformed(br#""just a string""#);
        assert_malformed(br#"{"body": "no title"}"#);
        assert_malformed(br#"{"title": 42}"#);
        assert_malformed(br#"{"title": "t", "data": "not a map"}"#);
        assert_malformed(br#"{"title": "t", "actions": {"action": "x"}}"#);
        assert_malformed(&[0xff, 0xfe, 0x00]);
    }

    #[test]
    fn test_configured_defaults_are_used() {
        let defaults = NotificationDefaults {
            icon: "/clinic.png".into(),
            badge: "/clinic-badge.png".into(),
            tag: "clinic".into(),
            fallback_url: "/dashboard".into(),
            sync_tag: "sync-notifications".into(),
        };
        let (_, options) = parse_valid(r#"{"title": "t"}"#).resolve(&defaults);
        assert_eq!(options.icon, "/clinic.png");
        assert_eq!(options.tag, "clinic");
    }
}
