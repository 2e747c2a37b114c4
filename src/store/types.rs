//! Notification record types shared with the clinic backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five kinds of notification the clinic backend emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Appointment,
    Reminder,
    Prescription,
    Payment,
    System,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Appointment => "appointment",
            Self::Reminder => "reminder",
            Self::Prescription => "prescription",
            Self::Payment => "payment",
            Self::System => "system",
        };
        f.write_str(name)
    }
}

/// Entity a notification refers to, e.g. an appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl RelatedEntity {
    /// Patient-facing route for this entity, e.g. `/patient/appointments/42`
    pub fn patient_url(&self) -> String {
        format!("/patient/{}s/{}", self.kind.to_lowercase(), self.id)
    }
}

/// A persisted notification as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity: Option<RelatedEntity>,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity: Option<RelatedEntity>,
}

impl NewNotification {
    pub fn new(
        user_id: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            related_entity: None,
        }
    }

    pub fn related_to(mut self, kind: impl Into<String>, id: impl Into<String>) -> Self {
        self.related_entity = Some(RelatedEntity {
            kind: kind.into(),
            id: id.into(),
        });
        self
    }
}
