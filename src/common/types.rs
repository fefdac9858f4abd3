use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Ignored,
    Interested,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_path(self) -> &'static str {
        match self {
            RequestStatus::Ignored => "ignored",
            RequestStatus::Interested => "interested",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_feed_decision(self) -> bool {
        matches!(self, RequestStatus::Ignored | RequestStatus::Interested)
    }

    pub fn is_review_decision(self) -> bool {
        matches!(self, RequestStatus::Accepted | RequestStatus::Rejected)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub from_user_id: User,
    pub status: RequestStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields accepted by the profile editor. Empty optionals are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub photo_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub self_id: String,
    pub peer_id: String,
}

impl ConversationKey {
    pub fn new(self_id: impl Into<String>, peer_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into().trim().to_string(),
            peer_id: peer_id.into().trim().to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.self_id.is_empty() && !self.peer_id.is_empty()
    }
}

/// Display-oriented chat message. No server identifier is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub first_name: String,
    pub last_name: String,
    pub text: String,
}

impl Message {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            text: text.into(),
        }
    }

    /// Ownership check used for rendering, matching on first name.
    pub fn is_from(&self, user: &SessionUser) -> bool {
        self.first_name == user.first_name
    }
}
