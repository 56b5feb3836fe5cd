use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lead::wire_key;

/// Activity kinds an operator may log by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserActivityType {
    Note,
    EmailSent,
    EmailReceived,
    Call,
    Meeting,
    Demo,
    FollowUp,
}

impl UserActivityType {
    pub const ALL: [UserActivityType; 7] = [
        Self::Note,
        Self::EmailSent,
        Self::EmailReceived,
        Self::Call,
        Self::Meeting,
        Self::Demo,
        Self::FollowUp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "NOTE",
            Self::EmailSent => "EMAIL_SENT",
            Self::EmailReceived => "EMAIL_RECEIVED",
            Self::Call => "CALL",
            Self::Meeting => "MEETING",
            Self::Demo => "DEMO",
            Self::FollowUp => "FOLLOW_UP",
        }
    }

    /// Everything except an internal note is a touchpoint with the prospect.
    pub fn counts_as_contact(&self) -> bool {
        !matches!(self, Self::Note)
    }
}

impl std::str::FromStr for UserActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = wire_key(s);
        if let Some(kind) = Self::ALL.into_iter().find(|v| v.as_str() == wanted) {
            return Ok(kind);
        }
        if SystemActivityType::ALL.iter().any(|v| v.as_str() == wanted) {
            return Err(format!("{} is reserved for system use", wanted));
        }
        Err(format!("unknown activity type: {}", s))
    }
}

/// Activity kinds produced only as side effects of lead transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemActivityType {
    StatusChange,
    Assigned,
    Created,
}

impl SystemActivityType {
    pub const ALL: [SystemActivityType; 3] = [Self::StatusChange, Self::Assigned, Self::Created];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StatusChange => "STATUS_CHANGE",
            Self::Assigned => "ASSIGNED",
            Self::Created => "CREATED",
        }
    }
}

/// Stored activity type. On the wire this is a single string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ActivityType {
    User(UserActivityType),
    System(SystemActivityType),
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User(t) => t.as_str(),
            Self::System(t) => t.as_str(),
        }
    }

    /// Parse any stored type, system kinds included. Not for user input.
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = wire_key(s);
        UserActivityType::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .map(Self::User)
            .or_else(|| {
                SystemActivityType::ALL
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .map(Self::System)
            })
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ActivityType> for String {
    fn from(t: ActivityType) -> Self {
        t.as_str().to_string()
    }
}

impl TryFrom<String> for ActivityType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("unknown activity type: {}", s))
    }
}

/// Immutable log entry attached to a lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub lead_id: Uuid,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    pub description: Option<String>,
    pub performed_by: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn new(lead_id: Uuid, kind: UserActivityType, title: String) -> Self {
        Self::build(lead_id, ActivityType::User(kind), title)
    }

    /// System entries are only built by the lead lifecycle.
    pub(crate) fn system(lead_id: Uuid, kind: SystemActivityType, title: String) -> Self {
        Self::build(lead_id, ActivityType::System(kind), title)
    }

    fn build(lead_id: Uuid, activity_type: ActivityType, title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_id,
            activity_type,
            title,
            description: None,
            performed_by: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }
}
