use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::{resolve_owner, BusinessSnapshot, Owner, TeamMemberRef, UserRef};

/// Funnel stage of a lead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    DemoScheduled,
    Negotiating,
    Won,
    Lost,
    Nurturing,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 8] = [
        Self::New,
        Self::Contacted,
        Self::Qualified,
        Self::DemoScheduled,
        Self::Negotiating,
        Self::Won,
        Self::Lost,
        Self::Nurturing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Contacted => "CONTACTED",
            Self::Qualified => "QUALIFIED",
            Self::DemoScheduled => "DEMO_SCHEDULED",
            Self::Negotiating => "NEGOTIATING",
            Self::Won => "WON",
            Self::Lost => "LOST",
            Self::Nurturing => "NURTURING",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::Qualified => "Qualified",
            Self::DemoScheduled => "Demo scheduled",
            Self::Negotiating => "Negotiating",
            Self::Won => "Won",
            Self::Lost => "Lost",
            Self::Nurturing => "Nurturing",
        }
    }

    /// WON and LOST leads are closed: no follow-ups, no pipeline value.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = wire_key(s);
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| format!("unknown status: {}", s))
    }
}

/// Where a lead came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadSource {
    Website,
    DemoRequest,
    Referral,
    Social,
    Email,
    Phone,
    Partner,
    Event,
    Advertising,
    Organic,
    #[default]
    Other,
}

impl LeadSource {
    pub const ALL: [LeadSource; 11] = [
        Self::Website,
        Self::DemoRequest,
        Self::Referral,
        Self::Social,
        Self::Email,
        Self::Phone,
        Self::Partner,
        Self::Event,
        Self::Advertising,
        Self::Organic,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Website => "WEBSITE",
            Self::DemoRequest => "DEMO_REQUEST",
            Self::Referral => "REFERRAL",
            Self::Social => "SOCIAL",
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Partner => "PARTNER",
            Self::Event => "EVENT",
            Self::Advertising => "ADVERTISING",
            Self::Organic => "ORGANIC",
            Self::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for LeadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LeadSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = wire_key(s);
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| format!("unknown source: {}", s))
    }
}

/// Lead priority. Declaration order is the ranking: LOW < MEDIUM < HIGH < URGENT.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl LeadPriority {
    pub const ALL: [LeadPriority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }
}

impl std::fmt::Display for LeadPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LeadPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = wire_key(s);
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| format!("unknown priority: {}", s))
    }
}

/// Normalize user input ("demo-scheduled", "Demo Scheduled") to the wire form.
pub(crate) fn wire_key(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeadCounts {
    pub activities: u32,
}

/// A prospective customer tracked through the sales funnel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub source: LeadSource,
    pub source_detail: Option<String>,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    pub score: i32,
    /// Legacy owner reference, superseded by `team_member` when both are set
    pub assigned_to: Option<UserRef>,
    pub team_member: Option<TeamMemberRef>,
    pub business_type: Option<String>,
    pub expected_plan: Option<String>,
    pub estimated_value: Option<f64>,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub next_follow_up_at: Option<DateTime<Utc>>,
    pub contact_count: u32,
    pub converted_at: Option<DateTime<Utc>>,
    pub converted_to_id: Option<Uuid>,
    /// Cached copy of the linked business; may be stale after a rename
    pub converted_to: Option<BusinessSnapshot>,
    /// Business picked by an operator before the lead was won
    pub pending_conversion_id: Option<Uuid>,
    pub notes: Option<String>,
    pub tags: BTreeSet<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "_count")]
    pub counts: LeadCounts,
}

impl Lead {
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email: None,
            phone: None,
            company: None,
            country: None,
            source: LeadSource::default(),
            source_detail: None,
            status: LeadStatus::default(),
            priority: LeadPriority::default(),
            score: 0,
            assigned_to: None,
            team_member: None,
            business_type: None,
            expected_plan: None,
            estimated_value: None,
            last_contacted_at: None,
            next_follow_up_at: None,
            contact_count: 0,
            converted_at: None,
            converted_to_id: None,
            converted_to: None,
            pending_conversion_id: None,
            notes: None,
            tags: BTreeSet::new(),
            version: 1,
            created_at: now,
            updated_at: now,
            counts: LeadCounts::default(),
        }
    }

    /// Who owns this lead. Every caller that cares about ownership goes through here.
    pub fn owner(&self) -> Owner<'_> {
        resolve_owner(self.team_member.as_ref(), self.assigned_to.as_ref())
    }

    /// Follow-up date has passed and the lead is still open. Evaluated at read time.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        if self.status.is_closed() {
            return false;
        }
        self.next_follow_up_at.map_or(false, |due| due < now)
    }

    pub fn is_converted(&self) -> bool {
        self.converted_to_id.is_some()
    }

    pub(crate) fn clear_conversion(&mut self) {
        self.converted_to_id = None;
        self.converted_at = None;
        self.converted_to = None;
    }
}
