use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Legacy assignee: a plain user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

/// Sales-team assignee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMemberRef {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerKind {
    User,
    TeamMember,
}

/// Resolved owner of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner<'a> {
    None,
    LegacyUser(&'a UserRef),
    TeamMember(&'a TeamMemberRef),
}

impl<'a> Owner<'a> {
    pub fn is_none(&self) -> bool {
        matches!(self, Owner::None)
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Owner::None => None,
            Owner::LegacyUser(u) => Some(u.id),
            Owner::TeamMember(m) => Some(m.id),
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        match self {
            Owner::None => None,
            Owner::LegacyUser(u) => Some(u.name.as_str()),
            Owner::TeamMember(m) => Some(m.name.as_str()),
        }
    }

    pub fn kind(&self) -> Option<OwnerKind> {
        match self {
            Owner::None => None,
            Owner::LegacyUser(_) => Some(OwnerKind::User),
            Owner::TeamMember(_) => Some(OwnerKind::TeamMember),
        }
    }

    /// Display label, "Unassigned" when nobody owns the lead
    pub fn label(&self) -> &'a str {
        self.name().unwrap_or("Unassigned")
    }
}

/// Team member wins over the legacy user; neither means unassigned.
pub fn resolve_owner<'a>(
    team_member: Option<&'a TeamMemberRef>,
    assigned_to: Option<&'a UserRef>,
) -> Owner<'a> {
    match (team_member, assigned_to) {
        (Some(m), _) => Owner::TeamMember(m),
        (None, Some(u)) => Owner::LegacyUser(u),
        (None, None) => Owner::None,
    }
}
