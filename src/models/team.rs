use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TeamMemberRef, UserRef};

/// Member of the sales team, as shown in assignment pickers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub avatar: Option<String>,
    /// Computed by the store on read
    #[serde(default)]
    pub assigned_leads: u32,
}

impl TeamMember {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email: None,
            role: None,
            avatar: None,
            assigned_leads: 0,
        }
    }

    pub fn to_ref(&self) -> TeamMemberRef {
        TeamMemberRef {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Admin user that leads were assigned to before the sales team existed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

impl User {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email: None,
        }
    }

    pub fn to_ref(&self) -> UserRef {
        UserRef {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}
