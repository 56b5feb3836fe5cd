use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer-facing storefront account a lead can convert into.
/// Read-only from the lead pipeline's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub email: Option<String>,
    pub plan: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Business {
    pub fn new(name: String, slug: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            slug,
            email: None,
            plan: None,
            created_at: Utc::now(),
        }
    }

    pub fn snapshot(&self) -> BusinessSnapshot {
        BusinessSnapshot {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            plan: self.plan.clone(),
            created_at: self.created_at,
        }
    }

    /// Case-normalized email equality
    pub fn has_email(&self, email: &str) -> bool {
        self.email
            .as_deref()
            .map_or(false, |e| e.trim().eq_ignore_ascii_case(email.trim()))
    }
}

/// Display fields of a business copied onto a converted lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSnapshot {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub plan: Option<String>,
    pub created_at: DateTime<Utc>,
}
