//! Record store contracts consumed by the lead pipeline.
//!
//! `Database` implements both traits over SQLite. The pipeline never caches
//! anything it reads through them across operations.

use anyhow::Result;
use uuid::Uuid;

use crate::models::{Activity, Business, Lead, TeamMember, User};

/// Persistence for leads, their activities and the assignee tables
pub trait LeadStore {
    /// Every lead, unfiltered. Filtering and stats happen above the store.
    fn list_leads(&self) -> Result<Vec<Lead>>;

    fn get_lead(&self, id: Uuid) -> Result<Option<Lead>>;

    /// Insert a new lead together with its initial activities, atomically
    fn insert_lead(&self, lead: &Lead, activities: &[Activity]) -> Result<()>;

    /// Overwrite a lead and append activities, atomically, provided the stored
    /// row is still at `prior_version`. Returns false and writes nothing when
    /// the row is gone or another writer got there first.
    fn save_lead(&self, lead: &Lead, prior_version: i64, activities: &[Activity]) -> Result<bool>;

    /// Append a single activity without touching the lead row
    fn insert_activity(&self, activity: &Activity) -> Result<()>;

    /// Hard delete; activities go with it. Returns false if nothing matched.
    fn delete_lead(&self, id: Uuid) -> Result<bool>;

    /// Activities for a lead, newest first
    fn list_activities(&self, lead_id: Uuid) -> Result<Vec<Activity>>;

    fn get_team_member(&self, id: Uuid) -> Result<Option<TeamMember>>;

    fn get_user(&self, id: Uuid) -> Result<Option<User>>;
}

/// Read-only view of storefront accounts that leads convert into
pub trait BusinessDirectory {
    fn get_business(&self, id: Uuid) -> Result<Option<Business>>;

    /// Case-insensitive substring match over name, slug and email. Unranked.
    fn search_businesses(&self, query: &str) -> Result<Vec<Business>>;

    /// Businesses whose email equals `email`, ignoring case and surrounding space
    fn find_businesses_by_email(&self, email: &str) -> Result<Vec<Business>>;
}
