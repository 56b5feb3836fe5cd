//! Lead state machine: create, update, delete and activity logging.
//!
//! Every mutation re-reads the lead, validates the whole request before
//! touching anything, then writes the lead row and the activities it produced
//! in one transaction.

use chrono::{DateTime, Local, Offset, Utc};
use serde_json::json;
use uuid::Uuid;

use super::conversion::{apply_link, auto_match_by_email};
use super::input::{
    normalize_email, normalize_text, parse_amount, parse_follow_up, parse_ref_id, ActivityInput,
    LeadFields,
};
use crate::error::{LeadError, LeadResult};
use crate::models::{
    Activity, Lead, LeadStatus, Owner, SystemActivityType, UserActivityType,
};
use crate::store::{BusinessDirectory, LeadStore};

pub fn get_lead<S: LeadStore + ?Sized>(store: &S, id: Uuid) -> LeadResult<Lead> {
    store.get_lead(id)?.ok_or_else(|| LeadError::lead_not_found(id))
}

pub fn create_lead<S>(store: &S, fields: LeadFields, actor: &str) -> LeadResult<Lead>
where
    S: LeadStore + BusinessDirectory + ?Sized,
{
    let name = fields
        .name
        .as_deref()
        .and_then(normalize_text)
        .ok_or_else(|| LeadError::validation("name", "is required"))?;

    let now = Utc::now();
    let mut lead = Lead::new(name);
    lead.created_at = now;
    lead.updated_at = now;

    let requested = apply_fields(store, &mut lead, &fields)?;
    settle_conversion(store, &mut lead, None, requested, now)?;

    let mut activities = vec![Activity::system(
        lead.id,
        SystemActivityType::Created,
        format!("Lead created: {}", lead.name),
    )];
    if let Some(assigned) = assigned_activity(&lead, Owner::None) {
        activities.push(assigned);
    }
    for activity in &mut activities {
        activity.performed_by = Some(actor.to_string());
        activity.created_at = now;
    }

    store.insert_lead(&lead, &activities)?;
    lead.counts.activities = activities.len() as u32;

    tracing::info!(lead_id = %lead.id, status = %lead.status, "created lead");
    Ok(lead)
}

pub fn update_lead<S>(store: &S, id: Uuid, fields: LeadFields, actor: &str) -> LeadResult<Lead>
where
    S: LeadStore + BusinessDirectory + ?Sized,
{
    let current = get_lead(store, id)?;

    if let Some(expected) = fields.expected_version {
        if expected != current.version {
            tracing::warn!(lead_id = %id, expected, stored = current.version, "stale lead update");
            return Err(LeadError::Conflict {
                message: format!(
                    "lead {} is at version {}, expected {}",
                    id, current.version, expected
                ),
            });
        }
    }

    let now = Utc::now();
    let mut next = current.clone();
    let requested = apply_fields(store, &mut next, &fields)?;
    settle_conversion(store, &mut next, Some(current.status), requested, now)?;

    if next == current {
        tracing::debug!(lead_id = %id, "update changed nothing");
        return Ok(current);
    }

    let mut activities = Vec::new();
    if next.status != current.status {
        let mut activity = Activity::system(
            id,
            SystemActivityType::StatusChange,
            format!(
                "Status changed from {} to {}",
                current.status.label(),
                next.status.label()
            ),
        );
        activity.metadata = Some(json!({
            "oldStatus": current.status,
            "newStatus": next.status,
        }));
        activities.push(activity);
    }
    if let Some(assigned) = assigned_activity(&next, current.owner()) {
        activities.push(assigned);
    }
    for activity in &mut activities {
        activity.performed_by = Some(actor.to_string());
        activity.created_at = now;
    }

    next.version = current.version + 1;
    next.updated_at = now;
    commit_lead(store, &next, current.version, &activities)?;
    next.counts.activities += activities.len() as u32;

    tracing::info!(
        lead_id = %id,
        version = next.version,
        activities = activities.len(),
        "updated lead"
    );
    Ok(next)
}

pub fn delete_lead<S: LeadStore + ?Sized>(store: &S, id: Uuid) -> LeadResult<()> {
    if !store.delete_lead(id)? {
        return Err(LeadError::lead_not_found(id));
    }
    tracing::info!(lead_id = %id, "deleted lead");
    Ok(())
}

/// Log an operator activity. Anything but a NOTE counts as a contact.
pub fn add_activity<S: LeadStore + ?Sized>(
    store: &S,
    lead_id: Uuid,
    input: ActivityInput,
    actor: &str,
) -> LeadResult<Activity> {
    let kind: UserActivityType = input
        .activity_type
        .parse()
        .map_err(|e: String| LeadError::validation("type", e))?;
    let title =
        normalize_text(&input.title).ok_or_else(|| LeadError::validation("title", "is required"))?;

    let mut lead = get_lead(store, lead_id)?;
    let now = Utc::now();

    let mut activity = Activity::new(lead_id, kind, title);
    activity.description = input.description.as_deref().and_then(normalize_text);
    activity.performed_by = Some(actor.to_string());
    activity.created_at = now;

    if kind.counts_as_contact() {
        let prior_version = lead.version;
        lead.contact_count += 1;
        lead.last_contacted_at = Some(now);
        lead.version += 1;
        lead.updated_at = now;
        commit_lead(store, &lead, prior_version, std::slice::from_ref(&activity))?;
    } else {
        store.insert_activity(&activity)?;
    }

    tracing::info!(lead_id = %lead_id, kind = kind.as_str(), "logged activity");
    Ok(activity)
}

/// Write back a lead read at `prior_version`. A row that moved on in the
/// meantime is a conflict; a row that vanished is not found.
pub(crate) fn commit_lead<S: LeadStore + ?Sized>(
    store: &S,
    lead: &Lead,
    prior_version: i64,
    activities: &[Activity],
) -> LeadResult<()> {
    if store.save_lead(lead, prior_version, activities)? {
        return Ok(());
    }
    match store.get_lead(lead.id)? {
        None => Err(LeadError::lead_not_found(lead.id)),
        Some(stored) => {
            tracing::warn!(
                lead_id = %lead.id,
                read = prior_version,
                stored = stored.version,
                "lead changed underneath a write"
            );
            Err(LeadError::Conflict {
                message: format!(
                    "lead {} changed while saving (read version {}, now {})",
                    lead.id, prior_version, stored.version
                ),
            })
        }
    }
}

pub fn list_activities<S: LeadStore + ?Sized>(store: &S, lead_id: Uuid) -> LeadResult<Vec<Activity>> {
    get_lead(store, lead_id)?;
    Ok(store.list_activities(lead_id)?)
}

/// Copy supplied fields onto `lead`. Returns the requested conversion target:
/// `None` when untouched, `Some(None)` when explicitly cleared.
fn apply_fields<S: LeadStore + ?Sized>(
    store: &S,
    lead: &mut Lead,
    fields: &LeadFields,
) -> LeadResult<Option<Option<Uuid>>> {
    if let Some(name) = &fields.name {
        lead.name =
            normalize_text(name).ok_or_else(|| LeadError::validation("name", "cannot be blank"))?;
    }
    if let Some(email) = &fields.email {
        lead.email = normalize_email(email);
    }
    if let Some(phone) = &fields.phone {
        lead.phone = normalize_text(phone);
    }
    if let Some(company) = &fields.company {
        lead.company = normalize_text(company);
    }
    if let Some(country) = &fields.country {
        lead.country = normalize_text(country);
    }
    if let Some(source) = fields.source {
        lead.source = source;
    }
    if let Some(detail) = &fields.source_detail {
        lead.source_detail = normalize_text(detail);
    }
    if let Some(status) = fields.status {
        lead.status = status;
    }
    if let Some(priority) = fields.priority {
        lead.priority = priority;
    }
    if let Some(score) = fields.score {
        lead.score = score;
    }
    if let Some(business_type) = &fields.business_type {
        lead.business_type = normalize_text(business_type);
    }
    if let Some(plan) = &fields.expected_plan {
        lead.expected_plan = normalize_text(plan);
    }
    if let Some(value) = &fields.estimated_value {
        lead.estimated_value = parse_amount(value)?;
    }
    if let Some(due) = &fields.next_follow_up_at {
        let offset = fields
            .utc_offset
            .unwrap_or_else(|| Local::now().offset().fix());
        lead.next_follow_up_at = parse_follow_up(due, Utc::now(), offset)?;
    }
    if let Some(notes) = &fields.notes {
        lead.notes = normalize_text(notes);
    }
    if let Some(tags) = &fields.tags {
        lead.tags = tags.iter().filter_map(|t| normalize_text(t)).collect();
    }

    if let Some(raw) = &fields.team_member_id {
        lead.team_member = match parse_ref_id("teamMemberId", raw)? {
            None => None,
            Some(member_id) => {
                let member = store.get_team_member(member_id)?.ok_or_else(|| {
                    LeadError::validation("teamMemberId", format!("no team member {}", member_id))
                })?;
                Some(member.to_ref())
            }
        };
    }
    if let Some(raw) = &fields.assigned_to_id {
        lead.assigned_to = match parse_ref_id("assignedToId", raw)? {
            None => None,
            Some(user_id) => {
                let user = store.get_user(user_id)?.ok_or_else(|| {
                    LeadError::validation("assignedToId", format!("no user {}", user_id))
                })?;
                Some(user.to_ref())
            }
        };
    }

    match &fields.converted_to_id {
        None => Ok(None),
        Some(raw) => Ok(Some(parse_ref_id("convertedToId", raw)?)),
    }
}

/// Bring the conversion fields in line with the lead's status.
///
/// Non-WON leads never carry a link, whatever was requested. For WON leads an
/// explicit target is linked (and must exist), an explicit clear unlinks, and
/// a fresh transition into WON promotes a pending pre-link or falls back to
/// matching by email.
fn settle_conversion<S>(
    store: &S,
    lead: &mut Lead,
    previous_status: Option<LeadStatus>,
    requested: Option<Option<Uuid>>,
    now: DateTime<Utc>,
) -> LeadResult<()>
where
    S: BusinessDirectory + ?Sized,
{
    if lead.status != LeadStatus::Won {
        if lead.is_converted() || requested.flatten().is_some() {
            tracing::debug!(lead_id = %lead.id, status = %lead.status, "dropping conversion on open lead");
        }
        lead.clear_conversion();
        return Ok(());
    }

    match requested {
        Some(Some(business_id)) => {
            let business = store.get_business(business_id)?.ok_or_else(|| {
                LeadError::validation("convertedToId", format!("no business {}", business_id))
            })?;
            apply_link(lead, &business, now);
        }
        Some(None) => {
            lead.clear_conversion();
            lead.pending_conversion_id = None;
        }
        None => {
            let entering_won = previous_status != Some(LeadStatus::Won);
            if entering_won && !lead.is_converted() {
                if let Some(pending) = lead.pending_conversion_id.take() {
                    match store.get_business(pending)? {
                        Some(business) => {
                            apply_link(lead, &business, now);
                            tracing::info!(lead_id = %lead.id, business_id = %pending, "promoted pending link");
                        }
                        None => {
                            tracing::warn!(lead_id = %lead.id, business_id = %pending, "pending link target is gone");
                        }
                    }
                }
                if !lead.is_converted() {
                    auto_match_by_email(store, lead, now)?;
                }
            }
        }
    }
    Ok(())
}

/// ASSIGNED entry whenever the effective owner ends up as someone new, not
/// only when an empty owner is first set. Reassignment counts, as does falling
/// back to the legacy user when the team member is cleared. Clearing the owner
/// is not an assignment.
fn assigned_activity(lead: &Lead, before: Owner<'_>) -> Option<Activity> {
    let after = lead.owner();
    let id = after.id()?;
    if before.id() == Some(id) {
        return None;
    }

    let mut activity = Activity::system(
        lead.id,
        SystemActivityType::Assigned,
        format!("Assigned to {}", after.label()),
    );
    activity.metadata = Some(json!({
        "assigneeId": id,
        "assigneeName": after.name(),
        "kind": after.kind(),
    }));
    Some(activity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::db::Database;
    use crate::models::{ActivityType, Business, LeadPriority, LeadSource, TeamMember, User};
    use crate::pipeline::conversion::link_manually;

    fn named(name: &str) -> LeadFields {
        LeadFields {
            name: Some(name.to_string()),
            ..LeadFields::default()
        }
    }

    fn status(status: LeadStatus) -> LeadFields {
        LeadFields {
            status: Some(status),
            ..LeadFields::default()
        }
    }

    fn business(db: &Database, name: &str, email: &str) -> Business {
        let mut b = Business::new(name.to_string(), name.to_lowercase());
        b.email = Some(email.to_string());
        db.upsert_business(&b).unwrap();
        b
    }

    #[test]
    fn test_create_defaults_and_single_created_activity() {
        let db = Database::open_memory().unwrap();
        let lead = create_lead(&db, named("Acme"), "admin").unwrap();

        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.priority, LeadPriority::Medium);
        assert_eq!(lead.source, LeadSource::Other);
        assert_eq!(lead.contact_count, 0);
        assert_eq!(lead.version, 1);

        let activities = db.list_activities(lead.id).unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(
            activities[0].activity_type,
            ActivityType::System(SystemActivityType::Created)
        );
        assert_eq!(activities[0].performed_by.as_deref(), Some("admin"));
    }

    #[test]
    fn test_create_requires_name() {
        let db = Database::open_memory().unwrap();
        let err = create_lead(&db, named("   "), "admin").unwrap_err();
        assert_eq!(err.field(), Some("name"));
        assert!(db.list_leads().unwrap().is_empty());
    }

    #[test]
    fn test_create_rejects_bad_amount_without_writing() {
        let db = Database::open_memory().unwrap();
        let fields = LeadFields {
            estimated_value: Some("lots".to_string()),
            ..named("Acme")
        };
        let err = create_lead(&db, fields, "admin").unwrap_err();
        assert_eq!(err.field(), Some("estimatedValue"));
        assert!(db.list_leads().unwrap().is_empty());
    }

    #[test]
    fn test_create_with_owner_emits_assigned() {
        let db = Database::open_memory().unwrap();
        let member = TeamMember::new("Sam".to_string());
        db.insert_team_member(&member).unwrap();

        let fields = LeadFields {
            team_member_id: Some(member.id.to_string()),
            ..named("Acme")
        };
        let lead = create_lead(&db, fields, "admin").unwrap();
        assert_eq!(lead.owner().id(), Some(member.id));

        let activities = db.list_activities(lead.id).unwrap();
        assert_eq!(activities.len(), 2);
        let assigned = activities
            .iter()
            .find(|a| a.activity_type == ActivityType::System(SystemActivityType::Assigned))
            .unwrap();
        assert_eq!(assigned.metadata.as_ref().unwrap()["kind"], "TEAM_MEMBER");
    }

    #[test]
    fn test_create_rejects_unknown_owner() {
        let db = Database::open_memory().unwrap();
        let fields = LeadFields {
            team_member_id: Some(Uuid::new_v4().to_string()),
            ..named("Acme")
        };
        let err = create_lead(&db, fields, "admin").unwrap_err();
        assert_eq!(err.field(), Some("teamMemberId"));

        let fields = LeadFields {
            assigned_to_id: Some(Uuid::new_v4().to_string()),
            ..named("Acme")
        };
        let err = create_lead(&db, fields, "admin").unwrap_err();
        assert_eq!(err.field(), Some("assignedToId"));
    }

    #[test]
    fn test_update_missing_lead() {
        let db = Database::open_memory().unwrap();
        let err = update_lead(&db, Uuid::new_v4(), named("X"), "admin").unwrap_err();
        assert!(matches!(err, LeadError::NotFound { entity: "lead", .. }));
    }

    #[test]
    fn test_negotiating_to_won_auto_matches_email() {
        let db = Database::open_memory().unwrap();
        let acme = business(&db, "Acme", "ceo@acme.com");
        let fields = LeadFields {
            email: Some("CEO@Acme.com".to_string()),
            status: Some(LeadStatus::Negotiating),
            ..named("Acme")
        };
        let lead = create_lead(&db, fields, "admin").unwrap();
        assert!(lead.converted_to_id.is_none());

        let won = update_lead(&db, lead.id, status(LeadStatus::Won), "admin").unwrap();
        assert_eq!(won.converted_to_id, Some(acme.id));
        assert!(won.converted_at.is_some());
        assert_eq!(won.converted_to.as_ref().unwrap().name, "Acme");

        let activities = db.list_activities(lead.id).unwrap();
        let change = activities
            .iter()
            .find(|a| a.activity_type == ActivityType::System(SystemActivityType::StatusChange))
            .unwrap();
        let meta = change.metadata.as_ref().unwrap();
        assert_eq!(meta["oldStatus"], "NEGOTIATING");
        assert_eq!(meta["newStatus"], "WON");
    }

    #[test]
    fn test_won_to_lost_clears_conversion() {
        let db = Database::open_memory().unwrap();
        business(&db, "Acme", "ceo@acme.com");
        let fields = LeadFields {
            email: Some("ceo@acme.com".to_string()),
            ..named("Acme")
        };
        let lead = create_lead(&db, fields, "admin").unwrap();
        let won = update_lead(&db, lead.id, status(LeadStatus::Won), "admin").unwrap();
        assert!(won.is_converted());

        let lost = update_lead(&db, lead.id, status(LeadStatus::Lost), "admin").unwrap();
        assert!(lost.converted_to_id.is_none());
        assert!(lost.converted_at.is_none());
        assert!(lost.converted_to.is_none());

        let stored = db.get_lead(lead.id).unwrap().unwrap();
        assert!(stored.converted_to_id.is_none());
    }

    #[test]
    fn test_conversion_id_on_open_lead_is_dropped() {
        let db = Database::open_memory().unwrap();
        let acme = business(&db, "Acme", "ceo@acme.com");
        let lead = create_lead(&db, named("Acme"), "admin").unwrap();

        let fields = LeadFields {
            status: Some(LeadStatus::Qualified),
            converted_to_id: Some(acme.id.to_string()),
            ..LeadFields::default()
        };
        let updated = update_lead(&db, lead.id, fields, "admin").unwrap();
        assert_eq!(updated.status, LeadStatus::Qualified);
        assert!(updated.converted_to_id.is_none());
        assert!(updated.converted_at.is_none());
    }

    #[test]
    fn test_won_with_unknown_business_is_rejected() {
        let db = Database::open_memory().unwrap();
        let lead = create_lead(&db, named("Acme"), "admin").unwrap();

        let fields = LeadFields {
            status: Some(LeadStatus::Won),
            converted_to_id: Some(Uuid::new_v4().to_string()),
            ..LeadFields::default()
        };
        let err = update_lead(&db, lead.id, fields, "admin").unwrap_err();
        assert_eq!(err.field(), Some("convertedToId"));

        let stored = db.get_lead(lead.id).unwrap().unwrap();
        assert_eq!(stored.status, LeadStatus::New);
        assert_eq!(stored.version, 1);
    }

    #[test]
    fn test_explicit_link_on_won_keeps_first_converted_at() {
        let db = Database::open_memory().unwrap();
        let a = business(&db, "Acme", "a@acme.com");
        let b = business(&db, "Bolt", "b@bolt.com");
        let lead = create_lead(&db, named("Acme"), "admin").unwrap();

        let fields = LeadFields {
            status: Some(LeadStatus::Won),
            converted_to_id: Some(a.id.to_string()),
            ..LeadFields::default()
        };
        let first = update_lead(&db, lead.id, fields, "admin").unwrap();
        let stamped = first.converted_at.unwrap();

        let fields = LeadFields {
            converted_to_id: Some(b.id.to_string()),
            ..LeadFields::default()
        };
        let second = update_lead(&db, lead.id, fields, "admin").unwrap();
        assert_eq!(second.converted_to_id, Some(b.id));
        assert_eq!(second.converted_at, Some(stamped));
    }

    #[test]
    fn test_ambiguous_email_does_not_link_on_won() {
        let db = Database::open_memory().unwrap();
        business(&db, "One", "shared@x.com");
        business(&db, "Two", "shared@x.com");
        let fields = LeadFields {
            email: Some("shared@x.com".to_string()),
            ..named("Shared")
        };
        let lead = create_lead(&db, fields, "admin").unwrap();

        let won = update_lead(&db, lead.id, status(LeadStatus::Won), "admin").unwrap();
        assert_eq!(won.status, LeadStatus::Won);
        assert!(won.converted_to_id.is_none());
    }

    #[test]
    fn test_pending_link_promoted_on_won() {
        let db = Database::open_memory().unwrap();
        let acme = business(&db, "Acme", "billing@acme.com");
        let other = business(&db, "Other", "ceo@acme.com");
        let fields = LeadFields {
            email: Some("ceo@acme.com".to_string()),
            status: Some(LeadStatus::Negotiating),
            ..named("Acme")
        };
        let lead = create_lead(&db, fields, "admin").unwrap();
        link_manually(&db, lead.id, acme.id).unwrap();

        let won = update_lead(&db, lead.id, status(LeadStatus::Won), "admin").unwrap();
        assert_eq!(won.converted_to_id, Some(acme.id));
        assert_ne!(won.converted_to_id, Some(other.id));
        assert!(won.pending_conversion_id.is_none());
    }

    #[test]
    fn test_empty_update_is_idempotent() {
        let db = Database::open_memory().unwrap();
        let lead = create_lead(&db, named("Acme"), "admin").unwrap();

        let first = update_lead(&db, lead.id, LeadFields::default(), "admin").unwrap();
        let second = update_lead(&db, lead.id, LeadFields::default(), "admin").unwrap();
        assert_eq!(first, second);
        assert_eq!(second.version, 1);
        assert_eq!(db.list_activities(lead.id).unwrap().len(), 1);

        // Same values again count as no change
        let same = LeadFields {
            status: Some(LeadStatus::New),
            ..named("Acme")
        };
        let third = update_lead(&db, lead.id, same, "admin").unwrap();
        assert_eq!(third.version, 1);
        assert_eq!(db.list_activities(lead.id).unwrap().len(), 1);
    }

    #[test]
    fn test_version_bumps_and_conflicts() {
        let db = Database::open_memory().unwrap();
        let lead = create_lead(&db, named("Acme"), "admin").unwrap();

        let fields = LeadFields {
            notes: Some("first call went well".to_string()),
            expected_version: Some(1),
            ..LeadFields::default()
        };
        let updated = update_lead(&db, lead.id, fields, "admin").unwrap();
        assert_eq!(updated.version, 2);

        let stale = LeadFields {
            notes: Some("overwrite".to_string()),
            expected_version: Some(1),
            ..LeadFields::default()
        };
        let err = update_lead(&db, lead.id, stale, "admin").unwrap_err();
        assert!(matches!(err, LeadError::Conflict { .. }));

        let stored = db.get_lead(lead.id).unwrap().unwrap();
        assert_eq!(stored.notes.as_deref(), Some("first call went well"));
    }

    /// Delegates to `db`, but lets `rival` commit an update right after the
    /// first lead read.
    struct RacingStore<'a> {
        db: &'a Database,
        rival: &'a Database,
        raced: Cell<bool>,
    }

    impl LeadStore for RacingStore<'_> {
        fn list_leads(&self) -> anyhow::Result<Vec<Lead>> {
            self.db.list_leads()
        }

        fn get_lead(&self, id: Uuid) -> anyhow::Result<Option<Lead>> {
            let lead = self.db.get_lead(id)?;
            if !self.raced.replace(true) {
                let fields = LeadFields {
                    notes: Some("from rival".to_string()),
                    expected_version: Some(1),
                    ..LeadFields::default()
                };
                update_lead(self.rival, id, fields, "rival")?;
            }
            Ok(lead)
        }

        fn insert_lead(&self, lead: &Lead, activities: &[Activity]) -> anyhow::Result<()> {
            self.db.insert_lead(lead, activities)
        }

        fn save_lead(
            &self,
            lead: &Lead,
            prior_version: i64,
            activities: &[Activity],
        ) -> anyhow::Result<bool> {
            self.db.save_lead(lead, prior_version, activities)
        }

        fn insert_activity(&self, activity: &Activity) -> anyhow::Result<()> {
            self.db.insert_activity(activity)
        }

        fn delete_lead(&self, id: Uuid) -> anyhow::Result<bool> {
            self.db.delete_lead(id)
        }

        fn list_activities(&self, lead_id: Uuid) -> anyhow::Result<Vec<Activity>> {
            self.db.list_activities(lead_id)
        }

        fn get_team_member(&self, id: Uuid) -> anyhow::Result<Option<TeamMember>> {
            self.db.get_team_member(id)
        }

        fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
            self.db.get_user(id)
        }
    }

    impl BusinessDirectory for RacingStore<'_> {
        fn get_business(&self, id: Uuid) -> anyhow::Result<Option<Business>> {
            self.db.get_business(id)
        }

        fn search_businesses(&self, query: &str) -> anyhow::Result<Vec<Business>> {
            self.db.search_businesses(query)
        }

        fn find_businesses_by_email(&self, email: &str) -> anyhow::Result<Vec<Business>> {
            self.db.find_businesses_by_email(email)
        }
    }

    fn shared_file() -> (tempfile::TempDir, Database, Database) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.db");
        let db = Database::open_at(path.clone()).unwrap();
        let rival = Database::open_at(path).unwrap();
        (dir, db, rival)
    }

    #[test]
    fn test_write_committed_after_read_causes_conflict() {
        let (_dir, db, rival) = shared_file();
        let lead = create_lead(&db, named("Acme"), "admin").unwrap();

        let racing = RacingStore {
            db: &db,
            rival: &rival,
            raced: Cell::new(false),
        };
        let fields = LeadFields {
            notes: Some("from us".to_string()),
            expected_version: Some(1),
            ..LeadFields::default()
        };
        let err = update_lead(&racing, lead.id, fields, "admin").unwrap_err();
        assert!(matches!(err, LeadError::Conflict { .. }));

        let stored = db.get_lead(lead.id).unwrap().unwrap();
        assert_eq!(stored.notes.as_deref(), Some("from rival"));
        assert_eq!(stored.version, 2);
    }

    #[test]
    fn test_contact_logged_after_concurrent_write_conflicts() {
        let (_dir, db, rival) = shared_file();
        let lead = create_lead(&db, named("Acme"), "admin").unwrap();

        let racing = RacingStore {
            db: &db,
            rival: &rival,
            raced: Cell::new(false),
        };
        let input = ActivityInput {
            activity_type: "CALL".to_string(),
            title: "Intro call".to_string(),
            description: None,
        };
        let err = add_activity(&racing, lead.id, input, "admin").unwrap_err();
        assert!(matches!(err, LeadError::Conflict { .. }));

        let stored = db.get_lead(lead.id).unwrap().unwrap();
        assert_eq!(stored.contact_count, 0);
        assert_eq!(stored.notes.as_deref(), Some("from rival"));
        assert_eq!(db.list_activities(lead.id).unwrap().len(), 1);
    }

    #[test]
    fn test_blank_clears_optional_fields() {
        let db = Database::open_memory().unwrap();
        let fields = LeadFields {
            phone: Some("555-0100".to_string()),
            estimated_value: Some("1,500".to_string()),
            ..named("Acme")
        };
        let lead = create_lead(&db, fields, "admin").unwrap();
        assert_eq!(lead.estimated_value, Some(1500.0));

        let clear = LeadFields {
            phone: Some("  ".to_string()),
            estimated_value: Some(String::new()),
            ..LeadFields::default()
        };
        let updated = update_lead(&db, lead.id, clear, "admin").unwrap();
        assert!(updated.phone.is_none());
        assert!(updated.estimated_value.is_none());
        assert_eq!(updated.created_at, lead.created_at);
    }

    #[test]
    fn test_reassignment_emits_assigned_but_clearing_does_not() {
        let db = Database::open_memory().unwrap();
        let user = User::new("Legacy".to_string());
        db.insert_user(&user).unwrap();
        let member = TeamMember::new("Sam".to_string());
        db.insert_team_member(&member).unwrap();

        let lead = create_lead(&db, named("Acme"), "admin").unwrap();
        let assigned = |f: LeadFields| update_lead(&db, lead.id, f, "admin").unwrap();

        assigned(LeadFields {
            assigned_to_id: Some(user.id.to_string()),
            ..LeadFields::default()
        });
        let both = assigned(LeadFields {
            team_member_id: Some(member.id.to_string()),
            ..LeadFields::default()
        });
        assert_eq!(both.owner().id(), Some(member.id));

        // Dropping the team member falls back to the legacy user
        let fallback = assigned(LeadFields {
            team_member_id: Some(String::new()),
            ..LeadFields::default()
        });
        assert_eq!(fallback.owner().id(), Some(user.id));

        assigned(LeadFields {
            assigned_to_id: Some(String::new()),
            ..LeadFields::default()
        });

        let count = db
            .list_activities(lead.id)
            .unwrap()
            .iter()
            .filter(|a| a.activity_type == ActivityType::System(SystemActivityType::Assigned))
            .count();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_call_then_note_contact_count() {
        let db = Database::open_memory().unwrap();
        let lead = create_lead(&db, named("Acme"), "admin").unwrap();
        for _ in 0..2 {
            add_activity(
                &db,
                lead.id,
                ActivityInput {
                    activity_type: "EMAIL_SENT".to_string(),
                    title: "Intro".to_string(),
                    description: None,
                },
                "admin",
            )
            .unwrap();
        }
        assert_eq!(get_lead(&db, lead.id).unwrap().contact_count, 2);

        add_activity(
            &db,
            lead.id,
            ActivityInput {
                activity_type: "CALL".to_string(),
                title: "Discovery call".to_string(),
                description: Some("Talked pricing".to_string()),
            },
            "admin",
        )
        .unwrap();
        let after_call = get_lead(&db, lead.id).unwrap();
        assert_eq!(after_call.contact_count, 3);
        assert!(after_call.last_contacted_at.is_some());

        add_activity(
            &db,
            lead.id,
            ActivityInput {
                activity_type: "NOTE".to_string(),
                title: "Prefers email".to_string(),
                description: None,
            },
            "admin",
        )
        .unwrap();
        let after_note = get_lead(&db, lead.id).unwrap();
        assert_eq!(after_note.contact_count, 3);
        assert_eq!(after_note.last_contacted_at, after_call.last_contacted_at);
        assert_eq!(after_note.counts.activities, 5);
    }

    #[test]
    fn test_add_activity_rejects_system_and_unknown_types() {
        let db = Database::open_memory().unwrap();
        let lead = create_lead(&db, named("Acme"), "admin").unwrap();

        for kind in ["STATUS_CHANGE", "CREATED", "fax"] {
            let err = add_activity(
                &db,
                lead.id,
                ActivityInput {
                    activity_type: kind.to_string(),
                    title: "x".to_string(),
                    description: None,
                },
                "admin",
            )
            .unwrap_err();
            assert_eq!(err.field(), Some("type"));
        }

        let err = add_activity(
            &db,
            lead.id,
            ActivityInput {
                activity_type: "CALL".to_string(),
                title: " ".to_string(),
                description: None,
            },
            "admin",
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("title"));
        assert_eq!(db.list_activities(lead.id).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_and_list_activities_for_missing_lead() {
        let db = Database::open_memory().unwrap();
        let lead = create_lead(&db, named("Acme"), "admin").unwrap();

        delete_lead(&db, lead.id).unwrap();
        assert!(matches!(
            delete_lead(&db, lead.id),
            Err(LeadError::NotFound { .. })
        ));
        assert!(matches!(
            list_activities(&db, lead.id),
            Err(LeadError::NotFound { .. })
        ));
    }
}
