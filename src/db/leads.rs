use anyhow::Result;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use std::str::FromStr;
use uuid::Uuid;

use super::{parse_datetime, parse_opt_datetime, parse_opt_uuid, parse_uuid, Database};
use crate::models::*;
use crate::store::LeadStore;

const LEAD_SELECT: &str = r#"SELECT
    l.id, l.name, l.email, l.phone, l.company, l.country,
    l.source, l.source_detail, l.status, l.priority, l.score,
    l.assigned_to_id, u.name, u.email,
    l.team_member_id, t.name, t.email, t.role, t.avatar,
    l.business_type, l.expected_plan, l.estimated_value,
    l.last_contacted_at, l.next_follow_up_at, l.contact_count,
    l.converted_at, l.converted_to_id, l.converted_name, l.converted_slug,
    l.converted_plan, l.converted_created_at,
    l.pending_conversion_id, l.notes, l.tags, l.version, l.created_at, l.updated_at,
    (SELECT COUNT(*) FROM lead_activities a WHERE a.lead_id = l.id)
FROM leads l
LEFT JOIN users u ON u.id = l.assigned_to_id
LEFT JOIN team_members t ON t.id = l.team_member_id"#;

/// Parse a stored enum column, surfacing bad values as conversion failures
fn parse_column<T: FromStr<Err = String>>(idx: usize, s: &str) -> rusqlite::Result<T> {
    s.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

impl Database {
    // ==================== LEAD WRITE ====================

    fn insert_lead_row(conn: &Connection, lead: &Lead) -> Result<()> {
        conn.execute(
            r#"INSERT INTO leads (
                id, name, email, phone, company, country, source, source_detail,
                status, priority, score, assigned_to_id, team_member_id,
                business_type, expected_plan, estimated_value,
                last_contacted_at, next_follow_up_at, contact_count,
                converted_at, converted_to_id, converted_name, converted_slug,
                converted_plan, converted_created_at, pending_conversion_id,
                notes, tags, version, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                lead.id.to_string(),
                lead.name,
                lead.email,
                lead.phone,
                lead.company,
                lead.country,
                lead.source.as_str(),
                lead.source_detail,
                lead.status.as_str(),
                lead.priority.as_str(),
                lead.score,
                lead.assigned_to.as_ref().map(|u| u.id.to_string()),
                lead.team_member.as_ref().map(|m| m.id.to_string()),
                lead.business_type,
                lead.expected_plan,
                lead.estimated_value,
                lead.last_contacted_at.map(|d| d.to_rfc3339()),
                lead.next_follow_up_at.map(|d| d.to_rfc3339()),
                lead.contact_count,
                lead.converted_at.map(|d| d.to_rfc3339()),
                lead.converted_to_id.map(|id| id.to_string()),
                lead.converted_to.as_ref().map(|s| s.name.clone()),
                lead.converted_to.as_ref().map(|s| s.slug.clone()),
                lead.converted_to.as_ref().and_then(|s| s.plan.clone()),
                lead.converted_to.as_ref().map(|s| s.created_at.to_rfc3339()),
                lead.pending_conversion_id.map(|id| id.to_string()),
                lead.notes,
                serde_json::to_string(&lead.tags)?,
                lead.version,
                lead.created_at.to_rfc3339(),
                lead.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Overwrites every mutable column of a row still at `prior_version`.
    /// `created_at` is never touched.
    fn update_lead_row(conn: &Connection, lead: &Lead, prior_version: i64) -> Result<usize> {
        let rows = conn.execute(
            r#"UPDATE leads SET
                name = ?, email = ?, phone = ?, company = ?, country = ?,
                source = ?, source_detail = ?, status = ?, priority = ?, score = ?,
                assigned_to_id = ?, team_member_id = ?,
                business_type = ?, expected_plan = ?, estimated_value = ?,
                last_contacted_at = ?, next_follow_up_at = ?, contact_count = ?,
                converted_at = ?, converted_to_id = ?, converted_name = ?,
                converted_slug = ?, converted_plan = ?, converted_created_at = ?,
                pending_conversion_id = ?, notes = ?, tags = ?, version = ?,
                updated_at = ?
            WHERE id = ? AND version = ?"#,
            params![
                lead.name,
                lead.email,
                lead.phone,
                lead.company,
                lead.country,
                lead.source.as_str(),
                lead.source_detail,
                lead.status.as_str(),
                lead.priority.as_str(),
                lead.score,
                lead.assigned_to.as_ref().map(|u| u.id.to_string()),
                lead.team_member.as_ref().map(|m| m.id.to_string()),
                lead.business_type,
                lead.expected_plan,
                lead.estimated_value,
                lead.last_contacted_at.map(|d| d.to_rfc3339()),
                lead.next_follow_up_at.map(|d| d.to_rfc3339()),
                lead.contact_count,
                lead.converted_at.map(|d| d.to_rfc3339()),
                lead.converted_to_id.map(|id| id.to_string()),
                lead.converted_to.as_ref().map(|s| s.name.clone()),
                lead.converted_to.as_ref().map(|s| s.slug.clone()),
                lead.converted_to.as_ref().and_then(|s| s.plan.clone()),
                lead.converted_to.as_ref().map(|s| s.created_at.to_rfc3339()),
                lead.pending_conversion_id.map(|id| id.to_string()),
                lead.notes,
                serde_json::to_string(&lead.tags)?,
                lead.version,
                lead.updated_at.to_rfc3339(),
                lead.id.to_string(),
                prior_version,
            ],
        )?;
        Ok(rows)
    }

    fn insert_activity_row(conn: &Connection, activity: &Activity) -> Result<()> {
        let metadata = activity
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        conn.execute(
            "INSERT INTO lead_activities (id, lead_id, activity_type, title, description, performed_by, metadata, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                activity.id.to_string(),
                activity.lead_id.to_string(),
                activity.activity_type.as_str(),
                activity.title,
                activity.description,
                activity.performed_by,
                metadata,
                activity.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ==================== ROW MAPPING ====================

    fn row_to_lead(row: &Row) -> rusqlite::Result<Lead> {
        let assigned_to = match parse_opt_uuid(row.get(11)?)? {
            Some(id) => Some(UserRef {
                id,
                name: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
                email: row.get(13)?,
            }),
            None => None,
        };

        let team_member = match parse_opt_uuid(row.get(14)?)? {
            Some(id) => Some(TeamMemberRef {
                id,
                name: row.get::<_, Option<String>>(15)?.unwrap_or_default(),
                email: row.get(16)?,
                role: row.get(17)?,
                avatar: row.get(18)?,
            }),
            None => None,
        };

        let converted_to_id = parse_opt_uuid(row.get(26)?)?;
        let snapshot_name: Option<String> = row.get(27)?;
        let converted_to = match (converted_to_id, snapshot_name) {
            (Some(id), Some(name)) => Some(BusinessSnapshot {
                id,
                name,
                slug: row.get::<_, Option<String>>(28)?.unwrap_or_default(),
                plan: row.get(29)?,
                created_at: match row.get::<_, Option<String>>(30)? {
                    Some(s) => parse_datetime(&s)?,
                    None => parse_datetime(&row.get::<_, String>(35)?)?,
                },
            }),
            _ => None,
        };

        let tags_json: String = row.get(33)?;
        let tags: BTreeSet<String> = serde_json::from_str(&tags_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(33, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Lead {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            company: row.get(4)?,
            country: row.get(5)?,
            source: parse_column(6, &row.get::<_, String>(6)?)?,
            source_detail: row.get(7)?,
            status: parse_column(8, &row.get::<_, String>(8)?)?,
            priority: parse_column(9, &row.get::<_, String>(9)?)?,
            score: row.get(10)?,
            assigned_to,
            team_member,
            business_type: row.get(19)?,
            expected_plan: row.get(20)?,
            estimated_value: row.get(21)?,
            last_contacted_at: parse_opt_datetime(row.get(22)?)?,
            next_follow_up_at: parse_opt_datetime(row.get(23)?)?,
            contact_count: row.get(24)?,
            converted_at: parse_opt_datetime(row.get(25)?)?,
            converted_to_id,
            converted_to,
            pending_conversion_id: parse_opt_uuid(row.get(31)?)?,
            notes: row.get(32)?,
            tags,
            version: row.get(34)?,
            created_at: parse_datetime(&row.get::<_, String>(35)?)?,
            updated_at: parse_datetime(&row.get::<_, String>(36)?)?,
            counts: LeadCounts {
                activities: row.get(37)?,
            },
        })
    }

    fn row_to_activity(row: &Row) -> rusqlite::Result<Activity> {
        let type_str: String = row.get(2)?;
        let activity_type = ActivityType::parse(&type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown activity type: {}", type_str).into(),
            )
        })?;
        let metadata = match row.get::<_, Option<String>>(6)? {
            Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
            })?),
            None => None,
        };

        Ok(Activity {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            lead_id: parse_uuid(&row.get::<_, String>(1)?)?,
            activity_type,
            title: row.get(3)?,
            description: row.get(4)?,
            performed_by: row.get(5)?,
            metadata,
            created_at: parse_datetime(&row.get::<_, String>(7)?)?,
        })
    }
}

impl LeadStore for Database {
    fn list_leads(&self) -> Result<Vec<Lead>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY l.created_at DESC", LEAD_SELECT))?;

        let leads = stmt
            .query_map([], Self::row_to_lead)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(leads)
    }

    fn get_lead(&self, id: Uuid) -> Result<Option<Lead>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE l.id = ?", LEAD_SELECT))?;

        let result = stmt.query_row([id.to_string()], Self::row_to_lead);

        match result {
            Ok(lead) => Ok(Some(lead)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_lead(&self, lead: &Lead, activities: &[Activity]) -> Result<()> {
        self.in_transaction(|conn| {
            Self::insert_lead_row(conn, lead)?;
            for activity in activities {
                Self::insert_activity_row(conn, activity)?;
            }
            Ok(())
        })
    }

    fn save_lead(&self, lead: &Lead, prior_version: i64, activities: &[Activity]) -> Result<bool> {
        self.in_transaction(|conn| {
            if Self::update_lead_row(conn, lead, prior_version)? == 0 {
                return Ok(false);
            }
            for activity in activities {
                Self::insert_activity_row(conn, activity)?;
            }
            Ok(true)
        })
    }

    fn insert_activity(&self, activity: &Activity) -> Result<()> {
        Self::insert_activity_row(&self.conn, activity)
    }

    /// Hard delete a lead; activities follow via CASCADE.
    fn delete_lead(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM leads WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    fn list_activities(&self, lead_id: Uuid) -> Result<Vec<Activity>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, lead_id, activity_type, title, description, performed_by, metadata, created_at
             FROM lead_activities WHERE lead_id = ?
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let activities = stmt
            .query_map([lead_id.to_string()], Self::row_to_activity)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(activities)
    }

    fn get_team_member(&self, id: Uuid) -> Result<Option<TeamMember>> {
        self.find_team_member(id)
    }

    fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.find_user(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_insert_and_get_lead() {
        let db = Database::open_memory().unwrap();

        let mut lead = Lead::new("Acme Corp".to_string());
        lead.email = Some("ceo@acme.com".to_string());
        lead.source = LeadSource::Website;
        lead.estimated_value = Some(1200.5);
        lead.next_follow_up_at = Some(Utc::now() + Duration::days(2));
        lead.tags.insert("whatsapp".to_string());
        db.insert_lead(&lead, &[]).unwrap();

        let loaded = db.get_lead(lead.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Acme Corp");
        assert_eq!(loaded.email.as_deref(), Some("ceo@acme.com"));
        assert_eq!(loaded.source, LeadSource::Website);
        assert_eq!(loaded.estimated_value, Some(1200.5));
        assert!(loaded.tags.contains("whatsapp"));
        assert_eq!(loaded.next_follow_up_at, lead.next_follow_up_at);
        assert_eq!(loaded.version, 1);
    }

    #[test]
    fn test_get_missing_lead() {
        let db = Database::open_memory().unwrap();
        assert!(db.get_lead(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_owner_refs_are_joined() {
        let db = Database::open_memory().unwrap();

        let mut member = TeamMember::new("Rita Sales".to_string());
        member.role = Some("SALES".to_string());
        db.insert_team_member(&member).unwrap();
        let user = User::new("Old Admin".to_string());
        db.insert_user(&user).unwrap();

        let mut lead = Lead::new("Both".to_string());
        lead.team_member = Some(member.to_ref());
        lead.assigned_to = Some(user.to_ref());
        db.insert_lead(&lead, &[]).unwrap();

        let loaded = db.get_lead(lead.id).unwrap().unwrap();
        assert_eq!(loaded.team_member.as_ref().unwrap().name, "Rita Sales");
        assert_eq!(loaded.assigned_to.as_ref().unwrap().name, "Old Admin");
        assert_eq!(loaded.owner().id(), Some(member.id));
    }

    #[test]
    fn test_save_lead_and_activities() {
        let db = Database::open_memory().unwrap();

        let mut lead = Lead::new("Acme".to_string());
        db.insert_lead(&lead, &[]).unwrap();

        lead.status = LeadStatus::Contacted;
        lead.version += 1;
        let activity = Activity::new(lead.id, UserActivityType::Call, "Intro".to_string());
        assert!(db.save_lead(&lead, 1, &[activity]).unwrap());

        let loaded = db.get_lead(lead.id).unwrap().unwrap();
        assert_eq!(loaded.status, LeadStatus::Contacted);
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.counts.activities, 1);
    }

    #[test]
    fn test_save_missing_lead_writes_nothing() {
        let db = Database::open_memory().unwrap();

        let ghost = Lead::new("Ghost".to_string());
        let activity = Activity::new(ghost.id, UserActivityType::Note, "x".to_string());
        assert!(!db.save_lead(&ghost, 1, &[activity]).unwrap());
        assert!(db.list_activities(ghost.id).unwrap().is_empty());
    }

    #[test]
    fn test_save_at_stale_version_writes_nothing() {
        let db = Database::open_memory().unwrap();

        let mut lead = Lead::new("Acme".to_string());
        db.insert_lead(&lead, &[]).unwrap();

        let mut first = lead.clone();
        first.notes = Some("first".to_string());
        first.version = 2;
        assert!(db.save_lead(&first, 1, &[]).unwrap());

        lead.notes = Some("second".to_string());
        lead.version = 2;
        let activity = Activity::new(lead.id, UserActivityType::Call, "late".to_string());
        assert!(!db.save_lead(&lead, 1, &[activity]).unwrap());

        let loaded = db.get_lead(lead.id).unwrap().unwrap();
        assert_eq!(loaded.notes.as_deref(), Some("first"));
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.counts.activities, 0);
    }

    #[test]
    fn test_delete_cascades_activities() {
        let db = Database::open_memory().unwrap();

        let lead = Lead::new("Doomed".to_string());
        let a1 = Activity::system(lead.id, SystemActivityType::Created, "Lead created".to_string());
        let a2 = Activity::new(lead.id, UserActivityType::Note, "note".to_string());
        db.insert_lead(&lead, &[a1, a2]).unwrap();
        assert_eq!(db.list_activities(lead.id).unwrap().len(), 2);

        assert!(db.delete_lead(lead.id).unwrap());
        assert!(db.get_lead(lead.id).unwrap().is_none());
        assert!(db.list_activities(lead.id).unwrap().is_empty());
        assert!(!db.delete_lead(lead.id).unwrap());
    }

    #[test]
    fn test_activities_newest_first() {
        let db = Database::open_memory().unwrap();

        let lead = Lead::new("Acme".to_string());
        let mut older = Activity::new(lead.id, UserActivityType::Call, "first".to_string());
        older.created_at = Utc::now() - Duration::hours(1);
        older.metadata = Some(serde_json::json!({"k": "v"}));
        let newer = Activity::new(lead.id, UserActivityType::Meeting, "second".to_string());
        db.insert_lead(&lead, &[older, newer]).unwrap();

        let activities = db.list_activities(lead.id).unwrap();
        assert_eq!(activities[0].title, "second");
        assert_eq!(activities[1].title, "first");
        assert_eq!(activities[1].metadata.as_ref().unwrap()["k"], "v");
    }

    #[test]
    fn test_converted_snapshot_roundtrip() {
        let db = Database::open_memory().unwrap();

        let mut business = Business::new("Acme Store".to_string(), "acme".to_string());
        business.plan = Some("PRO".to_string());
        db.upsert_business(&business).unwrap();

        let mut lead = Lead::new("Acme".to_string());
        lead.status = LeadStatus::Won;
        lead.converted_to_id = Some(business.id);
        lead.converted_to = Some(business.snapshot());
        lead.converted_at = Some(Utc::now());
        db.insert_lead(&lead, &[]).unwrap();

        let loaded = db.get_lead(lead.id).unwrap().unwrap();
        let snapshot = loaded.converted_to.unwrap();
        assert_eq!(snapshot.slug, "acme");
        assert_eq!(snapshot.plan.as_deref(), Some("PRO"));
    }
}
