//! Reference tables: sales team, legacy users and the business directory.

use anyhow::Result;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::models::{Business, TeamMember, User};
use crate::store::BusinessDirectory;

const TEAM_SELECT: &str = r#"SELECT
    t.id, t.name, t.email, t.role, t.avatar,
    (SELECT COUNT(*) FROM leads l WHERE l.team_member_id = t.id)
FROM team_members t"#;

impl Database {
    // ==================== TEAM MEMBERS ====================

    pub fn insert_team_member(&self, member: &TeamMember) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO team_members (id, name, email, role, avatar) VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   name = excluded.name, email = excluded.email,
                   role = excluded.role, avatar = excluded.avatar"#,
            params![
                member.id.to_string(),
                member.name,
                member.email,
                member.role,
                member.avatar,
            ],
        )?;
        Ok(())
    }

    /// Sales team with live lead counts, busiest first
    pub fn list_team_members(&self) -> Result<Vec<TeamMember>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY 6 DESC, t.name ASC", TEAM_SELECT))?;

        let members = stmt
            .query_map([], Self::row_to_team_member)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(members)
    }

    pub(crate) fn find_team_member(&self, id: Uuid) -> Result<Option<TeamMember>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE t.id = ?", TEAM_SELECT))?;

        match stmt.query_row([id.to_string()], Self::row_to_team_member) {
            Ok(member) => Ok(Some(member)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn row_to_team_member(row: &Row) -> rusqlite::Result<TeamMember> {
        Ok(TeamMember {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            name: row.get(1)?,
            email: row.get(2)?,
            role: row.get(3)?,
            avatar: row.get(4)?,
            assigned_leads: row.get(5)?,
        })
    }

    // ==================== LEGACY USERS ====================

    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO users (id, name, email) VALUES (?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET name = excluded.name, email = excluded.email"#,
            params![user.id.to_string(), user.name, user.email],
        )?;
        Ok(())
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email FROM users ORDER BY name ASC")?;

        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(users)
    }

    pub(crate) fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let result = self.conn.query_row(
            "SELECT id, name, email FROM users WHERE id = ?",
            [id.to_string()],
            Self::row_to_user,
        );

        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            name: row.get(1)?,
            email: row.get(2)?,
        })
    }

    // ==================== BUSINESSES ====================

    /// Import or refresh a business record. Linked leads keep their snapshot.
    pub fn upsert_business(&self, business: &Business) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO businesses (id, name, slug, email, plan, created_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   name = excluded.name, slug = excluded.slug,
                   email = excluded.email, plan = excluded.plan"#,
            params![
                business.id.to_string(),
                business.name,
                business.slug,
                business.email,
                business.plan,
                business.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn find_business_by_slug(&self, slug: &str) -> Result<Option<Business>> {
        let result = self.conn.query_row(
            "SELECT id, name, slug, email, plan, created_at FROM businesses WHERE slug = ?",
            [slug],
            Self::row_to_business,
        );

        match result {
            Ok(business) => Ok(Some(business)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn count_businesses(&self) -> Result<u32> {
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM businesses", [], |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_business(row: &Row) -> rusqlite::Result<Business> {
        Ok(Business {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            email: row.get(3)?,
            plan: row.get(4)?,
            created_at: parse_datetime(&row.get::<_, String>(5)?)?,
        })
    }
}

impl BusinessDirectory for Database {
    fn get_business(&self, id: Uuid) -> Result<Option<Business>> {
        let result = self.conn.query_row(
            "SELECT id, name, slug, email, plan, created_at FROM businesses WHERE id = ?",
            [id.to_string()],
            Self::row_to_business,
        );

        match result {
            Ok(business) => Ok(Some(business)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn search_businesses(&self, query: &str) -> Result<Vec<Business>> {
        let pattern = format!("%{}%", query.trim().to_lowercase());
        let mut stmt = self.conn.prepare(
            r#"SELECT id, name, slug, email, plan, created_at FROM businesses
               WHERE LOWER(name) LIKE ?1 OR LOWER(slug) LIKE ?1 OR LOWER(COALESCE(email, '')) LIKE ?1"#,
        )?;

        let businesses = stmt
            .query_map([pattern], Self::row_to_business)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(businesses)
    }

    fn find_businesses_by_email(&self, email: &str) -> Result<Vec<Business>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT id, name, slug, email, plan, created_at FROM businesses
               WHERE LOWER(TRIM(email)) = ? ORDER BY name ASC"#,
        )?;

        let businesses = stmt
            .query_map([email.trim().to_lowercase()], Self::row_to_business)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(businesses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Lead;
    use crate::store::LeadStore;

    fn business(name: &str, slug: &str, email: Option<&str>) -> Business {
        let mut b = Business::new(name.to_string(), slug.to_string());
        b.email = email.map(str::to_string);
        b
    }

    #[test]
    fn test_team_member_lead_counts() {
        let db = Database::open_memory().unwrap();

        let busy = TeamMember::new("Busy".to_string());
        let idle = TeamMember::new("Idle".to_string());
        db.insert_team_member(&busy).unwrap();
        db.insert_team_member(&idle).unwrap();

        for i in 0..2 {
            let mut lead = Lead::new(format!("Lead {}", i));
            lead.team_member = Some(busy.to_ref());
            db.insert_lead(&lead, &[]).unwrap();
        }

        let members = db.list_team_members().unwrap();
        assert_eq!(members[0].name, "Busy");
        assert_eq!(members[0].assigned_leads, 2);
        assert_eq!(members[1].assigned_leads, 0);
        assert_eq!(db.find_team_member(idle.id).unwrap().unwrap().name, "Idle");
    }

    #[test]
    fn test_user_crud() {
        let db = Database::open_memory().unwrap();
        let user = User::new("Admin".to_string());
        db.insert_user(&user).unwrap();

        assert_eq!(db.list_users().unwrap().len(), 1);
        assert_eq!(db.find_user(user.id).unwrap().unwrap().name, "Admin");
        assert!(db.find_user(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_find_by_email_is_case_insensitive() {
        let db = Database::open_memory().unwrap();
        db.upsert_business(&business("Acme", "acme", Some("CEO@Acme.com")))
            .unwrap();
        db.upsert_business(&business("Other", "other", Some("hi@other.com")))
            .unwrap();

        let found = db.find_businesses_by_email("  ceo@acme.COM ").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "acme");
    }

    #[test]
    fn test_search_matches_name_slug_email() {
        let db = Database::open_memory().unwrap();
        db.upsert_business(&business("Pizza Roma", "roma", None)).unwrap();
        db.upsert_business(&business("Tacos", "tacos-pizza", None)).unwrap();
        db.upsert_business(&business("Books", "books", Some("pizza@books.io")))
            .unwrap();
        db.upsert_business(&business("Unrelated", "nope", None)).unwrap();

        assert_eq!(db.search_businesses("PIZZA").unwrap().len(), 3);
        assert_eq!(db.count_businesses().unwrap(), 4);
    }

    #[test]
    fn test_upsert_refreshes_business() {
        let db = Database::open_memory().unwrap();
        let mut b = business("Old Name", "shop", None);
        db.upsert_business(&b).unwrap();

        b.name = "New Name".to_string();
        db.upsert_business(&b).unwrap();
        assert_eq!(db.get_business(b.id).unwrap().unwrap().name, "New Name");
    }
}
