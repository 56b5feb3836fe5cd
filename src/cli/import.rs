use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cli::display::print_json;
use crate::db::Database;
use crate::models::{Business, TeamMember, User};

/// Reference data file. Every section is optional.
///
/// ```json
/// { "businesses": [{ "name": "Acme", "slug": "acme", "email": "ceo@acme.com" }],
///   "teamMembers": [{ "id": "…", "name": "Sam", "role": "AE" }],
///   "users": [{ "id": "…", "name": "Legacy Admin" }] }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectoryFile {
    pub businesses: Vec<BusinessRow>,
    pub team_members: Vec<PersonRow>,
    pub users: Vec<PersonRow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRow {
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub plan: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl BusinessRow {
    fn into_business(self) -> Result<Business> {
        let name = self.name.trim();
        if name.is_empty() {
            bail!("business name is required");
        }
        let slug = self.slug.unwrap_or_else(|| slugify(name));
        if slug.is_empty() {
            bail!("business {} has no usable slug", name);
        }

        let mut business = Business::new(name.to_string(), slug);
        if let Some(id) = self.id {
            business.id = id;
        }
        business.email = self.email.map(|e| e.trim().to_lowercase());
        business.plan = self.plan;
        if let Some(created_at) = self.created_at {
            business.created_at = created_at;
        }
        Ok(business)
    }
}

/// Team member or legacy user. Ids are required so leads can point at them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRow {
    pub id: Uuid,
    pub name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub avatar: Option<String>,
}

/// Deserialize empty strings as None.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

fn slugify(name: &str) -> String {
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Import results summary.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub businesses: u32,
    pub team_members: u32,
    pub users: u32,
    pub errors: u32,
}

/// Execute the import command.
pub fn run_import(db: &Database, file: &str, dry_run: bool, json: bool) -> Result<()> {
    let path = Path::new(file);
    if !path.exists() {
        bail!("File not found: {}", file);
    }

    let reader = BufReader::new(File::open(path).context("Failed to open directory file")?);
    let directory: DirectoryFile =
        serde_json::from_reader(reader).with_context(|| format!("Failed to parse {}", file))?;

    if !json {
        if dry_run {
            eprintln!("Dry run: {}", file);
        } else {
            eprintln!("Importing: {}", file);
        }
    }

    let stats = import_directory(db, directory, dry_run)?;

    if json {
        return print_json(&stats);
    }
    print_summary(&stats, dry_run);
    Ok(())
}

/// Load every valid record in one transaction. Bad rows are reported and
/// skipped; a store failure rolls the whole file back.
pub fn import_directory(db: &Database, directory: DirectoryFile, dry_run: bool) -> Result<ImportStats> {
    let stats = if dry_run {
        load_directory(db, directory, true)?
    } else {
        db.in_transaction(|_| load_directory(db, directory, false))?
    };

    tracing::info!(
        businesses = stats.businesses,
        team_members = stats.team_members,
        users = stats.users,
        errors = stats.errors,
        dry_run,
        "imported directory"
    );
    Ok(stats)
}

fn load_directory(db: &Database, directory: DirectoryFile, dry_run: bool) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    for (idx, row) in directory.businesses.into_iter().enumerate() {
        let has_id = row.id.is_some();
        let business = row
            .into_business()
            .and_then(|business| match_existing(db, business, has_id));
        match business {
            Ok(business) => {
                if !dry_run {
                    db.upsert_business(&business)
                        .with_context(|| format!("business {}", business.slug))?;
                }
                stats.businesses += 1;
            }
            Err(e) => {
                eprintln!("businesses[{}]: {}", idx, e);
                stats.errors += 1;
            }
        }
    }

    for (idx, row) in directory.team_members.into_iter().enumerate() {
        if row.name.trim().is_empty() {
            eprintln!("teamMembers[{}]: name is required", idx);
            stats.errors += 1;
            continue;
        }
        let member = TeamMember {
            id: row.id,
            name: row.name.trim().to_string(),
            email: row.email,
            role: row.role,
            avatar: row.avatar,
            assigned_leads: 0,
        };
        if !dry_run {
            db.insert_team_member(&member)?;
        }
        stats.team_members += 1;
    }

    for (idx, row) in directory.users.into_iter().enumerate() {
        if row.name.trim().is_empty() {
            eprintln!("users[{}]: name is required", idx);
            stats.errors += 1;
            continue;
        }
        let user = User {
            id: row.id,
            name: row.name.trim().to_string(),
            email: row.email,
        };
        if !dry_run {
            db.insert_user(&user)?;
        }
        stats.users += 1;
    }

    Ok(stats)
}

/// Rows without an id refresh the business that already owns their slug.
/// A row whose id disagrees with the slug's owner is rejected.
fn match_existing(db: &Database, mut business: Business, has_id: bool) -> Result<Business> {
    let Some(existing) = db.find_business_by_slug(&business.slug)? else {
        return Ok(business);
    };
    if !has_id {
        business.id = existing.id;
        business.created_at = existing.created_at;
    } else if existing.id != business.id {
        bail!("slug {} already belongs to business {}", business.slug, existing.id);
    }
    Ok(business)
}

fn print_summary(stats: &ImportStats, dry_run: bool) {
    let verb = if dry_run { "Would import" } else { "Imported" };

    println!(
        "{} {} businesses, {} team members, {} users",
        verb, stats.businesses, stats.team_members, stats.users
    );

    if stats.errors > 0 {
        println!("Errors: {}", stats.errors);
    }
}
