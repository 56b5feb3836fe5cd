use anyhow::Result;

use crate::cli::display::{print_json, truncate};
use crate::db::Database;

/// Execute the team command
pub fn run_team(db: &Database, json: bool) -> Result<()> {
    let members = db.list_team_members()?;

    if json {
        return print_json(&members);
    }

    if members.is_empty() {
        println!("No team members. Load some with: leadcmd import <file.json>");
        return Ok(());
    }

    println!("{:<24}  {:<16}  {:>5}  ID", "NAME", "ROLE", "LEADS");
    for member in &members {
        println!(
            "{:<24}  {:<16}  {:>5}  {}",
            truncate(&member.name, 24),
            truncate(member.role.as_deref().unwrap_or_default(), 16),
            member.assigned_leads,
            member.id
        );
    }
    Ok(())
}
