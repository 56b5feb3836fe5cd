use anyhow::Result;
use serde::Serialize;
use uuid::Uuid;

use crate::cli::display::{print_activities, print_json, print_lead_detail};
use crate::db::Database;
use crate::models::{Activity, Lead};
use crate::pipeline::{get_lead, list_activities};

#[derive(Serialize)]
struct ShowResponse {
    lead: Lead,
    activities: Vec<Activity>,
}

/// Execute the show command
pub fn run_show(db: &Database, id: Uuid, json: bool) -> Result<()> {
    let lead = get_lead(db, id)?;
    let activities = list_activities(db, id)?;

    if json {
        return print_json(&ShowResponse { lead, activities });
    }

    print_lead_detail(&lead);
    print_activities(&activities);
    Ok(())
}
