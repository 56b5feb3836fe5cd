use anyhow::Result;

use crate::cli::display::{format_date, print_json};
use crate::cli::ActivityArgs;
use crate::config::Config;
use crate::db::Database;
use crate::pipeline::{add_activity, get_lead, ActivityInput};

/// Execute the activity command
pub fn run_activity(db: &Database, config: &Config, args: ActivityArgs, json: bool) -> Result<()> {
    let input = ActivityInput {
        activity_type: args.activity_type,
        title: args.title,
        description: args.description,
    };
    let activity = add_activity(db, args.id, input, &config.effective_actor())?;

    if json {
        return print_json(&activity);
    }

    let lead = get_lead(db, args.id)?;
    println!(
        "Logged {} for {} at {}",
        activity.activity_type,
        lead.name,
        format_date(&activity.created_at)
    );
    if lead.contact_count > 0 {
        println!("  {} contacts so far", lead.contact_count);
    }
    Ok(())
}
