use anyhow::{bail, Result};
use inquire::ui::{RenderConfig, Styled};
use inquire::Confirm;
use uuid::Uuid;

use crate::cli::display::print_json;
use crate::db::Database;
use crate::models::Lead;
use crate::pipeline::{delete_lead, get_lead};

/// Execute the delete command
pub fn run_delete(db: &Database, id: Uuid, force: bool, json: bool) -> Result<()> {
    let lead = get_lead(db, id)?;

    if !force {
        if json {
            bail!("--yes is required with --json");
        }
        print_lead_summary(&lead);
        println!();

        let confirmed = Confirm::new(&format!("Delete {}?", lead.name))
            .with_render_config(minimal_render_config())
            .with_default(false)
            .prompt()
            .unwrap_or(false);

        if !confirmed {
            return Ok(());
        }
    }

    delete_lead(db, id)?;

    if json {
        return print_json(&serde_json::json!({ "success": true }));
    }
    println!("Deleted.");
    Ok(())
}

fn print_lead_summary(lead: &Lead) {
    println!("{}", lead.name);
    if let Some(ref company) = lead.company {
        println!("  {}", company);
    }
    if let Some(ref email) = lead.email {
        println!("  {}", email);
    }
    println!("  {} · {} activities", lead.status.label(), lead.counts.activities);
}

fn minimal_render_config() -> RenderConfig<'static> {
    RenderConfig::default_colored()
        .with_prompt_prefix(Styled::new(""))
        .with_answered_prompt_prefix(Styled::new(""))
}
