use anyhow::Result;
use uuid::Uuid;

use crate::cli::display::{print_json, print_lead_detail, truncate};
use crate::cli::BusinessSearchArgs;
use crate::config::Config;
use crate::db::Database;
use crate::models::LeadStatus;
use crate::pipeline::{link_manually, search_businesses, unlink, BusinessQuery};

/// Execute `business search`
pub fn run_business_search(
    db: &Database,
    config: &Config,
    args: BusinessSearchArgs,
    json: bool,
) -> Result<()> {
    let query = match (args.email, args.q) {
        (Some(email), _) => BusinessQuery::Email(email),
        (None, q) => BusinessQuery::Text(q.unwrap_or_default()),
    };
    let found = search_businesses(db, &query, config.business_search_limit)?;

    if json {
        return print_json(&found);
    }

    if found.businesses.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    for business in &found.businesses {
        println!(
            "{:<28}  {:<20}  {:<28}  {}",
            truncate(&business.name, 28),
            truncate(&business.slug, 20),
            truncate(business.email.as_deref().unwrap_or_default(), 28),
            business.id
        );
    }
    if found.exact_match {
        println!("\nExact email match.");
    }
    Ok(())
}

/// Execute the link command
pub fn run_link(db: &Database, lead_id: Uuid, business_id: Uuid, json: bool) -> Result<()> {
    let lead = link_manually(db, lead_id, business_id)?;

    if json {
        return print_json(&lead);
    }

    if lead.status == LeadStatus::Won {
        println!("Linked.\n");
    } else {
        println!("Saved as pending; the link applies once the lead is WON.\n");
    }
    print_lead_detail(&lead);
    Ok(())
}

/// Execute the unlink command
pub fn run_unlink(db: &Database, lead_id: Uuid, json: bool) -> Result<()> {
    let lead = unlink(db, lead_id)?;

    if json {
        return print_json(&lead);
    }
    println!("Unlinked.");
    Ok(())
}
