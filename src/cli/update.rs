use anyhow::Result;

use crate::cli::display::{print_json, print_lead_detail};
use crate::cli::UpdateArgs;
use crate::config::Config;
use crate::db::Database;
use crate::pipeline::{get_lead, update_lead};

/// Execute the update command
pub fn run_update(db: &Database, config: &Config, args: UpdateArgs, json: bool) -> Result<()> {
    let id = args.id;
    let mut fields = args.fields.into_fields(args.name);
    fields.expected_version = args.expected_version;
    fields.utc_offset = Some(config.offset());

    let before = get_lead(db, id)?.version;
    let lead = update_lead(db, id, fields, &config.effective_actor())?;

    if json {
        return print_json(&lead);
    }

    if lead.version == before {
        println!("No changes.\n");
    } else {
        println!("Updated.\n");
    }
    print_lead_detail(&lead);
    Ok(())
}
