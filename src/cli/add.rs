use anyhow::Result;

use crate::cli::display::{print_json, print_lead_detail};
use crate::cli::AddArgs;
use crate::config::Config;
use crate::db::Database;
use crate::pipeline::create_lead;

/// Execute the add command
pub fn run_add(db: &Database, config: &Config, args: AddArgs, json: bool) -> Result<()> {
    let mut fields = args.fields.into_fields(Some(args.name));
    fields.utc_offset = Some(config.offset());
    let lead = create_lead(db, fields, &config.effective_actor())?;

    if json {
        return print_json(&lead);
    }

    println!("Added.\n");
    print_lead_detail(&lead);
    Ok(())
}
