use std::fs::File;
use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::ExportArgs;
use crate::db::Database;
use crate::models::Lead;
use crate::pipeline::{sort_leads, LeadFilter, SortKey};
use crate::store::LeadStore;

/// One CSV line per lead, owner already resolved
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: String,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    company: &'a str,
    country: &'a str,
    status: &'static str,
    source: &'static str,
    priority: &'static str,
    score: i32,
    owner: &'a str,
    estimated_value: Option<f64>,
    contact_count: u32,
    last_contacted_at: String,
    next_follow_up_at: String,
    converted_to: &'a str,
    tags: String,
    created_at: String,
}

impl<'a> From<&'a Lead> for ExportRow<'a> {
    fn from(lead: &'a Lead) -> Self {
        Self {
            id: lead.id.to_string(),
            name: &lead.name,
            email: lead.email.as_deref().unwrap_or_default(),
            phone: lead.phone.as_deref().unwrap_or_default(),
            company: lead.company.as_deref().unwrap_or_default(),
            country: lead.country.as_deref().unwrap_or_default(),
            status: lead.status.as_str(),
            source: lead.source.as_str(),
            priority: lead.priority.as_str(),
            score: lead.score,
            owner: lead.owner().name().unwrap_or_default(),
            estimated_value: lead.estimated_value,
            contact_count: lead.contact_count,
            last_contacted_at: lead.last_contacted_at.map(|d| d.to_rfc3339()).unwrap_or_default(),
            next_follow_up_at: lead.next_follow_up_at.map(|d| d.to_rfc3339()).unwrap_or_default(),
            converted_to: lead
                .converted_to
                .as_ref()
                .map(|b| b.slug.as_str())
                .unwrap_or_default(),
            tags: lead.tags.iter().cloned().collect::<Vec<_>>().join(";"),
            created_at: lead.created_at.to_rfc3339(),
        }
    }
}

/// Execute the export command
pub fn run_export(db: &Database, args: &ExportArgs) -> Result<()> {
    let leads = db.list_leads()?;
    let filter = args.filter.to_filter();

    let count = match args.output.as_deref() {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
            let count = write_csv(file, leads, &filter, args.filter.sort)?;
            eprintln!("Exported {} leads to {}", count, path);
            count
        }
        None => write_csv(io::stdout().lock(), leads, &filter, args.filter.sort)?,
    };

    tracing::info!(count, "exported leads");
    Ok(())
}

/// Write matching leads in sort order. Returns the number of rows written.
pub fn write_csv<W: Write>(
    writer: W,
    mut leads: Vec<Lead>,
    filter: &LeadFilter,
    sort: SortKey,
) -> Result<usize> {
    leads.retain(|lead| filter.matches(lead));
    sort_leads(&mut leads, sort);

    let mut csv_writer = csv::Writer::from_writer(writer);
    for lead in &leads {
        csv_writer.serialize(ExportRow::from(lead))?;
    }
    csv_writer.flush()?;
    Ok(leads.len())
}
