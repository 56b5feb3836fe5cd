use anyhow::Result;
use serde::Serialize;

use crate::cli::display::{print_json, print_lead_table};
use crate::cli::ListArgs;
use crate::config::Config;
use crate::db::Database;
use crate::models::{Lead, TeamMember, User};
use crate::pipeline::{run_query, LeadQuery, Pagination};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    leads: Vec<Lead>,
    pagination: Pagination,
    /// Legacy assignable users
    team_members: Vec<User>,
    sales_team: Vec<TeamMember>,
}

/// Execute the list command
pub fn run_list(db: &Database, config: &Config, args: &ListArgs, json: bool) -> Result<()> {
    let query = LeadQuery {
        filter: args.filter.to_filter(),
        sort: args.filter.sort,
        page: args.page,
        limit: args.limit.unwrap_or(config.page_size),
    };
    let page = run_query(db, &query)?;

    if json {
        let response = ListResponse {
            leads: page.leads,
            pagination: page.pagination,
            team_members: db.list_users()?,
            sales_team: db.list_team_members()?,
        };
        return print_json(&response);
    }

    let p = page.pagination;
    if p.total == 0 {
        println!("No leads.");
        return Ok(());
    }

    println!("Leads ({} total, page {} of {})\n", p.total, p.page, p.pages.max(1));
    print_lead_table(&page.leads);
    if p.page < p.pages {
        println!("\nMore: leadcmd list --page {}", p.page + 1);
    }
    Ok(())
}
