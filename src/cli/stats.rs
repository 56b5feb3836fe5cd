use anyhow::Result;
use chrono::Utc;

use crate::cli::display::{format_amount, print_json};
use crate::config::Config;
use crate::db::Database;
use crate::pipeline::{compute_stats, LeadStats};
use crate::store::LeadStore;

/// Execute the stats command
pub fn run_stats(db: &Database, config: &Config, json: bool) -> Result<()> {
    let leads = db.list_leads()?;
    let stats = compute_stats(&leads, Utc::now(), config.offset());

    if json {
        return print_json(&stats);
    }
    print_stats(&stats);
    Ok(())
}

fn print_stats(stats: &LeadStats) {
    let o = &stats.overview;
    println!("Pipeline\n");
    println!("  Total          {}", o.total);
    println!("  New            {} today, {} this week, {} this month", o.new_today, o.new_this_week, o.new_this_month);
    println!("  Won / lost     {} / {}", o.won, o.lost);
    println!("  Conversion     {:.1}%", o.conversion_rate * 100.0);
    println!("  Pipeline       {}", format_amount(o.pipeline_value));
    println!("  Avg score      {:.1}", o.average_score);
    println!("  Due today      {}", o.follow_ups_due_today);
    println!("  Overdue        {}", o.overdue);
    println!("  Unassigned     {}", o.unassigned);

    if !stats.by_status.is_empty() {
        println!("\nBy status");
        for (status, count) in &stats.by_status {
            println!("  {:<16} {}", status.label(), count);
        }
    }
    if !stats.by_source.is_empty() {
        println!("\nBy source");
        for (source, count) in &stats.by_source {
            println!("  {:<16} {}", source.as_str(), count);
        }
    }
    if !stats.by_priority.is_empty() {
        println!("\nBy priority");
        for (priority, count) in stats.by_priority.iter().rev() {
            println!("  {:<16} {}", priority.as_str(), count);
        }
    }
    if !stats.by_assignee.is_empty() {
        println!("\nBy owner");
        for a in &stats.by_assignee {
            println!("  {:<16} {}", a.name, a.count);
        }
    }
}
