use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::error::LeadError;
use crate::models::{Activity, ActivityType, Lead};

/// Print any response as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Report a failed command. JSON mode prints `{"error", "field"?, "message"}`
/// on stdout so scripts can parse it; otherwise a plain line goes to stderr.
pub fn print_error(err: &anyhow::Error, json: bool) {
    if !json {
        eprintln!("Error: {:#}", err);
        return;
    }

    let (kind, field) = match err.downcast_ref::<LeadError>() {
        Some(e) => (e.kind(), e.field()),
        None => ("error", None),
    };
    let mut body = serde_json::json!({ "error": kind, "message": err.to_string() });
    if let Some(field) = field {
        body["field"] = serde_json::Value::from(field);
    }
    println!("{}", body);
}

/// Get terminal width, defaulting to 80 if unavailable
pub fn get_term_width() -> usize {
    crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80)
}

/// Column layout based on terminal width
struct ColumnLayout {
    name_width: usize,
    contact_width: usize,
    show_value: bool,
}

impl ColumnLayout {
    fn for_width(width: usize) -> Self {
        if width >= 100 {
            ColumnLayout {
                name_width: 26,
                contact_width: 28,
                show_value: true,
            }
        } else {
            ColumnLayout {
                name_width: 22,
                contact_width: width.saturating_sub(60).max(10),
                show_value: false,
            }
        }
    }
}

pub fn print_lead_table(leads: &[Lead]) {
    let layout = ColumnLayout::for_width(get_term_width());

    let mut header = format!(
        "{:<name_w$}  {:<contact_w$}  {:<14}  {:<8}  {:<16}",
        "NAME",
        "EMAIL/PHONE",
        "STATUS",
        "PRIORITY",
        "OWNER",
        name_w = layout.name_width,
        contact_w = layout.contact_width
    );
    if layout.show_value {
        header.push_str("  VALUE");
    }
    println!("{}", header);

    let now = Utc::now();
    for lead in leads {
        let contact = lead
            .email
            .as_deref()
            .or(lead.phone.as_deref())
            .unwrap_or_default();
        let status = if lead.is_overdue(now) {
            format!("{}!", lead.status.label())
        } else {
            lead.status.label().to_string()
        };

        let mut line = format!(
            "{:<name_w$}  {:<contact_w$}  {:<14}  {:<8}  {:<16}",
            truncate(&lead.name, layout.name_width),
            truncate(contact, layout.contact_width),
            status,
            lead.priority.as_str(),
            truncate(lead.owner().label(), 16),
            name_w = layout.name_width,
            contact_w = layout.contact_width
        );
        if layout.show_value {
            if let Some(value) = lead.estimated_value {
                line.push_str(&format!("  {}", format_amount(value)));
            }
        }
        println!("{}", line.trim_end());
    }
}

/// Print a lead with only its non-empty fields
pub fn print_lead_detail(lead: &Lead) {
    println!("{}\n", lead.name);

    if let Some(ref company) = lead.company {
        println!("  {}", company);
    }
    if let Some(ref email) = lead.email {
        println!("  {}", email);
    }
    if let Some(ref phone) = lead.phone {
        println!("  {}", phone);
    }
    if let Some(ref country) = lead.country {
        println!("  {}", country);
    }

    println!();
    println!("  Status     {}", lead.status.label());
    println!("  Priority   {}", lead.priority.as_str());
    println!("  Source     {}", lead.source.as_str());
    if let Some(ref detail) = lead.source_detail {
        println!("             {}", detail);
    }
    println!("  Score      {}", lead.score);
    println!("  Owner      {}", lead.owner().label());

    if let Some(value) = lead.estimated_value {
        println!("  Value      {}", format_amount(value));
    }
    if let Some(ref plan) = lead.expected_plan {
        println!("  Plan       {}", plan);
    }
    if let Some(ref kind) = lead.business_type {
        println!("  Business   {}", kind);
    }

    println!("  Contacts   {}", lead.contact_count);
    if let Some(at) = lead.last_contacted_at {
        println!("  Last       {}", format_date(&at));
    }
    if let Some(due) = lead.next_follow_up_at {
        let flag = if lead.is_overdue(Utc::now()) { " (overdue)" } else { "" };
        println!("  Follow up  {}{}", format_date(&due), flag);
    }

    if let Some(ref business) = lead.converted_to {
        println!("  Converted  {} ({})", business.name, business.slug);
    } else if let Some(pending) = lead.pending_conversion_id {
        println!("  Pending    {}", pending);
    }

    if !lead.tags.is_empty() {
        let tags: Vec<&str> = lead.tags.iter().map(String::as_str).collect();
        println!("  Tags       {}", tags.join(", "));
    }
    if let Some(ref notes) = lead.notes {
        println!("\n  {}", truncate(notes, 200));
    }

    println!("\n  {}  v{}", lead.id, lead.version);
}

pub fn print_activities(activities: &[Activity]) {
    if activities.is_empty() {
        return;
    }
    println!("\nActivity");
    for activity in activities {
        let by = activity
            .performed_by
            .as_deref()
            .map(|p| format!(" ({})", p))
            .unwrap_or_default();
        println!(
            "  {}  {:<16}  {}{}",
            format_date(&activity.created_at),
            activity_label(&activity.activity_type),
            activity.title,
            by
        );
        if let Some(ref description) = activity.description {
            println!("  {:>16}  {:<16}  {}", "", "", truncate(description, 60));
        }
    }
}

/// Automatic entries are bracketed so they stand apart from logged contacts
fn activity_label(activity_type: &ActivityType) -> String {
    if activity_type.is_system() {
        format!("[{}]", activity_type)
    } else {
        activity_type.to_string()
    }
}

/// Format a timestamp in local time
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// 1234.5 -> "$1,234.50"
pub fn format_amount(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${}.{:02}", grouped, cents % 100)
}

/// Truncate to `max_len` chars, marking the cut with an ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}
