//! Raw operator input for lead mutations, and the parsers that validate it.
//!
//! Text fields follow form semantics: `None` leaves a field alone, a blank
//! string clears it.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::error::{LeadError, LeadResult};
use crate::models::{LeadPriority, LeadSource, LeadStatus};

/// Fields accepted by create and update. Every field is optional here;
/// `create_lead` enforces `name`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub source: Option<LeadSource>,
    pub source_detail: Option<String>,
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
    pub score: Option<i32>,
    pub assigned_to_id: Option<String>,
    pub team_member_id: Option<String>,
    pub business_type: Option<String>,
    pub expected_plan: Option<String>,
    pub estimated_value: Option<String>,
    pub next_follow_up_at: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub converted_to_id: Option<String>,
    /// Reject the write if the stored version moved on
    pub expected_version: Option<i64>,
    /// Calendar that bare follow-up dates and "today" are read in; the
    /// machine's local offset when unset
    pub utc_offset: Option<FixedOffset>,
}

/// Operator-logged activity, before the type is checked
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityInput {
    pub activity_type: String,
    pub title: String,
    pub description: Option<String>,
}

/// Trim; blank becomes `None`
pub(crate) fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub(crate) fn normalize_email(value: &str) -> Option<String> {
    normalize_text(value).map(|e| e.to_lowercase())
}

/// Parse a currency amount such as "1200", "1,200.50" or "$99". Blank clears.
pub(crate) fn parse_amount(raw: &str) -> LeadResult<Option<f64>> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        Ok(_) => Err(LeadError::validation(
            "estimatedValue",
            format!("must be a non-negative amount: {}", raw.trim()),
        )),
        Err(_) => Err(LeadError::validation(
            "estimatedValue",
            format!("not a number: {}", raw.trim()),
        )),
    }
}

/// Parse an optional id reference. Blank clears.
pub(crate) fn parse_ref_id(field: &'static str, raw: &str) -> LeadResult<Option<Uuid>> {
    match normalize_text(raw) {
        None => Ok(None),
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(|_| LeadError::validation(field, format!("not a valid id: {}", s))),
    }
}

/// Parse a follow-up date: RFC 3339, YYYY-MM-DD, "today" or "tomorrow".
/// Bare dates mean the end of that day in `offset`. Blank clears.
pub(crate) fn parse_follow_up(
    raw: &str,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> LeadResult<Option<DateTime<Utc>>> {
    let input = raw.trim().to_lowercase();
    if input.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    let today = now.with_timezone(&offset).date_naive();
    let date = match input.as_str() {
        "today" => Some(today),
        "tomorrow" => today.succ_opt(),
        _ => NaiveDate::parse_from_str(&input, "%Y-%m-%d").ok(),
    };

    date.and_then(|d| d.and_hms_opt(23, 59, 59))
        .and_then(|end| offset.from_local_datetime(&end).single())
        .map(|end| Some(end.with_timezone(&Utc)))
        .ok_or_else(|| LeadError::validation("nextFollowUpAt", format!("not a date: {}", raw.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Acme "), Some("Acme".to_string()));
        assert_eq!(normalize_text("   "), None);
        assert_eq!(normalize_email(" CEO@Acme.com"), Some("ceo@acme.com".to_string()));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1200").unwrap(), Some(1200.0));
        assert_eq!(parse_amount("$1,200.50").unwrap(), Some(1200.5));
        assert_eq!(parse_amount("  ").unwrap(), None);

        let err = parse_amount("a lot").unwrap_err();
        assert_eq!(err.field(), Some("estimatedValue"));
        assert!(parse_amount("-5").is_err());
    }

    #[test]
    fn test_parse_ref_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_ref_id("teamMemberId", &id.to_string()).unwrap(), Some(id));
        assert_eq!(parse_ref_id("teamMemberId", "").unwrap(), None);
        assert_eq!(
            parse_ref_id("teamMemberId", "bob").unwrap_err().field(),
            Some("teamMemberId")
        );
    }

    #[test]
    fn test_parse_follow_up() {
        let now = Utc.with_ymd_and_hms(2025, 3, 12, 15, 0, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();

        let d = parse_follow_up("2025-03-15", now, utc).unwrap().unwrap();
        assert_eq!(d.to_rfc3339(), "2025-03-15T23:59:59+00:00");

        let exact = parse_follow_up("2025-03-15T10:00:00Z", now, utc).unwrap().unwrap();
        assert_eq!(exact.to_rfc3339(), "2025-03-15T10:00:00+00:00");

        let tomorrow = parse_follow_up("Tomorrow", now, utc).unwrap().unwrap();
        assert_eq!(tomorrow.date_naive().to_string(), "2025-03-13");
        assert_eq!(parse_follow_up("", now, utc).unwrap(), None);
        assert!(parse_follow_up("someday", now, utc).is_err());
    }

    #[test]
    fn test_bare_date_ends_in_configured_offset() {
        // 12:00 on the 12th in +10:00
        let now = Utc.with_ymd_and_hms(2025, 3, 12, 2, 0, 0).unwrap();
        let sydney = FixedOffset::east_opt(10 * 3600).unwrap();

        let due = parse_follow_up("2025-03-12", now, sydney).unwrap().unwrap();
        assert_eq!(due.to_rfc3339(), "2025-03-12T13:59:59+00:00");
        assert_eq!(parse_follow_up("today", now, sydney).unwrap(), Some(due));

        let mut lead = crate::models::Lead::new("Acme".to_string());
        lead.next_follow_up_at = Some(due);
        let stats = crate::pipeline::compute_stats(&[lead], now, sydney);
        assert_eq!(stats.overview.follow_ups_due_today, 1);
        assert_eq!(stats.overview.overdue, 0);
    }
}
