//! Dashboard numbers, computed on demand over the full lead set.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::models::{Lead, LeadPriority, LeadSource, LeadStatus, OwnerKind};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverview {
    pub total: u32,
    pub new_today: u32,
    pub new_this_week: u32,
    pub new_this_month: u32,
    pub won: u32,
    pub lost: u32,
    /// won / total, 0 for an empty set
    pub conversion_rate: f64,
    pub follow_ups_due_today: u32,
    pub overdue: u32,
    pub unassigned: u32,
    /// Estimated value of leads that are still open
    pub pipeline_value: f64,
    pub average_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeCount {
    pub id: Uuid,
    pub name: String,
    pub kind: OwnerKind,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStats {
    pub overview: StatsOverview,
    pub by_status: BTreeMap<LeadStatus, u32>,
    pub by_source: BTreeMap<LeadSource, u32>,
    pub by_priority: BTreeMap<LeadPriority, u32>,
    pub by_assignee: Vec<AssigneeCount>,
}

/// Summarize `leads`. Calendar boundaries ("today", "this week", "this
/// month") are taken in `offset`; weeks start on Monday.
pub fn compute_stats(leads: &[Lead], now: DateTime<Utc>, offset: FixedOffset) -> LeadStats {
    let today = local_date(now, offset);
    let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let month_start = today.with_day(1).unwrap_or(today);

    let mut stats = LeadStats::default();
    let mut assignees: HashMap<Uuid, AssigneeCount> = HashMap::new();
    let mut score_sum: i64 = 0;

    for lead in leads {
        let overview = &mut stats.overview;
        overview.total += 1;
        score_sum += i64::from(lead.score);

        let created = local_date(lead.created_at, offset);
        if created == today {
            overview.new_today += 1;
        }
        if created >= week_start && created <= today {
            overview.new_this_week += 1;
        }
        if created >= month_start && created <= today {
            overview.new_this_month += 1;
        }

        match lead.status {
            LeadStatus::Won => overview.won += 1,
            LeadStatus::Lost => overview.lost += 1,
            _ => {}
        }

        if !lead.status.is_closed() {
            overview.pipeline_value += lead.estimated_value.unwrap_or(0.0);
            if lead
                .next_follow_up_at
                .map_or(false, |due| local_date(due, offset) == today)
            {
                overview.follow_ups_due_today += 1;
            }
        }
        if lead.is_overdue(now) {
            overview.overdue += 1;
        }

        let owner = lead.owner();
        match (owner.id(), owner.kind()) {
            (Some(id), Some(kind)) => {
                assignees
                    .entry(id)
                    .or_insert_with(|| AssigneeCount {
                        id,
                        name: owner.label().to_string(),
                        kind,
                        count: 0,
                    })
                    .count += 1;
            }
            _ => overview.unassigned += 1,
        }

        *stats.by_status.entry(lead.status).or_default() += 1;
        *stats.by_source.entry(lead.source).or_default() += 1;
        *stats.by_priority.entry(lead.priority).or_default() += 1;
    }

    let total = stats.overview.total;
    if total > 0 {
        stats.overview.conversion_rate = f64::from(stats.overview.won) / f64::from(total);
        stats.overview.average_score = score_sum as f64 / f64::from(total);
    }

    let mut by_assignee: Vec<AssigneeCount> = assignees.into_values().collect();
    by_assignee.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    stats.by_assignee = by_assignee;

    stats
}

fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}
