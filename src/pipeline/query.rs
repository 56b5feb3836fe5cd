//! Filter, sort and paginate the lead list.

use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{LeadError, LeadResult};
use crate::models::{Lead, LeadPriority, LeadSource, LeadStatus};
use crate::store::LeadStore;

/// Owner filter, matched against the resolved owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeFilter {
    Unassigned,
    Id(Uuid),
}

impl FromStr for AssigneeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unassigned") {
            return Ok(Self::Unassigned);
        }
        Uuid::parse_str(s)
            .map(Self::Id)
            .map_err(|_| format!("expected a user id or \"unassigned\": {}", s))
    }
}

/// All present criteria must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub priority: Option<LeadPriority>,
    pub assignee: Option<AssigneeFilter>,
}

impl LeadFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            let hit = [
                Some(lead.name.as_str()),
                lead.email.as_deref(),
                lead.company.as_deref(),
                lead.phone.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if self.status.map_or(false, |s| s != lead.status) {
            return false;
        }
        if self.source.map_or(false, |s| s != lead.source) {
            return false;
        }
        if self.priority.map_or(false, |p| p != lead.priority) {
            return false;
        }
        match self.assignee {
            None => true,
            Some(AssigneeFilter::Unassigned) => lead.owner().is_none(),
            Some(AssigneeFilter::Id(id)) => lead.owner().id() == Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    DateDesc,
    DateAsc,
    PriorityDesc,
    PriorityAsc,
    NameAsc,
    NameDesc,
    ValueDesc,
    ValueAsc,
}

impl SortKey {
    pub const ALL: [SortKey; 8] = [
        Self::DateDesc,
        Self::DateAsc,
        Self::PriorityDesc,
        Self::PriorityAsc,
        Self::NameAsc,
        Self::NameDesc,
        Self::ValueDesc,
        Self::ValueAsc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DateDesc => "date_desc",
            Self::DateAsc => "date_asc",
            Self::PriorityDesc => "priority_desc",
            Self::PriorityAsc => "priority_asc",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
            Self::ValueDesc => "value_desc",
            Self::ValueAsc => "value_asc",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown sort: {} (expected one of {})", s, known.join(", "))
            })
    }
}

/// Sort in place. Ties fall back to newest first.
pub fn sort_leads(leads: &mut [Lead], key: SortKey) {
    leads.sort_by(|a, b| {
        let primary = match key {
            SortKey::DateDesc => b.created_at.cmp(&a.created_at),
            SortKey::DateAsc => a.created_at.cmp(&b.created_at),
            SortKey::PriorityDesc => b.priority.cmp(&a.priority),
            SortKey::PriorityAsc => a.priority.cmp(&b.priority),
            SortKey::NameAsc => compare_names(a, b),
            SortKey::NameDesc => compare_names(b, a),
            SortKey::ValueDesc => compare_values(a.estimated_value, b.estimated_value, true),
            SortKey::ValueAsc => compare_values(a.estimated_value, b.estimated_value, false),
        };
        primary.then_with(|| b.created_at.cmp(&a.created_at))
    });
}

fn compare_names(a: &Lead, b: &Lead) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

/// Missing values sort last in either direction
fn compare_values(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadQuery {
    pub filter: LeadFilter,
    pub sort: SortKey,
    /// 1-indexed; 0 reads as 1
    pub page: u32,
    pub limit: u32,
}

impl LeadQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            filter: LeadFilter::default(),
            sort: SortKey::default(),
            page: 1,
            limit,
        }
    }
}

/// Filter, sort and slice one page out of `leads`
pub fn paginate(mut leads: Vec<Lead>, query: &LeadQuery) -> LeadResult<LeadPage> {
    if query.limit == 0 {
        return Err(LeadError::validation("limit", "must be at least 1"));
    }

    leads.retain(|lead| query.filter.matches(lead));
    sort_leads(&mut leads, query.sort);

    let total = leads.len() as u32;
    let page = query.page.max(1);
    let pages = total.div_ceil(query.limit);
    let skip = (page - 1).saturating_mul(query.limit) as usize;

    let leads = leads
        .into_iter()
        .skip(skip)
        .take(query.limit as usize)
        .collect();

    Ok(LeadPage {
        leads,
        pagination: Pagination { page, pages, total },
    })
}

pub fn run_query<S: LeadStore + ?Sized>(store: &S, query: &LeadQuery) -> LeadResult<LeadPage> {
    let leads = store.list_leads()?;
    let page = paginate(leads, query)?;
    tracing::debug!(
        total = page.pagination.total,
        page = page.pagination.page,
        sort = query.sort.as_str(),
        "listed leads"
    );
    Ok(page)
}
