//! Lead pipeline operations on top of the record store.

pub mod conversion;
mod input;
pub mod lifecycle;
pub mod query;
pub mod stats;

pub use conversion::{auto_match_by_email, link_manually, search_businesses, unlink, BusinessQuery, BusinessSearch};
pub use input::{ActivityInput, LeadFields};
pub use lifecycle::{add_activity, create_lead, delete_lead, get_lead, list_activities, update_lead};
pub use query::{run_query, sort_leads, AssigneeFilter, LeadFilter, LeadPage, LeadQuery, Pagination, SortKey};
pub use stats::{compute_stats, AssigneeCount, LeadStats, StatsOverview};
