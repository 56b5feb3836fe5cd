mod activity;
mod business;
mod lead;
mod owner;
mod team;

pub use activity::{Activity, ActivityType, SystemActivityType, UserActivityType};
pub use business::{Business, BusinessSnapshot};
pub use lead::{Lead, LeadCounts, LeadPriority, LeadSource, LeadStatus};
pub use owner::{resolve_owner, Owner, OwnerKind, TeamMemberRef, UserRef};
pub use team::{TeamMember, User};
