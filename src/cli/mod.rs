use clap::{Args, Parser, Subcommand};

use crate::models::{LeadPriority, LeadSource, LeadStatus};
use crate::pipeline::{AssigneeFilter, LeadFields, LeadFilter, SortKey};

pub mod activity;
pub mod add;
pub mod business;
pub mod config;
pub mod delete;
pub mod display;
pub mod export;
pub mod import;
pub mod list;
pub mod show;
pub mod stats;
pub mod team;
pub mod update;

pub use activity::run_activity;
pub use add::run_add;
pub use business::{run_business_search, run_link, run_unlink};
pub use config::run_config;
pub use delete::run_delete;
pub use display::print_error;
pub use export::run_export;
pub use import::run_import;
pub use list::run_list;
pub use show::run_show;
pub use stats::run_stats;
pub use team::run_team;
pub use update::run_update;

#[derive(Parser)]
#[command(name = "leadcmd")]
#[command(about = "Sales lead pipeline for the command line")]
#[command(version)]
pub struct Cli {
    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List leads with filters, sorting and pagination
    List(ListArgs),
    /// Pipeline dashboard numbers
    Stats,
    /// Show a lead with its activity log
    Show(IdArgs),
    /// Add a new lead
    Add(AddArgs),
    /// Change fields on a lead
    Update(UpdateArgs),
    /// Delete a lead and its activities
    Delete(DeleteArgs),
    /// Log a call, email, meeting or note against a lead
    Activity(ActivityArgs),
    /// Look up storefront businesses
    #[command(subcommand)]
    Business(BusinessCommand),
    /// Link a lead to a business
    Link(LinkArgs),
    /// Remove a lead's business link
    Unlink(IdArgs),
    /// List the sales team with lead counts
    Team,
    /// Load businesses, team members and users from a JSON file
    Import(ImportArgs),
    /// Write leads to CSV
    Export(ExportArgs),
    /// Read or change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Filter flags shared by `list` and `export`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Match name, email, company or phone
    #[arg(short, long)]
    pub search: Option<String>,
    #[arg(long)]
    pub status: Option<LeadStatus>,
    #[arg(long)]
    pub source: Option<LeadSource>,
    #[arg(long)]
    pub priority: Option<LeadPriority>,
    /// Owner id, or "unassigned"
    #[arg(long, value_name = "ID|unassigned")]
    pub assigned_to: Option<AssigneeFilter>,
    /// date_desc, date_asc, priority_desc, priority_asc, name_asc, name_desc, value_desc, value_asc
    #[arg(long, default_value = "date_desc")]
    pub sort: SortKey,
}

impl FilterArgs {
    pub fn to_filter(&self) -> LeadFilter {
        LeadFilter {
            search: self.search.clone(),
            status: self.status,
            source: self.source,
            priority: self.priority,
            assignee: self.assigned_to,
        }
    }
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    #[arg(short, long, default_value = "1")]
    pub page: u32,
    /// Page size; defaults to the page_size setting
    #[arg(short, long)]
    pub limit: Option<u32>,
}

#[derive(Args)]
pub struct IdArgs {
    /// Lead id
    pub id: uuid::Uuid,
}

/// Lead fields accepted by `add` and `update`. A blank value clears the field.
#[derive(Args, Debug, Clone, Default)]
pub struct LeadFieldArgs {
    #[arg(short, long)]
    pub email: Option<String>,
    #[arg(short, long)]
    pub phone: Option<String>,
    #[arg(short, long)]
    pub company: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub source: Option<LeadSource>,
    #[arg(long)]
    pub source_detail: Option<String>,
    #[arg(long)]
    pub status: Option<LeadStatus>,
    #[arg(long)]
    pub priority: Option<LeadPriority>,
    #[arg(long, allow_negative_numbers = true)]
    pub score: Option<i32>,
    /// Sales team member id
    #[arg(long, value_name = "ID")]
    pub team_member: Option<String>,
    /// Legacy user id
    #[arg(long, value_name = "ID")]
    pub assigned_to: Option<String>,
    #[arg(long)]
    pub business_type: Option<String>,
    #[arg(long)]
    pub expected_plan: Option<String>,
    /// Amount such as 1200 or $1,200.50
    #[arg(long, value_name = "AMOUNT")]
    pub value: Option<String>,
    /// YYYY-MM-DD, RFC 3339, "today" or "tomorrow"
    #[arg(long, value_name = "DATE")]
    pub follow_up: Option<String>,
    #[arg(short, long)]
    pub notes: Option<String>,
    /// Comma-separated; replaces existing tags
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,
    /// Business id to link once the lead is WON
    #[arg(long, value_name = "ID")]
    pub converted_to: Option<String>,
}

impl LeadFieldArgs {
    pub fn into_fields(self, name: Option<String>) -> LeadFields {
        LeadFields {
            name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            country: self.country,
            source: self.source,
            source_detail: self.source_detail,
            status: self.status,
            priority: self.priority,
            score: self.score,
            assigned_to_id: self.assigned_to,
            team_member_id: self.team_member,
            business_type: self.business_type,
            expected_plan: self.expected_plan,
            estimated_value: self.value,
            next_follow_up_at: self.follow_up,
            notes: self.notes,
            tags: self.tags,
            converted_to_id: self.converted_to,
            expected_version: None,
            utc_offset: None,
        }
    }
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,
    #[command(flatten)]
    pub fields: LeadFieldArgs,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: uuid::Uuid,
    #[arg(long)]
    pub name: Option<String>,
    #[command(flatten)]
    pub fields: LeadFieldArgs,
    /// Refuse the update if the lead changed since this version
    #[arg(long)]
    pub expected_version: Option<i64>,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub id: uuid::Uuid,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ActivityArgs {
    pub id: uuid::Uuid,
    /// NOTE, EMAIL_SENT, EMAIL_RECEIVED, CALL, MEETING, DEMO or FOLLOW_UP
    #[arg(short = 't', long = "type")]
    pub activity_type: String,
    #[arg(long)]
    pub title: String,
    #[arg(short, long)]
    pub description: Option<String>,
}

#[derive(Subcommand)]
pub enum BusinessCommand {
    /// Search by name, slug or email
    Search(BusinessSearchArgs),
}

#[derive(Args)]
pub struct BusinessSearchArgs {
    /// Free-text query
    #[arg(short, long, conflicts_with = "email", required_unless_present = "email")]
    pub q: Option<String>,
    /// Exact email lookup
    #[arg(short, long)]
    pub email: Option<String>,
}

#[derive(Args)]
pub struct LinkArgs {
    pub id: uuid::Uuid,
    pub business: uuid::Uuid,
}

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file with "businesses", "teamMembers" and "users" arrays
    pub file: String,
    #[arg(short, long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Output file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print one setting
    Get { key: String },
    /// Change a setting
    Set { key: String, value: String },
    /// Remove a stored setting so the default applies again
    Unset { key: String },
    /// Print all settings with their effective values
    List,
}
