pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod store;

pub use db::Database;
pub use error::{LeadError, LeadResult};
