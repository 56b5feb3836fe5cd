//! Configuration management
//!
//! Settings come from environment variables first, then the `app_settings`
//! table, then built-in defaults.

use anyhow::{anyhow, Result};
use chrono::{FixedOffset, Local, Offset};
use std::env;

use crate::db::Database;

// Settings keys for database storage
pub const SETTING_PAGE_SIZE: &str = "page_size";
pub const SETTING_BUSINESS_SEARCH_LIMIT: &str = "business_search_limit";
pub const SETTING_UTC_OFFSET: &str = "utc_offset_minutes";
pub const SETTING_ACTOR: &str = "actor";

pub const SETTING_KEYS: [&str; 4] = [
    SETTING_PAGE_SIZE,
    SETTING_BUSINESS_SEARCH_LIMIT,
    SETTING_UTC_OFFSET,
    SETTING_ACTOR,
];

// Environment variable names
const ENV_PAGE_SIZE: &str = "LEADCMD_PAGE_SIZE";
const ENV_BUSINESS_SEARCH_LIMIT: &str = "LEADCMD_BUSINESS_SEARCH_LIMIT";
const ENV_UTC_OFFSET: &str = "LEADCMD_UTC_OFFSET";
const ENV_ACTOR: &str = "LEADCMD_ACTOR";

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_BUSINESS_SEARCH_LIMIT: usize = 10;
const MAX_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub page_size: u32,
    pub business_search_limit: usize,
    /// Fixed offset for calendar boundaries in stats; local time when unset
    pub utc_offset_minutes: Option<i32>,
    /// Label recorded as `performedBy` on activities
    pub actor: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            business_search_limit: DEFAULT_BUSINESS_SEARCH_LIMIT,
            utc_offset_minutes: None,
            actor: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and database settings.
    /// Environment variables take precedence over database settings.
    pub fn load(db: &Database) -> Result<Self> {
        let lookup = |env_key: &str, setting: &str| -> Result<Option<String>> {
            match env::var(env_key) {
                Ok(v) if !v.trim().is_empty() => Ok(Some(v)),
                _ => db.get_setting(setting),
            }
        };

        let mut config = Self::default();
        if let Some(v) = lookup(ENV_PAGE_SIZE, SETTING_PAGE_SIZE)? {
            config.page_size = parse_page_size(&v)?;
        }
        if let Some(v) = lookup(ENV_BUSINESS_SEARCH_LIMIT, SETTING_BUSINESS_SEARCH_LIMIT)? {
            config.business_search_limit = parse_search_limit(&v)?;
        }
        if let Some(v) = lookup(ENV_UTC_OFFSET, SETTING_UTC_OFFSET)? {
            config.utc_offset_minutes = Some(parse_utc_offset(&v)?);
        }
        config.actor = lookup(ENV_ACTOR, SETTING_ACTOR)?;

        Ok(config)
    }

    /// Validate and persist a single setting
    pub fn set(db: &Database, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            SETTING_PAGE_SIZE => {
                parse_page_size(value)?;
            }
            SETTING_BUSINESS_SEARCH_LIMIT => {
                parse_search_limit(value)?;
            }
            SETTING_UTC_OFFSET => {
                parse_utc_offset(value)?;
            }
            SETTING_ACTOR => {
                if value.is_empty() {
                    return Err(anyhow!("actor cannot be empty"));
                }
            }
            _ => return Err(anyhow!("unknown setting: {} (known: {})", key, SETTING_KEYS.join(", "))),
        }
        db.set_setting(key, value)
    }

    /// Offset used for "today", "this week" and "this month"
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .and_then(|m| FixedOffset::east_opt(m * 60))
            .unwrap_or_else(|| Local::now().offset().fix())
    }

    /// Actor label with fallbacks: configured, then $USER, then "admin"
    pub fn effective_actor(&self) -> String {
        self.actor
            .clone()
            .or_else(|| env::var("USER").ok())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "admin".to_string())
    }
}

fn parse_page_size(v: &str) -> Result<u32> {
    match v.trim().parse::<u32>() {
        Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => Ok(n),
        _ => Err(anyhow!("page_size must be between 1 and {}: {}", MAX_PAGE_SIZE, v)),
    }
}

fn parse_search_limit(v: &str) -> Result<usize> {
    match v.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(anyhow!("business_search_limit must be a positive number: {}", v)),
    }
}

fn parse_utc_offset(v: &str) -> Result<i32> {
    match v.trim().parse::<i32>() {
        Ok(n) if n.abs() < 24 * 60 => Ok(n),
        _ => Err(anyhow!("utc_offset_minutes must be within ±1439: {}", v)),
    }
}
