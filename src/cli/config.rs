use anyhow::{bail, Result};
use serde_json::json;

use crate::cli::display::print_json;
use crate::cli::ConfigCommand;
use crate::config::{
    Config, SETTING_ACTOR, SETTING_BUSINESS_SEARCH_LIMIT, SETTING_KEYS, SETTING_PAGE_SIZE,
    SETTING_UTC_OFFSET,
};
use crate::db::Database;

/// Execute `config get|set|unset|list`
pub fn run_config(db: &Database, command: ConfigCommand, json: bool) -> Result<()> {
    match command {
        ConfigCommand::Get { key } => {
            if !SETTING_KEYS.contains(&key.as_str()) {
                bail!("unknown setting: {} (known: {})", key, SETTING_KEYS.join(", "));
            }
            let config = Config::load(db)?;
            let value = effective_value(&config, &key);
            if json {
                return print_json(&json!({ "key": key, "value": value }));
            }
            println!("{}", value);
        }
        ConfigCommand::Set { key, value } => {
            Config::set(db, &key, &value)?;
            if json {
                return print_json(&json!({ "key": key, "value": value.trim() }));
            }
            println!("Saved.");
        }
        ConfigCommand::Unset { key } => {
            if !SETTING_KEYS.contains(&key.as_str()) {
                bail!("unknown setting: {} (known: {})", key, SETTING_KEYS.join(", "));
            }
            let removed = db.delete_setting(&key)?;
            if json {
                return print_json(&json!({ "key": key, "removed": removed }));
            }
            println!("{}", if removed { "Removed." } else { "Not set." });
        }
        ConfigCommand::List => {
            let config = Config::load(db)?;
            if json {
                let map: serde_json::Map<String, serde_json::Value> = SETTING_KEYS
                    .iter()
                    .map(|k| (k.to_string(), json!(effective_value(&config, k))))
                    .collect();
                return print_json(&map);
            }
            for key in SETTING_KEYS {
                println!("{:<24} {}", key, effective_value(&config, key));
            }
        }
    }
    Ok(())
}

/// What the app actually uses for `key`, after env overrides and defaults
fn effective_value(config: &Config, key: &str) -> String {
    match key {
        SETTING_PAGE_SIZE => config.page_size.to_string(),
        SETTING_BUSINESS_SEARCH_LIMIT => config.business_search_limit.to_string(),
        SETTING_UTC_OFFSET => (config.offset().local_minus_utc() / 60).to_string(),
        SETTING_ACTOR => config.effective_actor(),
        _ => String::new(),
    }
}
