//! Configuration management commands.
//!
//! Most keys live in the device-local TOML config; `separator` is the one
//! replicated setting and is persisted through the task store instead.

use clap::Subcommand;
use std::path::PathBuf;
use timetrail_core::settings::{DecimalSeparator, SyncMode};
use timetrail_core::storage::ConfigError;

use super::common::AppContext;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Key: user-id, sync-mode, remote-dir, debounce-secs, separator
        key: String,
        /// New value
        value: String,
    },
    /// Clear a configuration value (user-id, remote-dir)
    Unset {
        /// Key to clear
        key: String,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::open()?;

    match action {
        ConfigAction::Show => {
            println!("{}", toml::to_string_pretty(&ctx.config)?);
            let separator = ctx.store.lock().unwrap().settings().decimal_separator;
            println!("separator = \"{}\"", separator_label(separator));
        }
        ConfigAction::Set { key, value } => {
            set_value(ctx, &key, &value)?;
            println!("Set {key}");
        }
        ConfigAction::Unset { key } => {
            let mut config = ctx.config.clone();
            match key.as_str() {
                "user-id" => config.user_id = None,
                "remote-dir" => config.remote_dir = None,
                other => {
                    return Err(Box::new(ConfigError::InvalidValue {
                        key: other.to_string(),
                        message: "only user-id and remote-dir can be unset".to_string(),
                    }))
                }
            }
            config.save()?;
            println!("Unset {key}");
        }
    }

    Ok(())
}

fn set_value(ctx: AppContext, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ctx.config.clone();
    match key {
        "user-id" => {
            config.user_id = Some(value.to_string());
        }
        "sync-mode" => {
            config.sync_mode = match value {
                "manual" => SyncMode::Manual,
                "automatic" => SyncMode::Automatic,
                other => {
                    return Err(invalid(key, format!("unknown sync mode: {other}")));
                }
            };
        }
        "remote-dir" => {
            config.remote_dir = Some(PathBuf::from(value));
        }
        "debounce-secs" => {
            config.debounce_secs = value
                .parse()
                .map_err(|_| invalid(key, format!("not a number: {value}")))?;
        }
        "separator" => {
            let separator = match value {
                "system" => DecimalSeparator::System,
                "dot" => DecimalSeparator::Dot,
                "comma" => DecimalSeparator::Comma,
                other => {
                    return Err(invalid(key, format!("unknown separator: {other}")));
                }
            };
            ctx.store.lock().unwrap().set_decimal_separator(separator);
            ctx.persist()?;
            return Ok(());
        }
        other => {
            return Err(invalid(other, "unknown configuration key".to_string()));
        }
    }
    config.save()?;
    Ok(())
}

fn invalid(key: &str, message: String) -> Box<dyn std::error::Error> {
    Box::new(ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    })
}

fn separator_label(separator: DecimalSeparator) -> &'static str {
    match separator {
        DecimalSeparator::System => "system",
        DecimalSeparator::Dot => "dot",
        DecimalSeparator::Comma => "comma",
    }
}
