//! Configuration commands.

use std::error::Error;

use clap::Subcommand;
use studybuddy_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Read a value by dot path, e.g. session.default_target_min
    Get { key: String },
    /// Set a value by dot path
    Set { key: String, value: String },
    /// Print the whole configuration as JSON
    List,
    /// Restore defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_or_default();
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_or_default();
            config.set(&key, &value)?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load_or_default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
