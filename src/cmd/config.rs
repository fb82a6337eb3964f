//! Configuration view and validation commands: `wfrelay config`.

use anyhow::{Context, Result};

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use wfrelay::config::{CONFIG_DIR, CONFIG_FILE, RelayConfig, RelayToml};
    use wfrelay::github::token::redact;

    let config_dir = project_dir.join(CONFIG_DIR);
    let config_path = config_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("wfrelay Configuration");
            println!("=====================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                RelayToml::load(&config_path)?
            } else {
                println!("No wfrelay.toml found at {}", config_path.display());
                println!("Using default configuration.");
                RelayToml::default()
            };
            println!();

            println!("[github]");
            println!("  host = \"{}\"", toml.github.host);
            if let Some(url) = &toml.github.api_url {
                println!("  api_url = \"{}\"", url);
            }
            println!("  correlation_input = \"{}\"", toml.github.correlation_input);
            println!();

            println!("[polling]");
            println!("  resolve_attempts = {}", toml.polling.resolve_attempts);
            println!(
                "  resolve_interval_secs = {}",
                toml.polling.resolve_interval_secs
            );
            println!(
                "  monitor_interval_secs = {}",
                toml.polling.monitor_interval_secs
            );
            match toml.polling.max_duration_secs {
                Some(secs) => println!("  max_duration_secs = {}", secs),
                None => println!("  max_duration_secs = (none)"),
            }
            println!();

            if !toml.integrations.github.is_empty() {
                println!("[[integrations.github]]");
                for integration in &toml.integrations.github {
                    println!(
                        "  {} -> {}",
                        integration.host,
                        redact(&integration.token)
                    );
                }
                println!();
            }

            // Env overrides only apply to the effective config
            let config = RelayConfig::new(project_dir.to_path_buf())?;
            println!("Effective values (with env overrides):");
            println!("  api_url = \"{}\"", config.api_url());
            println!(
                "  monitor_interval_secs = {}",
                config.engine_config().monitor_interval.as_secs()
            );
            println!();

            if !config_path.exists() {
                println!("Run 'wfrelay config init' to create a wfrelay.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No wfrelay.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = RelayToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("wfrelay.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            std::fs::create_dir_all(&config_dir).with_context(|| {
                format!("Failed to create config directory: {}", config_dir.display())
            })?;

            RelayToml::default().save(&config_path)?;

            println!("Created wfrelay.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [github] host, api_url, correlation_input");
            println!("  - [polling] resolve_attempts, intervals, max_duration_secs");
            println!("  - [[integrations.github]] host + token per GitHub host");
            println!();
        }
    }

    Ok(())
}
