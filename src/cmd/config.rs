//! Configuration view and validation: `lingo config`.

use anyhow::Result;
use console::style;

use super::super::ConfigCommands;
use lingo::config::{CONFIG_FILE, Credentials, ProjectConfig, UserSettings};
use lingo::flags::RunFlags;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    let config = ProjectConfig::load(project_dir)?;
    let flags = RunFlags::default();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("{}", style("Lingo Configuration").bold());
            println!("===================");
            println!();
            println!("Config file: {}", project_dir.join(CONFIG_FILE).display());
            println!();
            println!("[locale]");
            println!("  source  = \"{}\"", config.effective_source(&flags));
            println!("  targets = {:?}", config.effective_targets(&flags));
            println!();
            for (name, bucket) in &config.buckets {
                println!("[buckets.{}]", name);
                for include in &bucket.include {
                    println!("  include {}", include);
                }
                println!();
            }
            if let Some(url) = &config.engine.url {
                println!("[engine]");
                println!("  url = \"{}\"", url);
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            let settings = UserSettings::load()?;
            let mut warnings = Vec::new();
            if config.effective_targets(&flags).is_empty() {
                warnings.push("No target locales configured".to_string());
            }
            if config.buckets.is_empty() {
                warnings.push("No buckets configured".to_string());
            }
            if let Err(e) =
                Credentials::resolve(&flags, &config, &settings, |name| std::env::var(name).ok())
            {
                warnings.push(e.to_string());
            }

            if warnings.is_empty() {
                println!("{} {} is valid", style("✓").green(), CONFIG_FILE);
            } else {
                println!("{} {} has warnings:", style("!").yellow(), CONFIG_FILE);
                for warning in &warnings {
                    println!("  - {}", warning);
                }
            }
        }
    }
    Ok(())
}
