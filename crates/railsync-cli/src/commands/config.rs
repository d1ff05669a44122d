use std::path::Path;

use railsync_core::util::is_http_url;

use crate::cli::{ConfigCommands, ConfigInitArgs};
use crate::error::CliError;
use crate::settings::FileConfig;

pub fn run_config(command: ConfigCommands, config_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init(args) => run_config_init(args, config_path),
        ConfigCommands::Show => run_config_show(config_path),
    }
}

pub fn run_config_init(args: ConfigInitArgs, config_path: &Path) -> Result<(), CliError> {
    let mut config = FileConfig::load_from_path(config_path)?;
    let explicit = init_overrides(args)?;
    config.overlay(explicit);
    config.save_to_path(config_path)?;
    println!("Saved config to {}", config_path.display());
    Ok(())
}

pub fn init_overrides(args: ConfigInitArgs) -> Result<FileConfig, CliError> {
    if let Some(url) = args.url.as_deref().map(str::trim) {
        if !is_http_url(url) {
            return Err(CliError::Config(
                "url must start with http:// or https://".to_string(),
            ));
        }
    }
    if let (Some(source), Some(destination)) = (args.source, args.destination) {
        if source == destination {
            return Err(CliError::Config(format!(
                "source and destination projects must differ (both are {source})"
            )));
        }
    }

    Ok(FileConfig {
        url: args.url,
        username: args.username,
        password: args.password,
        source: args.source,
        destination: args.destination,
        delete: args.delete.value(),
        log: args.log,
        timeout_secs: args.timeout_secs,
        max_retries: args.max_retries,
    })
}

pub fn run_config_show(config_path: &Path) -> Result<(), CliError> {
    let mut config = FileConfig::load_from_path(config_path)?;
    config.overlay(FileConfig::from_env()?);
    println!("Config file: {}", config_path.display());
    println!("{}", render_config(&config)?);
    Ok(())
}

pub fn render_config(config: &FileConfig) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(&config.redacted())?)
}
