use std::path::Path;

use eyre::Result;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub async fn handle_config_command(cmd: ConfigCommands, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show => handle_show_config(config_path).await,
        ConfigCommands::Set { key, value } => handle_set_config(key, value, config_path).await,
    }
}

async fn handle_show_config(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path).await?;
    println!("{}", config.show_all());
    Ok(())
}

async fn handle_set_config(key: String, value: String, config_path: Option<&Path>) -> Result<()> {
    let mut config = Config::load(config_path).await?;

    match config.set_value(&key, &value) {
        Ok(_) => {
            config.save(config_path).await?;
            println!("✅ Configuration updated: {} = {}", key, value);
        }
        Err(e) => {
            println!("❌ Failed to set configuration: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
