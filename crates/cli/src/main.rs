mod cli;
mod commands;
mod config;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use confparts_registry::{DirectoryOptionalParts, DistributedFilesRegistry};
use confparts_storage::{DistributedFilesStore, FilesystemStorage};
use confparts_validator::ExternalValidator;
use eyre::Result;

use crate::cli::{Cli, Commands};
use crate::config::{Config, StorageBackend};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Config { command } => {
            commands::handle_config_command(command, config_path).await?;
        }
        Commands::Validate {
            program,
            content_identifier,
            path,
            output,
        } => {
            let config = Config::load(config_path).await?;
            commands::handle_validate_command(
                config.validator,
                program,
                content_identifier,
                path,
                output,
            )
            .await?;
        }
        Commands::Parts => {
            let config = Config::load(config_path).await?;
            let optional_parts = DirectoryOptionalParts::new(&config.optional_parts.directory);
            commands::handle_parts_command(&optional_parts).await?;
        }
        Commands::Manifest { source } => {
            let (registry, _) = open_registry(config_path).await?;
            commands::handle_manifest_command(&registry, source).await?;
        }
        Commands::Identifiers => {
            let (registry, _) = open_registry(config_path).await?;
            commands::handle_identifiers_command(&registry).await?;
        }
        Commands::Save { file_name, path } => {
            let (registry, _) = open_registry(config_path).await?;
            commands::handle_save_command(&registry, file_name, path).await?;
        }
        Commands::Upload { file_name, path } => {
            let (registry, config) = open_registry(config_path).await?;
            let validator = ExternalValidator::new(config.validator);
            commands::handle_upload_command(Arc::new(registry), validator, file_name, path)
                .await?;
        }
        Commands::Show { file_name, output } => {
            let (registry, _) = open_registry(config_path).await?;
            commands::handle_show_command(&registry, file_name, output).await?;
        }
        Commands::Remove { file_name } => {
            let (registry, _) = open_registry(config_path).await?;
            commands::handle_remove_command(&registry, file_name).await?;
        }
    }

    Ok(())
}

async fn open_registry(config_path: Option<&Path>) -> Result<(DistributedFilesRegistry, Config)> {
    let config = Config::load(config_path).await?;
    let store = open_store(&config).await?;
    let optional_parts = Arc::new(DirectoryOptionalParts::new(&config.optional_parts.directory));

    Ok((DistributedFilesRegistry::new(store, optional_parts), config))
}

async fn open_store(config: &Config) -> Result<Arc<dyn DistributedFilesStore>> {
    match config.storage.backend {
        StorageBackend::Filesystem => {
            let storage = FilesystemStorage::new(Path::new(&config.storage.path));
            storage.initialize().await?;
            tracing::debug!("Using filesystem store at {}", storage.root_path().display());
            Ok(Arc::new(storage))
        }
        StorageBackend::Postgres => open_postgres_store(config).await,
    }
}

#[cfg(feature = "postgres")]
async fn open_postgres_store(config: &Config) -> Result<Arc<dyn DistributedFilesStore>> {
    let url = config
        .storage
        .postgres_url
        .as_deref()
        .ok_or_else(|| eyre::eyre!("storage.postgres_url must be set for the postgres backend"))?;

    let storage = confparts_storage::PostgresStorage::connect(url).await?;
    storage.initialize().await?;
    tracing::debug!("Using postgres store");
    Ok(Arc::new(storage))
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres_store(_config: &Config) -> Result<Arc<dyn DistributedFilesStore>> {
    Err(eyre::eyre!(
        "This build does not include the postgres backend, rebuild with --features postgres"
    ))
}
