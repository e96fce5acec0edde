use std::path::{Path, PathBuf};
use std::sync::Arc;

use confparts_registry::{
    DirectoryOptionalParts, DistributedFilesRegistry, OptionalPartUploader, RegistryError,
};
use confparts_types::{SourceType, format_local_time};
use confparts_validator::ExternalValidator;
use eyre::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::commands::validate::print_lines;

pub async fn handle_manifest_command(
    registry: &DistributedFilesRegistry,
    source: SourceType,
) -> Result<()> {
    let manifest = registry.configuration_parts_json(source).await?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

pub async fn handle_identifiers_command(registry: &DistributedFilesRegistry) -> Result<()> {
    for identifier in registry.internal_source_content_identifiers().await? {
        println!("{}", identifier);
    }
    Ok(())
}

pub async fn handle_parts_command(optional_parts: &DirectoryOptionalParts) -> Result<()> {
    let scan = optional_parts.scan().await?;

    if scan.parts.is_empty() {
        println!(
            "No optional parts installed in {}",
            optional_parts.directory().display()
        );
    }

    for part in &scan.parts {
        let program = part
            .validation_program
            .as_ref()
            .map_or_else(|| "(no validation)".to_string(), |p| p.display().to_string());
        println!("📦 {} → {}", part.content_identifier, part.file_name);
        println!("    Validation program: {}", program);
    }

    for error in &scan.errors {
        println!("⚠️  Skipped {}", error);
    }

    Ok(())
}

pub async fn handle_save_command(
    registry: &DistributedFilesRegistry,
    file_name: String,
    path: PathBuf,
) -> Result<()> {
    let file_data = fs::read(&path).await?;
    let saved = registry.save_configuration_part(&file_name, file_data).await?;

    println!(
        "✅ Saved {} as {} ({} bytes, {})",
        path.display(),
        saved.content_identifier,
        saved.size,
        format_local_time(&saved.updated_at)
    );
    Ok(())
}

pub async fn handle_upload_command(
    registry: Arc<DistributedFilesRegistry>,
    validator: ExternalValidator,
    file_name: String,
    path: PathBuf,
) -> Result<()> {
    let file_bytes = fs::read(&path).await?;
    let uploader = OptionalPartUploader::new(registry, validator);

    match uploader.upload(&file_name, file_bytes).await {
        Ok(outcome) => {
            println!(
                "✅ Uploaded {} as {} ({} bytes)",
                outcome.file.file_name, outcome.file.content_identifier, outcome.file.size
            );
            print_lines("⚠️ ", &outcome.warnings);
            Ok(())
        }
        Err(RegistryError::Validation(e)) => {
            println!("❌ {}", e);
            print_lines("   ", e.stderr());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn handle_show_command(
    registry: &DistributedFilesRegistry,
    file_name: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let Some(file) = registry.get_configuration_part(&file_name).await? else {
        return Err(eyre::eyre!("Configuration part '{}' is not stored", file_name));
    };

    match output {
        Some(output) => {
            write_file(&output, &file.file_data).await?;
            println!(
                "{} ({}, updated {}) written to {}",
                file.file_name,
                file.content_identifier,
                format_local_time(&file.updated_at),
                output.display()
            );
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&file.file_data).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

pub async fn handle_remove_command(
    registry: &DistributedFilesRegistry,
    file_name: String,
) -> Result<()> {
    if registry.remove_configuration_part(&file_name).await? {
        println!("✅ Removed {}", file_name);
    } else {
        println!("Configuration part '{}' was not stored", file_name);
    }
    Ok(())
}

async fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, data).await?;
    Ok(())
}
