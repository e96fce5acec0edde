use std::path::PathBuf;

use confparts_types::ContentIdentifier;
use confparts_validator::{ExternalValidator, ValidatorConfig};
use eyre::Result;
use tokio::fs;

pub async fn handle_validate_command(
    config: ValidatorConfig,
    program: PathBuf,
    content_identifier: String,
    path: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let file_bytes = fs::read(&path).await?;

    let config = match output {
        Some(output) => config.with_result_path(output),
        None => config,
    };
    let validator = ExternalValidator::new(config);
    let content_identifier = ContentIdentifier::from(content_identifier);

    match validator
        .validate(&program, &file_bytes, &content_identifier)
        .await
    {
        Ok(warnings) => {
            println!("✅ {} accepted {}", program.display(), path.display());
            print_lines("⚠️ ", &warnings);
            if let Some(result_path) = &validator.config().result_path {
                println!("Validated content written to {}", result_path.display());
            }
            Ok(())
        }
        Err(e) => {
            println!("❌ {}", e);
            print_lines("   ", e.stderr());
            Err(e.into())
        }
    }
}

pub(crate) fn print_lines(prefix: &str, lines: &[String]) {
    for line in lines {
        println!("{}{}", prefix, line);
    }
}
