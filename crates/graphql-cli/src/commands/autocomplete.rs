use super::{absolute, Workspace};
use crate::OutputFormat;
use anyhow::{Context, Result};
use colored::Colorize;
use graphql_project::Position;
use std::path::PathBuf;

/// Print suggestions at a 0-based `line` and `character` of `file`
pub async fn run(
    config_path: Option<PathBuf>,
    project_name: Option<String>,
    format: OutputFormat,
    file: PathBuf,
    line: usize,
    character: usize,
) -> Result<()> {
    let file = absolute(&file)?;
    let start_dir = file.parent().context("File has no parent directory")?;
    let workspace = Workspace::load(config_path, start_dir)?;
    let mut project = workspace
        .project_for_file(&file, project_name.as_deref())
        .await?;

    let items = project
        .completions(&file, Position::new(line, character))
        .await;
    if let Some(error) = project.schema_error() {
        eprintln!("{} {error}", "✗ Schema error:".red());
    }

    match format {
        OutputFormat::Human => {
            for item in &items {
                let label = if item.deprecated {
                    item.label.strikethrough().to_string()
                } else {
                    item.label.clone()
                };
                match &item.detail {
                    Some(detail) => println!("{label} {}", detail.dimmed()),
                    None => println!("{label}"),
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
    }
    Ok(())
}
