use super::Workspace;
use crate::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use graphql_project::{Diagnostic, Severity};
use std::path::{Path, PathBuf};
use std::process;

pub async fn run(
    config_path: Option<PathBuf>,
    project_name: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let workspace = Workspace::load(config_path, &current_dir)?;
    let mut projects = workspace.projects(project_name.as_deref())?;
    let multi = projects.len() > 1;

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for project in &mut projects {
        if multi && matches!(format, OutputFormat::Human) {
            println!("\n{}", format!("=== Project: {} ===", project.name()).bold().cyan());
        }

        project.initialize().await;
        if project.schema().await.is_none() {
            let error = project.schema_error().unwrap_or("no schema").to_string();
            match format {
                OutputFormat::Human => eprintln!("{} {error}", "✗ Schema error:".red()),
                OutputFormat::Json => eprintln!(
                    "{}",
                    serde_json::json!({ "project": project.name(), "error": error })
                ),
            }
            process::exit(1);
        }

        let files: Vec<PathBuf> = project.files().into_iter().map(Path::to_path_buf).collect();
        if matches!(format, OutputFormat::Human) {
            println!(
                "{} ({} files, {} fragments)",
                "✓ Project loaded".green(),
                files.len(),
                project.fragments().len()
            );
        }

        for file in &files {
            for diagnostic in project.diagnostics(file).await {
                match diagnostic.severity {
                    Severity::Error => total_errors += 1,
                    Severity::Warning => total_warnings += 1,
                    Severity::Information | Severity::Hint => {}
                }
                match format {
                    OutputFormat::Human => println!("{}", render(file, &diagnostic)),
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::json!({
                            "project": project.name(),
                            "file": file,
                            "severity": diagnostic.severity,
                            "source": diagnostic.source.as_str(),
                            "code": diagnostic.code,
                            "message": diagnostic.message,
                            "range": diagnostic.range,
                        })
                    ),
                }
            }
        }
    }

    if matches!(format, OutputFormat::Human) {
        println!();
        if total_errors == 0 && total_warnings == 0 {
            println!("{}", "✓ All validations passed!".green().bold());
        } else {
            println!(
                "{}",
                format!("Found {total_errors} error(s), {total_warnings} warning(s)").yellow()
            );
        }
    }

    if total_errors > 0 {
        process::exit(1);
    }
    Ok(())
}

/// `file:line:column: severity: message`, with 1-based line and column
fn render(file: &Path, diagnostic: &Diagnostic) -> String {
    let label = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Information => "info".blue().bold(),
        Severity::Hint => "hint".dimmed(),
    };
    let start = diagnostic.range.start;
    format!(
        "{}:{}:{}: {label}: {} {}",
        file.display(),
        start.line + 1,
        start.character + 1,
        diagnostic.message,
        format!("[{}]", diagnostic.source).dimmed()
    )
}
