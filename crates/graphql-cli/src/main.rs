mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "graphql")]
#[command(about = "GraphQL CLI for validation, completion and outlines", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to GraphQL config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Project name (for multi-project configs)
    #[arg(short, long)]
    project: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every document of every project
    Validate,

    /// List completion suggestions at a position
    Autocomplete {
        file: PathBuf,
        /// 0-based line
        line: usize,
        /// 0-based character
        character: usize,
    },

    /// Print the symbols of a file
    Outline { file: PathBuf },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// JSON output for tooling
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate => {
            commands::validate::run(cli.config, cli.project, cli.format).await?;
        }
        Commands::Autocomplete {
            file,
            line,
            character,
        } => {
            commands::autocomplete::run(cli.config, cli.project, cli.format, file, line, character)
                .await?;
        }
        Commands::Outline { file } => {
            commands::outline::run(&file, cli.format)?;
        }
    }

    Ok(())
}
