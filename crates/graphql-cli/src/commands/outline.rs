use super::absolute;
use crate::OutputFormat;
use anyhow::{Context, Result};
use colored::Colorize;
use graphql_extract::{DefaultSourceParser, SourceParser};
use graphql_project::{document_symbols, DocumentSymbol};
use std::path::{Path, PathBuf};

/// Print the outline of every GraphQL snippet in `file`
pub fn run(file: &Path, format: OutputFormat) -> Result<()> {
    let file: PathBuf = absolute(file)?;
    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let symbols = outline(&text, &file);

    match format {
        OutputFormat::Human => {
            for symbol in &symbols {
                let indent = if symbol.container_name.is_some() { "  " } else { "" };
                println!(
                    "{indent}{} {} {}",
                    format!("{:?}", symbol.kind).to_lowercase().dimmed(),
                    symbol.name,
                    format!("{}:{}", symbol.range.start.line + 1, symbol.range.start.character + 1)
                        .dimmed()
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&symbols)?),
    }
    Ok(())
}

fn outline(text: &str, file: &Path) -> Vec<DocumentSymbol> {
    let contents = DefaultSourceParser::default()
        .extract(text, &file.to_string_lossy())
        .unwrap_or_default();

    contents
        .iter()
        .flat_map(|content| {
            let offset = content.range.start.line;
            document_symbols(&content.query)
                .into_iter()
                .map(move |mut symbol| {
                    symbol.range = symbol.range.offset_lines(offset);
                    symbol.selection_range = symbol.selection_range.offset_lines(offset);
                    symbol
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_of_embedded_query_uses_host_lines() {
        let text = "import gql from 'graphql-tag';\n\nconst Q = gql`\n  query GetUser {\n    user { id }\n  }\n`;\n";
        let symbols = outline(text, Path::new("/project/query.ts"));

        let names: Vec<&str> = symbols.iter().map(|symbol| symbol.name.as_str()).collect();
        assert_eq!(names[..2], ["GetUser", "user"]);
        assert_eq!(symbols[0].range.start.line, 3);
    }
}
