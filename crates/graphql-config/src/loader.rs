use crate::{ConfigError, GraphQLConfig, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names to search for, in order of preference
const CONFIG_FILES: &[&str] = &[
    ".graphqlrc.yml",
    ".graphqlrc.yaml",
    ".graphqlrc.json",
    ".graphqlrc",
    "graphql.config.yml",
    "graphql.config.yaml",
    "graphql.config.json",
    ".graphqlconfig",
];

const PACKAGE_JSON: &str = "package.json";

/// Whether a file name looks like a GraphQL config file.
///
/// This is a loose substring check used to decide whether a changed file
/// should trigger a config reload. `package.json` is checked separately with
/// [`package_json_has_graphql_key`].
#[must_use]
pub fn is_config_file_name(name: &str) -> bool {
    ["graphql.config", "graphqlrc", "graphqlconfig"]
        .iter()
        .any(|needle| name.contains(needle))
}

/// Whether `package.json` contents carry a top-level `graphql` key
#[must_use]
pub fn package_json_has_graphql_key(contents: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(contents)
        .ok()
        .is_some_and(|value| value.get("graphql").is_some())
}

/// Find a GraphQL config file by walking up the directory tree from the given start directory.
/// Returns the path to the config file if found.
pub fn find_config(start_dir: &Path) -> Result<Option<PathBuf>> {
    let mut current_dir = start_dir.to_path_buf();

    loop {
        for file_name in CONFIG_FILES {
            let config_path = current_dir.join(file_name);
            if config_path.exists() && config_path.is_file() {
                return Ok(Some(config_path));
            }
        }

        let package_json = current_dir.join(PACKAGE_JSON);
        if package_json.is_file() && package_json_has_graphql_key(&fs::read_to_string(&package_json)?)
        {
            return Ok(Some(package_json));
        }

        // Move to parent directory
        if !current_dir.pop() {
            // Reached root without finding config
            break;
        }
    }

    Ok(None)
}

/// Load a GraphQL config from the specified path.
/// Automatically detects the format based on file extension.
pub fn load_config(path: &Path) -> Result<GraphQLConfig> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents, path)
}

/// Load a GraphQL config from a string.
/// The path is used for error messages and format detection.
pub fn load_config_from_str(contents: &str, path: &Path) -> Result<GraphQLConfig> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");

    let config = match extension {
        "json" if file_name == PACKAGE_JSON => parse_package_json(contents, path)?,
        "yml" | "yaml" => parse_yaml(contents, path)?,
        "json" => parse_json(contents, path)?,
        "" if file_name == ".graphqlrc" => {
            // .graphqlrc without extension - try YAML first, then JSON
            parse_yaml(contents, path).or_else(|_| parse_json(contents, path))?
        }
        "" if file_name == ".graphqlconfig" => {
            parse_json(contents, path).or_else(|_| parse_yaml(contents, path))?
        }
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };

    validate_config(&config, path)?;

    Ok(config)
}

fn parse_yaml(contents: &str, path: &Path) -> Result<GraphQLConfig> {
    serde_yaml::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("YAML parse error: {e}"),
    })
}

fn parse_json(contents: &str, path: &Path) -> Result<GraphQLConfig> {
    serde_json::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("JSON parse error: {e}"),
    })
}

/// Parse the `graphql` field of a `package.json`
fn parse_package_json(contents: &str, path: &Path) -> Result<GraphQLConfig> {
    let mut package: serde_json::Value = serde_json::from_str(contents)?;
    let section = package
        .get_mut("graphql")
        .map(serde_json::Value::take)
        .ok_or(ConfigError::NotFound)?;

    serde_json::from_value(section).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("package.json graphql field: {e}"),
    })
}

/// Reject projects whose schema or document patterns are empty
fn validate_config(config: &GraphQLConfig, path: &Path) -> Result<()> {
    let invalid = |message: String| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    };

    for (name, project) in config.projects() {
        let schema_paths = project.schema.paths();
        if schema_paths.is_empty() {
            return Err(invalid(format!("Project '{name}' has empty schema configuration")));
        }
        if schema_paths.iter().any(|schema| schema.trim().is_empty()) {
            return Err(invalid(format!("Project '{name}' has empty schema path")));
        }

        let Some(documents) = &project.documents else {
            continue;
        };
        let patterns = documents.patterns();
        if patterns.is_empty() {
            return Err(invalid(format!("Project '{name}' has empty documents configuration")));
        }
        if patterns.iter().any(|pattern| pattern.trim().is_empty()) {
            return Err(invalid(format!("Project '{name}' has empty document pattern")));
        }
    }

    Ok(())
}
