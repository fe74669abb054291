use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Name given to the project of a single-project config
pub const DEFAULT_PROJECT_NAME: &str = "default";

/// Top-level GraphQL configuration.
/// Either a single project or multiple named projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphQLConfig {
    /// Single project configuration
    Single(ProjectConfig),
    /// Multi-project configuration
    Multi {
        projects: HashMap<String, ProjectConfig>,
    },
}

impl GraphQLConfig {
    /// Get all projects as an iterator.
    /// For single project configs, yields a single item with name "default".
    #[must_use]
    pub fn projects(&self) -> Box<dyn Iterator<Item = (&str, &ProjectConfig)> + '_> {
        match self {
            Self::Single(config) => Box::new(std::iter::once((DEFAULT_PROJECT_NAME, config))),
            Self::Multi { projects } => Box::new(
                projects
                    .iter()
                    .map(|(name, config)| (name.as_str(), config)),
            ),
        }
    }

    /// Get a specific project by name.
    /// For single project configs, returns the project if name is "default".
    #[must_use]
    pub fn get_project(&self, name: &str) -> Option<&ProjectConfig> {
        match self {
            Self::Single(config) if name == DEFAULT_PROJECT_NAME => Some(config),
            Self::Single(_) => None,
            Self::Multi { projects } => projects.get(name),
        }
    }

    /// Check if this is a multi-project configuration
    #[must_use]
    pub const fn is_multi_project(&self) -> bool {
        matches!(self, Self::Multi { .. })
    }

    /// Get the number of projects
    #[must_use]
    pub fn project_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi { projects } => projects.len(),
        }
    }

    /// Route a file to the project that owns it.
    ///
    /// A single-project config owns every file. In a multi-project config the
    /// first project (by name) whose patterns match and whose `exclude` does not
    /// wins.
    #[must_use]
    pub fn find_project_for_document(
        &self,
        path: &Path,
        root: &Path,
    ) -> Option<(&str, &ProjectConfig)> {
        match self {
            Self::Single(config) => Some((DEFAULT_PROJECT_NAME, config)),
            Self::Multi { projects } => {
                let mut names: Vec<&String> = projects.keys().collect();
                names.sort();
                names.into_iter().find_map(|name| {
                    let config = &projects[name];
                    config
                        .owns_file(path, root)
                        .then_some((name.as_str(), config))
                })
            }
        }
    }
}

/// Configuration for a single GraphQL project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Schema source(s)
    pub schema: SchemaConfig,

    /// Document patterns (queries, mutations, fragments)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentsConfig>,

    /// File patterns to include
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,

    /// File patterns to exclude
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,

    /// Tool-specific extensions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<HashMap<String, serde_json::Value>>,
}

impl ProjectConfig {
    /// Project with just a schema source
    #[must_use]
    pub fn with_schema(schema: impl Into<String>) -> Self {
        Self {
            schema: SchemaConfig::Path(schema.into()),
            documents: None,
            include: None,
            exclude: None,
            extensions: None,
        }
    }

    fn extension(&self, key: &str) -> Option<&serde_json::Value> {
        self.extensions.as_ref()?.get(key)
    }

    fn language_service_flag(&self, key: &str) -> Option<bool> {
        self.extension("languageService")?.get(key)?.as_bool()
    }

    /// SDL snippets from `extensions.customDirectives`, appended to the schema
    #[must_use]
    pub fn custom_directives(&self) -> Vec<String> {
        self.extension("customDirectives")
            .and_then(serde_json::Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `extensions.languageService.enableValidation`, on unless set to false
    #[must_use]
    pub fn enable_validation(&self) -> bool {
        self.language_service_flag("enableValidation")
            .unwrap_or(true)
    }

    /// `extensions.languageService.cacheSchemaFileForLookup`
    #[must_use]
    pub fn cache_schema_file_for_lookup(&self) -> bool {
        self.language_service_flag("cacheSchemaFileForLookup")
            .unwrap_or(false)
    }

    /// Whether `path` matches one of the local schema patterns
    #[must_use]
    pub fn is_schema_file(&self, path: &Path, root: &Path) -> bool {
        self.schema
            .paths()
            .into_iter()
            .filter(|p| !is_url(p))
            .any(|p| pattern_matches(p, path, root))
    }

    /// Whether `path` matches `documents` or `include`
    #[must_use]
    pub fn is_document_file(&self, path: &Path, root: &Path) -> bool {
        let documents = self
            .documents
            .as_ref()
            .map(DocumentsConfig::patterns)
            .unwrap_or_default();
        let include = self.include.iter().flatten().map(String::as_str);

        documents
            .into_iter()
            .chain(include)
            .any(|p| pattern_matches(p, path, root))
    }

    /// Whether `path` matches `exclude`
    #[must_use]
    pub fn is_excluded(&self, path: &Path, root: &Path) -> bool {
        self.exclude
            .iter()
            .flatten()
            .any(|p| pattern_matches(p, path, root))
    }

    fn owns_file(&self, path: &Path, root: &Path) -> bool {
        !self.is_excluded(path, root)
            && (self.is_document_file(path, root) || self.is_schema_file(path, root))
    }
}

fn is_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Match `path` against a config glob, relative to `root`.
///
/// Patterns may use a `{a,b}` alternation, which `glob` does not support.
#[must_use]
pub fn pattern_matches(pattern: &str, path: &Path, root: &Path) -> bool {
    let relative = path.strip_prefix(root).ok();

    expand_braces(pattern).iter().any(|expanded| {
        let normalized = expanded.strip_prefix("./").unwrap_or(expanded);
        let Ok(relative_pattern) = Pattern::new(normalized) else {
            return false;
        };
        if relative.is_some_and(|relative| relative_pattern.matches_path(relative)) {
            return true;
        }
        let absolute = root.join(normalized);
        absolute
            .to_str()
            .and_then(|absolute| Pattern::new(absolute).ok())
            .is_some_and(|absolute_pattern| absolute_pattern.matches_path(path))
    })
}

/// Expand the first `{a,b,c}` group of a glob into one pattern per option
#[must_use]
pub fn expand_braces(pattern: &str) -> Vec<String> {
    if let Some(start) = pattern.find('{') {
        if let Some(len) = pattern[start..].find('}') {
            let end = start + len;
            let before = &pattern[..start];
            let after = &pattern[end + 1..];

            return pattern[start + 1..end]
                .split(',')
                .flat_map(|option| expand_braces(&format!("{before}{option}{after}")))
                .collect();
        }
    }

    vec![pattern.to_string()]
}

/// Schema source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaConfig {
    /// Single file path or glob pattern
    Path(String),
    /// Multiple file paths or glob patterns
    Paths(Vec<String>),
}

impl SchemaConfig {
    /// Get all schema paths/patterns as a slice
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::Path(path) => vec![path.as_str()],
            Self::Paths(paths) => paths.iter().map(String::as_str).collect(),
        }
    }

    /// Check if this schema config contains URLs (HTTP/HTTPS)
    #[must_use]
    pub fn has_remote_schema(&self) -> bool {
        self.paths().into_iter().any(is_url)
    }
}

/// Documents source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentsConfig {
    /// Single pattern
    Pattern(String),
    /// Multiple patterns
    Patterns(Vec<String>),
}

impl DocumentsConfig {
    /// Get all document patterns as a slice
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            Self::Pattern(pattern) => vec![pattern.as_str()],
            Self::Patterns(patterns) => patterns.iter().map(String::as_str).collect(),
        }
    }
}
