use crate::introspection::{fetch_introspection, IntrospectionSchema};
use crate::{ProjectError, Result};
use apollo_compiler::parser::Parser;
use apollo_compiler::schema::SchemaBuilder;
use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use graphql_config::SchemaConfig;
use graphql_extract::{extract_from_file, ExtractConfig, Language};
use std::path::{Path, PathBuf};

/// SDL read from one schema source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource {
    /// File path or endpoint URL the SDL came from
    pub origin: String,
    pub sdl: String,
    /// The SDL was printed from an introspection result rather than read as written
    pub generated: bool,
}

/// Schema loader for loading GraphQL schemas from various sources
pub struct SchemaLoader {
    config: SchemaConfig,
    base_path: Option<PathBuf>,
}

impl SchemaLoader {
    #[must_use]
    pub const fn new(config: SchemaConfig) -> Self {
        Self {
            config,
            base_path: None,
        }
    }

    #[must_use]
    pub fn with_base_path(mut self, path: impl AsRef<Path>) -> Self {
        self.base_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load every configured source, in configuration order
    pub async fn load(&self) -> Result<Vec<SchemaSource>> {
        let mut sources = Vec::new();

        for path in self.config.paths() {
            if path.starts_with("http://") || path.starts_with("https://") {
                sources.push(Self::load_remote(path).await?);
            } else {
                sources.extend(self.load_local(path)?);
            }
        }

        if sources.is_empty() {
            return Err(ProjectError::SchemaLoad(
                "No schema files found".to_string(),
            ));
        }

        Ok(sources)
    }

    /// Load schema from local file(s), supporting glob patterns
    fn load_local(&self, pattern: &str) -> Result<Vec<SchemaSource>> {
        let pattern = self.base_path.as_ref().map_or_else(
            || pattern.to_string(),
            |base| base.join(pattern).display().to_string(),
        );

        let paths = glob::glob(&pattern).map_err(|e| {
            ProjectError::SchemaLoad(format!("Invalid glob pattern '{pattern}': {e}"))
        })?;

        let mut sources = Vec::new();
        for entry in paths {
            let path =
                entry.map_err(|e| ProjectError::SchemaLoad(format!("Glob error: {e}")))?;
            sources.push(read_schema_file(&path)?);
        }

        if sources.is_empty() {
            return Err(ProjectError::SchemaLoad(format!(
                "No files matched pattern: {pattern}"
            )));
        }

        Ok(sources)
    }

    /// Load schema from remote endpoint via introspection
    async fn load_remote(url: &str) -> Result<SchemaSource> {
        tracing::info!(url, "Fetching schema by introspection");
        let schema = fetch_introspection(url).await?;
        Ok(SchemaSource {
            origin: url.to_string(),
            sdl: schema.to_sdl(),
            generated: true,
        })
    }
}

/// Read one schema file: SDL, an introspection result, or SDL embedded in code
pub fn read_schema_file(path: &Path) -> Result<SchemaSource> {
    let origin = path.display().to_string();

    if path.extension().is_some_and(|extension| extension == "json") {
        let json = std::fs::read_to_string(path)?;
        let schema = IntrospectionSchema::from_json(&json)?;
        return Ok(SchemaSource {
            origin,
            sdl: schema.to_sdl(),
            generated: true,
        });
    }

    if Language::from_path(path).is_some_and(|language| language.is_embedded()) {
        let snippets = extract_from_file(path, &ExtractConfig::default())
            .map_err(|e| ProjectError::SchemaLoad(format!("{origin}: {e}")))?;
        let sdl = snippets
            .into_iter()
            .map(|snippet| snippet.query)
            .collect::<Vec<_>>()
            .join("\n");
        return Ok(SchemaSource {
            origin,
            sdl,
            generated: false,
        });
    }

    Ok(SchemaSource {
        origin,
        sdl: std::fs::read_to_string(path)?,
        generated: false,
    })
}

/// Build a schema from `(path, sdl)` pieces.
///
/// Never fails: when the pieces do not form a valid schema, the best partial
/// schema is returned so that editor features keep working.
pub fn build_schema<'a>(sources: impl IntoIterator<Item = (&'a str, &'a str)>) -> Valid<Schema> {
    let mut builder = SchemaBuilder::new();
    let mut parser = Parser::new();
    for (path, sdl) in sources {
        parser.parse_into_schema_builder(sdl, path, &mut builder);
    }

    let schema = match builder.build() {
        Ok(schema) => schema,
        Err(with_errors) => {
            tracing::warn!(
                errors = with_errors.errors.len(),
                "Schema has errors, using what could be built"
            );
            with_errors.partial
        }
    };

    match schema.validate() {
        Ok(valid) => valid,
        Err(with_errors) => {
            tracing::debug!(errors = with_errors.errors.len(), "Schema failed validation");
            Valid::assume_valid(with_errors.partial)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_config::SchemaConfig;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_single_local_file() {
        let temp_dir = tempdir().unwrap();
        let schema_path = temp_dir.path().join("schema.graphql");
        fs::write(&schema_path, "type Query { hello: String }").unwrap();

        let config = SchemaConfig::Path(schema_path.display().to_string());
        let loader = SchemaLoader::new(config);
        let sources = loader.load().await.unwrap();

        assert_eq!(sources.len(), 1);
        assert!(sources[0].sdl.contains("type Query"));
        assert!(!sources[0].generated);
    }

    #[tokio::test]
    async fn test_load_multiple_files_with_glob_and_base_path() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("schema1.graphql"),
            "type Query { hello: String }",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("schema2.graphql"),
            "type Mutation { hello: String }",
        )
        .unwrap();

        let loader = SchemaLoader::new(SchemaConfig::Path("*.graphql".to_string()))
            .with_base_path(temp_dir.path());
        let sources = loader.load().await.unwrap();

        let sdl: Vec<&str> = sources.iter().map(|source| source.sdl.as_str()).collect();
        assert!(sdl.iter().any(|sdl| sdl.contains("type Query")));
        assert!(sdl.iter().any(|sdl| sdl.contains("type Mutation")));
    }

    #[tokio::test]
    async fn test_introspection_json_file() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("schema.json"),
            r#"{"data":{"__schema":{
                "queryType":{"name":"Query"},
                "types":[{"kind":"OBJECT","name":"Query","fields":[
                    {"name":"hello","args":[],"type":{"kind":"SCALAR","name":"String"}}
                ]}],
                "directives":[]
            }}}"#,
        )
        .unwrap();

        let loader = SchemaLoader::new(SchemaConfig::Path("schema.json".to_string()))
            .with_base_path(temp_dir.path());
        let sources = loader.load().await.unwrap();

        assert!(sources[0].generated);
        assert!(sources[0].sdl.contains("hello: String"));
    }

    #[tokio::test]
    async fn test_missing_files_are_an_error() {
        let temp_dir = tempdir().unwrap();
        let loader = SchemaLoader::new(SchemaConfig::Path("*.graphql".to_string()))
            .with_base_path(temp_dir.path());
        assert!(matches!(
            loader.load().await,
            Err(ProjectError::SchemaLoad(_))
        ));
    }

    #[test]
    fn test_build_schema_merges_extensions() {
        let schema = build_schema([
            ("schema.graphql", "type Query { a: String }"),
            ("local.graphql", "extend type Query { b: Int }"),
        ]);
        let query = schema.get_object("Query").unwrap();
        assert!(query.fields.contains_key("a"));
        assert!(query.fields.contains_key("b"));
    }

    #[test]
    fn test_build_schema_keeps_partial_schema() {
        let schema = build_schema([(
            "schema.graphql",
            "type Query { a: Missing } type User { id: ID }",
        )]);
        assert!(schema.types.contains_key("User"));
    }
}
