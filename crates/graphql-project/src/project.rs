use crate::dependencies::index_document;
use crate::lookup_file::{lookup_file_path, write_lookup_file};
use crate::location::span_text;
use crate::schema::{build_schema, SchemaLoader, SchemaSource};
use crate::{
    goto_definition, hover, suggestions, CompletionItem, DefinitionIndex, DefinitionLocation,
    Diagnostic, DocumentSymbol, FragmentInfo, HoverInfo, ObjectTypeInfo, Validator,
};
use apollo_compiler::ast;
use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use graphql_config::{GraphQLConfig, ProjectConfig};
use graphql_extract::{CachedContent, DefaultSourceParser, Position, SourceParser, SUPPORTED_EXTENSIONS};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinSet;
use walkdir::WalkDir;

/// Upper bound on file reads in flight during a scan
const MAX_CONCURRENT_READS: usize = 200;

/// Reads failing with descriptor exhaustion are retried this many times
const MAX_READ_ATTEMPTS: u32 = 5;

/// One file the project knows about
#[derive(Debug, Clone)]
struct CachedFile {
    contents: Vec<CachedContent>,
    mtime: Option<SystemTime>,
    is_schema: bool,
}

#[derive(Debug)]
struct LoadedSchema {
    sources: Vec<SchemaSource>,
    schema: Arc<Valid<Schema>>,
    /// File generation the schema was last extended at
    extended_at: Option<u64>,
    /// Hash of the local SDL the schema was last built with
    extensions_hash: u64,
}

#[derive(Debug)]
enum SchemaState {
    Unloaded,
    Failed(String),
    Loaded(LoadedSchema),
}

/// A symbol found anywhere in the project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSymbol {
    pub file_path: PathBuf,
    pub symbol: DocumentSymbol,
}

/// Cached state of one configured project: the files it owns, the fragment
/// and type indices built from them, and its schema.
///
/// The cache is owned by a single task and mutated through `&mut self`, so
/// updates never race. Every file change bumps a generation counter; the
/// schema is re-extended with local SDL lazily, on the next access after a
/// change, and only rebuilt when that SDL actually differs.
pub struct GraphQLProject {
    name: String,
    config: ProjectConfig,
    root: PathBuf,
    parser: Box<dyn SourceParser>,
    validator: Validator,
    files: HashMap<PathBuf, CachedFile>,
    fragments: HashMap<String, FragmentInfo>,
    types: HashMap<String, ObjectTypeInfo>,
    schema: SchemaState,
    generation: u64,
    extension_passes: u64,
    lookup_file: Option<PathBuf>,
}

impl GraphQLProject {
    #[must_use]
    pub fn new(name: impl Into<String>, config: ProjectConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            config,
            root: root.into(),
            parser: Box::new(DefaultSourceParser::default()),
            validator: Validator::new(),
            files: HashMap::new(),
            fragments: HashMap::new(),
            types: HashMap::new(),
            schema: SchemaState::Unloaded,
            generation: 0,
            extension_passes: 0,
            lookup_file: None,
        }
    }

    /// One project per entry of a (single or multi-project) config
    #[must_use]
    pub fn from_config(config: &GraphQLConfig, root: &Path) -> Vec<Self> {
        config
            .projects()
            .map(|(name, project)| Self::new(name, project.clone(), root))
            .collect()
    }

    /// Use a different snippet extractor for host files
    #[must_use]
    pub fn with_source_parser(mut self, parser: Box<dyn SourceParser>) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn fragments(&self) -> &HashMap<String, FragmentInfo> {
        &self.fragments
    }

    #[must_use]
    pub const fn types(&self) -> &HashMap<String, ObjectTypeInfo> {
        &self.types
    }

    /// Bumped on every file update or removal
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// How many times local SDL has been collected and hashed
    #[must_use]
    pub const fn extension_passes(&self) -> u64 {
        self.extension_passes
    }

    /// The generated schema file, once one has been written
    #[must_use]
    pub fn lookup_file(&self) -> Option<&Path> {
        self.lookup_file.as_deref()
    }

    /// Why the schema could not be loaded, if it could not
    #[must_use]
    pub fn schema_error(&self) -> Option<&str> {
        match &self.schema {
            SchemaState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Whether `path` is a schema or document file of this project
    #[must_use]
    pub fn owns(&self, path: &Path) -> bool {
        !self.config.is_excluded(path, &self.root)
            && (self.config.is_document_file(path, &self.root)
                || self.config.is_schema_file(path, &self.root))
    }

    #[must_use]
    pub fn files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = self.files.keys().map(PathBuf::as_path).collect();
        files.sort();
        files
    }

    /// Scan the workspace for files this project owns and index them.
    ///
    /// Replaces whatever was cached before.
    pub async fn initialize(&mut self) {
        let paths = self.discover_files();
        tracing::info!(project = %self.name, files = paths.len(), "Indexing project");

        self.files.clear();
        self.fragments.clear();
        self.types.clear();
        self.schema = SchemaState::Unloaded;

        for (path, text, mtime) in read_files(paths).await {
            self.index_file(path, &text, mtime);
        }
        self.generation += 1;
    }

    fn discover_files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_ignored_dir(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(error = %err, "Skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| has_supported_extension(path) && self.owns(path))
            .collect()
    }

    /// Re-read one file's text into the cache.
    ///
    /// The file's previous fragment and type entries are dropped before the new
    /// ones are inserted. A modification time older than the cached one means
    /// the update is stale and it is ignored; returns whether it was applied.
    pub fn update_file(&mut self, path: &Path, text: &str, mtime: Option<SystemTime>) -> bool {
        if let (Some(incoming), Some(cached)) = (
            mtime,
            self.files.get(path).and_then(|file| file.mtime),
        ) {
            if incoming < cached {
                tracing::debug!(path = %path.display(), "Ignoring stale file update");
                return false;
            }
        }

        self.remove_entries(path);
        let is_schema = self.index_file(path.to_path_buf(), text, mtime);
        self.generation += 1;
        if is_schema {
            self.invalidate_schema();
        }
        true
    }

    /// Forget a deleted file
    pub fn remove_file(&mut self, path: &Path) -> bool {
        let Some(file) = self.files.remove(path) else {
            return false;
        };
        self.remove_entries(path);
        self.generation += 1;
        if file.is_schema {
            self.invalidate_schema();
        }
        true
    }

    /// Drop the schema so the next access loads it again
    pub fn invalidate_schema(&mut self) {
        tracing::debug!(project = %self.name, "Schema invalidated");
        self.schema = SchemaState::Unloaded;
    }

    fn remove_entries(&mut self, path: &Path) {
        self.fragments.retain(|_, fragment| fragment.file_path != path);
        self.types.retain(|_, ty| ty.file_path != path);
    }

    fn index_file(&mut self, path: PathBuf, text: &str, mtime: Option<SystemTime>) -> bool {
        let contents = self
            .parser
            .extract(text, &path.to_string_lossy())
            .unwrap_or_default();
        let is_schema = self.config.is_schema_file(&path, &self.root);

        for content in &contents {
            let document = match ast::Document::parse(content.query.as_str(), &path) {
                Ok(document) => document,
                Err(with_errors) => with_errors.partial,
            };
            let (fragments, types) = index_document(&path, content, &document);
            if !is_schema {
                for fragment in fragments {
                    self.fragments.insert(fragment.name().to_string(), fragment);
                }
            }
            for ty in types {
                self.types.insert(ty.name().to_string(), ty);
            }
        }

        self.files.insert(
            path,
            CachedFile {
                contents,
                mtime,
                is_schema,
            },
        );
        is_schema
    }

    /// Snippets cached for `path`
    #[must_use]
    pub fn contents(&self, path: &Path) -> &[CachedContent] {
        self.files
            .get(path)
            .map_or(&[], |file| file.contents.as_slice())
    }

    /// The snippet of `path` containing `position`
    #[must_use]
    pub fn content_at(&self, path: &Path, position: Position) -> Option<&CachedContent> {
        self.contents(path)
            .iter()
            .find(|content| content.range.contains_position(position))
    }

    /// The project schema, extended with SDL found in project documents.
    ///
    /// Returns `None` when no schema could be loaded.
    pub async fn schema(&mut self) -> Option<Arc<Valid<Schema>>> {
        if matches!(self.schema, SchemaState::Unloaded) {
            self.load_schema().await;
        }

        let generation = self.generation;
        let (schema, previous_hash) = match &self.schema {
            SchemaState::Loaded(loaded) if loaded.extended_at == Some(generation) => {
                return Some(Arc::clone(&loaded.schema));
            }
            SchemaState::Loaded(loaded) => (Arc::clone(&loaded.schema), loaded.extensions_hash),
            SchemaState::Unloaded | SchemaState::Failed(_) => return None,
        };

        self.extension_passes += 1;
        let extensions = self.local_extensions();
        let hash = extensions_hash(&extensions);

        let (schema, generated) = if hash == previous_hash {
            (schema, None)
        } else {
            tracing::debug!(
                project = %self.name,
                extensions = extensions.len(),
                "Local SDL changed, rebuilding schema"
            );
            let SchemaState::Loaded(loaded) = &self.schema else {
                return None;
            };
            let generated = loaded.sources.iter().any(|source| source.generated);
            (self.build(&loaded.sources, &extensions), Some(generated))
        };

        if let SchemaState::Loaded(loaded) = &mut self.schema {
            loaded.schema = Arc::clone(&schema);
            loaded.extended_at = Some(generation);
            loaded.extensions_hash = hash;
        }
        if let Some(generated) = generated {
            self.refresh_lookup_file(&schema, generated);
        }
        Some(schema)
    }

    async fn load_schema(&mut self) {
        let loader = SchemaLoader::new(self.config.schema.clone()).with_base_path(&self.root);
        match loader.load().await {
            Ok(sources) => {
                let extensions = self.local_extensions();
                let schema = self.build(&sources, &extensions);
                let generated = sources.iter().any(|source| source.generated);
                self.refresh_lookup_file(&schema, generated);
                self.schema = SchemaState::Loaded(LoadedSchema {
                    sources,
                    schema,
                    extended_at: None,
                    extensions_hash: extensions_hash(&extensions),
                });
            }
            Err(err) => {
                tracing::warn!(project = %self.name, error = %err, "Failed to load schema");
                self.schema = SchemaState::Failed(err.to_string());
            }
        }
    }

    fn build(&self, sources: &[SchemaSource], extensions: &[(String, String)]) -> Arc<Valid<Schema>> {
        let directives = self.config.custom_directives();
        Arc::new(build_schema(
            sources
                .iter()
                .map(|source| (source.origin.as_str(), source.sdl.as_str()))
                .chain(
                    directives
                        .iter()
                        .map(|sdl| ("customDirectives", sdl.as_str())),
                )
                .chain(
                    extensions
                        .iter()
                        .map(|(origin, sdl)| (origin.as_str(), sdl.as_str())),
                ),
        ))
    }

    /// Print the schema for go-to-definition when it has no source file of
    /// its own, or when the project asks for it
    fn refresh_lookup_file(&mut self, schema: &Schema, generated: bool) {
        if !generated && !self.config.cache_schema_file_for_lookup() {
            return;
        }
        let path = lookup_file_path(&self.root, &self.name);
        match write_lookup_file(&path, schema) {
            Ok(()) => self.lookup_file = Some(path),
            Err(err) => tracing::warn!(error = %err, "Failed to write schema lookup file"),
        }
    }

    /// Type system definitions and extensions written in project documents,
    /// as `(file, sdl)` pairs sorted by SDL
    fn local_extensions(&self) -> Vec<(String, String)> {
        let mut extensions = Vec::new();
        for (path, file) in &self.files {
            if file.is_schema {
                continue;
            }
            for content in &file.contents {
                let Ok(document) = ast::Document::parse(content.query.as_str(), path) else {
                    continue;
                };
                for definition in &document.definitions {
                    if definition.is_executable_definition() {
                        continue;
                    }
                    let sdl = definition
                        .location()
                        .and_then(|span| span_text(&content.query, span));
                    if let Some(sdl) = sdl {
                        extensions.push((path.display().to_string(), sdl.trim().to_string()));
                    }
                }
            }
        }
        extensions.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        extensions
    }

    /// Diagnostics for every snippet of `path`, in host-file coordinates.
    ///
    /// Schema files and projects with validation turned off only get syntax
    /// checks.
    pub async fn diagnostics(&mut self, path: &Path) -> Vec<Diagnostic> {
        let is_schema = self.files.get(path).is_some_and(|file| file.is_schema);
        let schema = if self.config.enable_validation() && !is_schema {
            self.schema().await
        } else {
            None
        };

        self.contents(path)
            .iter()
            .flat_map(|content| {
                self.validator
                    .diagnose_content(content, schema.as_deref(), &self.fragments)
            })
            .collect()
    }

    pub async fn completions(&mut self, path: &Path, position: Position) -> Vec<CompletionItem> {
        let Some(schema) = self.schema().await else {
            return Vec::new();
        };
        let Some(content) = self.content_at(path, position) else {
            return Vec::new();
        };

        let fragments: Vec<FragmentInfo> = self.fragments.values().cloned().collect();
        suggestions(&schema, &content.query, local_position(content, position), &fragments)
    }

    pub async fn hover(&mut self, path: &Path, position: Position) -> Option<HoverInfo> {
        let schema = self.schema().await?;
        let content = self.content_at(path, position)?;
        let offset = content.range.start.line;

        let mut info = hover(&schema, &content.query, local_position(content, position))?;
        info.range = info.range.map(|range| range.offset_lines(offset));
        Some(info)
    }

    pub async fn definition(&mut self, path: &Path, position: Position) -> Vec<DefinitionLocation> {
        let schema = self.schema().await;
        let Some(content) = self.content_at(path, position) else {
            return Vec::new();
        };

        let index = DefinitionIndex {
            schema: schema.as_deref().map(|schema| &**schema),
            fragments: &self.fragments,
            types: &self.types,
            lookup_file: self.lookup_file.as_deref(),
        };
        goto_definition(path, content, local_position(content, position), &index)
    }

    /// Outline of every snippet in `path`, in host-file coordinates
    #[must_use]
    pub fn document_symbols(&self, path: &Path) -> Vec<DocumentSymbol> {
        self.contents(path)
            .iter()
            .flat_map(|content| {
                let offset = content.range.start.line;
                crate::document_symbols(&content.query)
                    .into_iter()
                    .map(move |mut symbol| {
                        symbol.range = symbol.range.offset_lines(offset);
                        symbol.selection_range = symbol.selection_range.offset_lines(offset);
                        symbol
                    })
            })
            .collect()
    }

    /// Symbols across all cached files whose name contains `query`, ignoring case
    #[must_use]
    pub fn workspace_symbols(&self, query: &str) -> Vec<WorkspaceSymbol> {
        let query = query.to_lowercase();
        self.files()
            .into_iter()
            .flat_map(|path| {
                self.document_symbols(path)
                    .into_iter()
                    .filter(|symbol| symbol.name.to_lowercase().contains(&query))
                    .map(|symbol| WorkspaceSymbol {
                        file_path: path.to_path_buf(),
                        symbol,
                    })
            })
            .collect()
    }
}

fn local_position(content: &CachedContent, position: Position) -> Position {
    Position::new(
        position.line.saturating_sub(content.range.start.line),
        position.character,
    )
}

fn extensions_hash(extensions: &[(String, String)]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for (_, sdl) in extensions {
        sdl.hash(&mut hasher);
    }
    hasher.finish()
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| SUPPORTED_EXTENSIONS.contains(&extension))
}

fn is_ignored_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.') || name == "node_modules")
}

/// ENFILE or EMFILE
fn is_descriptor_exhaustion(err: &std::io::Error) -> bool {
    matches!(err.raw_os_error(), Some(23 | 24))
}

async fn read_file(path: &Path) -> std::io::Result<(String, Option<SystemTime>)> {
    let text = tokio::fs::read_to_string(path).await?;
    let mtime = tokio::fs::metadata(path)
        .await
        .ok()
        .and_then(|metadata| metadata.modified().ok());
    Ok((text, mtime))
}

/// Read `paths` with at most `MAX_CONCURRENT_READS` reads in flight.
///
/// Reads that run out of file descriptors go back on the queue after a short
/// backoff; other failures are logged and the file is skipped.
async fn read_files(paths: Vec<PathBuf>) -> Vec<(PathBuf, String, Option<SystemTime>)> {
    let mut queue: VecDeque<(PathBuf, u32)> = paths.into_iter().map(|path| (path, 0)).collect();
    let mut tasks = JoinSet::new();
    let mut files = Vec::new();

    loop {
        while tasks.len() < MAX_CONCURRENT_READS {
            let Some((path, attempts)) = queue.pop_front() else {
                break;
            };
            tasks.spawn(async move {
                let result = read_file(&path).await;
                (path, attempts, result)
            });
        }

        let Some(joined) = tasks.join_next().await else {
            break;
        };
        match joined {
            Ok((path, _, Ok((text, mtime)))) => files.push((path, text, mtime)),
            Ok((path, attempts, Err(err)))
                if is_descriptor_exhaustion(&err) && attempts + 1 < MAX_READ_ATTEMPTS =>
            {
                tracing::debug!(path = %path.display(), attempts, "Out of file descriptors, retrying");
                tokio::time::sleep(Duration::from_millis(10 << attempts)).await;
                queue.push_back((path, attempts + 1));
            }
            Ok((path, _, Err(err))) => {
                tracing::warn!(path = %path.display(), error = %err, "Failed to read file");
            }
            Err(err) => tracing::warn!(error = %err, "File read task failed"),
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_config::DocumentsConfig;
    use graphql_extract::Range;
    use std::fs;
    use tempfile::tempdir;

    fn project_config(schema: &str, documents: &str) -> ProjectConfig {
        ProjectConfig {
            documents: Some(DocumentsConfig::Pattern(documents.to_string())),
            ..ProjectConfig::with_schema(schema)
        }
    }

    #[test]
    fn test_descriptor_exhaustion() {
        assert!(is_descriptor_exhaustion(&std::io::Error::from_raw_os_error(24)));
        assert!(is_descriptor_exhaustion(&std::io::Error::from_raw_os_error(23)));
        assert!(!is_descriptor_exhaustion(&std::io::Error::from_raw_os_error(2)));
    }

    #[tokio::test]
    async fn test_read_files_skips_missing() {
        let temp_dir = tempdir().unwrap();
        let present = temp_dir.path().join("a.graphql");
        fs::write(&present, "{ a }").unwrap();

        let files = read_files(vec![present.clone(), temp_dir.path().join("missing.graphql")]).await;

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, present);
        assert_eq!(files[0].1, "{ a }");
        assert!(files[0].2.is_some());
    }

    #[tokio::test]
    async fn test_initialize_indexes_owned_files() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("schema.graphql"), "type Query { user: User } type User { id: ID }").unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(
            root.join("src/user.ts"),
            "const F = gql`\n  fragment UserId on User { id }\n`;\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("node_modules/pkg/x.ts"), "gql`fragment Hidden on User { id }`").unwrap();

        let mut project = GraphQLProject::new(
            "default",
            project_config("schema.graphql", "src/**/*.ts"),
            root,
        );
        project.initialize().await;

        assert!(project.fragments().contains_key("UserId"));
        assert!(!project.fragments().contains_key("Hidden"));
        assert!(project.types().contains_key("User"));
        assert_eq!(project.fragments()["UserId"].range().start.line, 1);
    }

    #[tokio::test]
    async fn test_update_replaces_entries_of_the_file() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("schema.graphql"), "type Query { a: String }").unwrap();
        let mut project = GraphQLProject::new("default", project_config("schema.graphql", "*.graphql"), root);
        project.initialize().await;

        let path = root.join("frags.graphql");
        assert!(project.update_file(&path, "fragment A on Query { a }", None));
        assert!(project.fragments().contains_key("A"));

        assert!(project.update_file(&path, "fragment B on Query { a }", None));
        assert!(!project.fragments().contains_key("A"));
        assert!(project.fragments().contains_key("B"));

        assert!(project.remove_file(&path));
        assert!(project.fragments().is_empty());
        assert!(!project.remove_file(&path));
    }

    #[test]
    fn test_stale_mtime_is_ignored() {
        let mut project = GraphQLProject::new(
            "default",
            project_config("schema.graphql", "*.graphql"),
            "/workspace",
        );
        let path = Path::new("/workspace/a.graphql");
        let now = SystemTime::now();
        let earlier = now - Duration::from_secs(10);

        assert!(project.update_file(path, "fragment New on Query { a }", Some(now)));
        assert!(!project.update_file(path, "fragment Old on Query { a }", Some(earlier)));
        assert!(project.fragments().contains_key("New"));
        assert!(!project.fragments().contains_key("Old"));
    }

    #[tokio::test]
    async fn test_schema_memoized_until_local_sdl_changes() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("schema.graphql"), "type Query { a: String }").unwrap();
        fs::write(root.join("query.graphql"), "{ a }").unwrap();
        let mut project = GraphQLProject::new("default", project_config("schema.graphql", "*.graphql"), root);
        project.initialize().await;

        let first = project.schema().await.unwrap();
        let second = project.schema().await.unwrap();
        assert_eq!(project.extension_passes(), 1);
        assert!(Arc::ptr_eq(&first, &second));

        // A change without new SDL re-checks the hash but keeps the schema
        project.update_file(&root.join("query.graphql"), "{ a __typename }", None);
        let third = project.schema().await.unwrap();
        assert_eq!(project.extension_passes(), 2);
        assert!(Arc::ptr_eq(&first, &third));

        project.update_file(
            &root.join("local.graphql"),
            "extend type Query { b: Int }",
            None,
        );
        let extended = project.schema().await.unwrap();
        assert_eq!(project.extension_passes(), 3);
        assert!(extended.get_object("Query").unwrap().fields.contains_key("b"));
    }

    #[tokio::test]
    async fn test_schema_file_change_reloads_schema() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        let schema_path = root.join("schema.graphql");
        fs::write(&schema_path, "type Query { a: String }").unwrap();
        let mut project = GraphQLProject::new("default", project_config("schema.graphql", "*.graphql"), root);
        project.initialize().await;
        assert!(project.schema().await.is_some());

        let sdl = "type Query { a: String z: Int }";
        fs::write(&schema_path, sdl).unwrap();
        project.update_file(&schema_path, sdl, None);

        let schema = project.schema().await.unwrap();
        assert!(schema.get_object("Query").unwrap().fields.contains_key("z"));
    }

    #[tokio::test]
    async fn test_missing_schema_degrades_to_syntax_checks() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        let mut project = GraphQLProject::new("default", project_config("schema.graphql", "*.graphql"), root);
        let path = root.join("query.graphql");
        project.update_file(&path, "query { nope }", None);

        assert!(project.schema().await.is_none());
        assert!(project.schema_error().is_some());
        assert!(project.diagnostics(&path).await.is_empty());

        project.update_file(&path, "query {", None);
        assert_eq!(project.diagnostics(&path).await.len(), 1);
    }

    #[tokio::test]
    async fn test_requests_map_embedded_positions() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("schema.graphql"), "type Query {\n  user: User\n}\ntype User {\n  id: ID\n}\n").unwrap();
        let mut project = GraphQLProject::new("default", project_config("schema.graphql", "*.ts"), root);
        project.initialize().await;

        let path = root.join("app.ts");
        project.update_file(&path, "const x = 1;\nconst Q = gql`\n  { user { id } }\n`;\n", None);

        let labels: Vec<String> = project
            .completions(&path, Position::new(2, 4))
            .await
            .into_iter()
            .map(|item| item.label)
            .collect();
        assert_eq!(labels, vec!["user"]);

        let hover = project.hover(&path, Position::new(2, 5)).await.unwrap();
        assert!(hover.contents.contains("Query.user: User"));
        assert_eq!(
            hover.range,
            Some(Range::new(Position::new(2, 4), Position::new(2, 8)))
        );

        let definitions = project.definition(&path, Position::new(2, 5)).await;
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].file_path, root.join("schema.graphql"));
        assert_eq!(definitions[0].range.start, Position::new(1, 2));

        assert!(project.completions(&path, Position::new(0, 3)).await.is_empty());
    }

    #[tokio::test]
    async fn test_symbols() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        let mut project = GraphQLProject::new("default", project_config("schema.graphql", "*.graphql"), root);
        project.update_file(&root.join("a.graphql"), "query GetUser { user { id } }", None);
        project.update_file(&root.join("b.graphql"), "\nfragment UserFields on User { id }", None);

        let outline = project.document_symbols(&root.join("b.graphql"));
        assert_eq!(outline[0].name, "UserFields");
        assert_eq!(outline[0].range.start, Position::new(1, 0));

        let found: Vec<String> = project
            .workspace_symbols("user")
            .into_iter()
            .map(|found| found.symbol.name)
            .collect();
        assert_eq!(found, vec!["GetUser", "user", "UserFields"]);
    }
}
