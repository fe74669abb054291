//! Session state behind the language server.
//!
//! The processor turns editor notifications and file events into project
//! cache updates, and answers requests from the caches. It knows nothing of
//! JSON-RPC: positions and results use the project's own types, and the
//! server converts at the edge.

use crate::document_cache::{DocumentCache, DocumentEntry};
use crate::watcher::{FileChangeKind, FileEvent};
use graphql_config::{
    find_config, is_config_file_name, load_config, package_json_has_graphql_key, GraphQLConfig,
};
use graphql_extract::{DefaultSourceParser, SourceParser};
use graphql_project::{
    CompletionItem, DefinitionLocation, Diagnostic, DocumentSymbol, GraphQLProject, HoverInfo,
    Position, Validator, WorkspaceSymbol,
};
use lsp_types::MessageType;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

struct Workspace {
    config: GraphQLConfig,
    /// Directory holding the config file; config globs are relative to it
    config_dir: PathBuf,
    projects: Vec<GraphQLProject>,
}

enum SessionState {
    /// Nothing has been opened or saved yet
    Uninitialized,
    Ready(Workspace),
    /// Config could not be loaded; documents only get syntax checks
    Degraded(String),
}

pub struct MessageProcessor {
    root: Option<PathBuf>,
    state: SessionState,
    documents: DocumentCache,
    parser: DefaultSourceParser,
    syntax_validator: Validator,
    messages: Vec<(MessageType, String)>,
}

impl Default for MessageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            state: SessionState::Uninitialized,
            documents: DocumentCache::new(),
            parser: DefaultSourceParser::default(),
            syntax_validator: Validator::new(),
            messages: Vec::new(),
        }
    }

    pub fn set_root(&mut self, root: PathBuf) {
        self.root = Some(root);
    }

    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        !matches!(self.state, SessionState::Uninitialized)
    }

    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self.state, SessionState::Degraded(_))
    }

    /// Messages for the client log, drained
    pub fn take_messages(&mut self) -> Vec<(MessageType, String)> {
        std::mem::take(&mut self.messages)
    }

    fn log(&mut self, level: MessageType, message: impl Into<String>) {
        self.messages.push((level, message.into()));
    }

    /// Load the config and index every project, replacing previous state
    pub async fn initialize(&mut self) {
        let Some(root) = self.root.clone() else {
            self.degrade("No workspace folder to look for a GraphQL config in");
            return;
        };

        let config_path = match find_config(&root) {
            Ok(Some(path)) => path,
            Ok(None) => {
                self.degrade(format!(
                    "No GraphQL config found in {}. Add a .graphqlrc.yml or graphql.config.* file.",
                    root.display()
                ));
                return;
            }
            Err(err) => {
                self.degrade(format!("Failed to look for a GraphQL config: {err}"));
                return;
            }
        };

        let config = match load_config(&config_path) {
            Ok(config) => config,
            Err(err) => {
                self.degrade(format!(
                    "Failed to load GraphQL config {}: {err}",
                    config_path.display()
                ));
                return;
            }
        };

        let config_dir = config_path
            .parent()
            .map_or_else(|| root.clone(), Path::to_path_buf);
        let mut projects = GraphQLProject::from_config(&config, &config_dir);
        for project in &mut projects {
            project.initialize().await;
        }

        // Open buffers are newer than what is on disk
        for path in self.documents.paths() {
            if let Some(document) = self.documents.get(&path) {
                if let Some(project) = route(&config, &config_dir, &mut projects, &path) {
                    project.update_file(&path, &document.text, None);
                }
            }
        }

        tracing::info!(
            config = %config_path.display(),
            projects = projects.len(),
            "Loaded GraphQL config"
        );
        self.log(
            MessageType::INFO,
            format!("Loaded GraphQL config from {}", config_path.display()),
        );
        self.state = SessionState::Ready(Workspace {
            config,
            config_dir,
            projects,
        });
    }

    fn degrade(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(%reason, "GraphQL config unavailable, only syntax will be checked");
        self.log(MessageType::WARNING, reason.clone());
        self.state = SessionState::Degraded(reason);
    }

    async fn ensure_initialized(&mut self) {
        if !self.is_initialized() {
            self.initialize().await;
        }
    }

    fn project_mut(&mut self, path: &Path) -> Option<&mut GraphQLProject> {
        match &mut self.state {
            SessionState::Ready(workspace) => route(
                &workspace.config,
                &workspace.config_dir,
                &mut workspace.projects,
                path,
            ),
            _ => None,
        }
    }

    fn project(&self, path: &Path) -> Option<&GraphQLProject> {
        let SessionState::Ready(workspace) = &self.state else {
            return None;
        };
        let (name, _) = workspace
            .config
            .find_project_for_document(path, &workspace.config_dir)?;
        workspace
            .projects
            .iter()
            .find(|project| project.name() == name && project.owns(path))
    }

    fn entry(&self, version: i32, path: &Path, text: String) -> DocumentEntry {
        let contents = self
            .parser
            .extract(&text, &path.to_string_lossy())
            .unwrap_or_default();
        DocumentEntry {
            version,
            text,
            contents,
        }
    }

    pub async fn did_open(&mut self, path: PathBuf, version: i32, text: String) -> Vec<Diagnostic> {
        self.ensure_initialized().await;
        let entry = self.entry(version, &path, text);
        if let Some(project) = self.project_mut(&path) {
            project.update_file(&path, &entry.text, None);
        }
        self.documents.open(path.clone(), entry);
        self.diagnostics(&path).await
    }

    /// Apply a full-text change; `None` when the change is stale
    pub async fn did_change(
        &mut self,
        path: PathBuf,
        version: i32,
        text: String,
    ) -> Option<Vec<Diagnostic>> {
        let entry = self.entry(version, &path, text);
        let text = entry.text.clone();
        if !self.documents.update(path.clone(), entry) {
            return None;
        }
        if let Some(project) = self.project_mut(&path) {
            project.update_file(&path, &text, None);
        }
        Some(self.diagnostics(&path).await)
    }

    pub async fn did_save(&mut self, path: PathBuf) -> Vec<Diagnostic> {
        if is_config_file(&path).await {
            self.initialize().await;
            return Vec::new();
        }
        self.ensure_initialized().await;
        self.diagnostics(&path).await
    }

    /// Forget the editor buffer; the project goes back to the file on disk
    pub async fn did_close(&mut self, path: &Path) {
        if self.documents.remove(path).is_none() {
            return;
        }
        let on_disk = read_file(path).await;
        if let Some(project) = self.project_mut(path) {
            match on_disk {
                Some((text, mtime)) => {
                    project.update_file(path, &text, mtime);
                }
                None => {
                    project.remove_file(path);
                }
            }
        }
    }

    /// Apply file changes from disk, then re-diagnose open documents.
    ///
    /// A changed config file reloads everything. While degraded, only a config
    /// change is acted on.
    pub async fn did_change_watched_files(
        &mut self,
        events: Vec<FileEvent>,
    ) -> Vec<(PathBuf, Vec<Diagnostic>)> {
        let mut reload = false;
        let mut changed = false;

        for event in events {
            if is_config_file(&event.path).await {
                reload = true;
                continue;
            }
            // Open documents are owned by the editor
            if self.documents.contains(&event.path) {
                continue;
            }
            let on_disk = match event.kind {
                FileChangeKind::Deleted => None,
                FileChangeKind::Created | FileChangeKind::Changed => read_file(&event.path).await,
            };
            let Some(project) = self.project_mut(&event.path) else {
                continue;
            };
            changed |= match on_disk {
                Some((text, mtime)) => project.update_file(&event.path, &text, mtime),
                None => project.remove_file(&event.path),
            };
        }

        if reload && self.is_initialized() {
            tracing::info!("GraphQL config changed, reloading");
            self.initialize().await;
            changed = true;
        }
        if !changed {
            return Vec::new();
        }

        let mut published = Vec::new();
        for path in self.documents.paths() {
            let diagnostics = self.diagnostics(&path).await;
            published.push((path, diagnostics));
        }
        published
    }

    /// Re-read the config, for the client's configuration-changed notification
    pub async fn reload_config(&mut self) {
        if self.is_initialized() {
            self.initialize().await;
        }
    }

    async fn diagnostics(&mut self, path: &Path) -> Vec<Diagnostic> {
        if let Some(project) = self.project_mut(path) {
            return project.diagnostics(path).await;
        }

        let Some(document) = self.documents.get(path) else {
            return Vec::new();
        };
        if let SessionState::Degraded(reason) = &self.state {
            tracing::debug!(path = %path.display(), %reason, "Checking syntax only");
        }
        let fragments = HashMap::new();
        document
            .contents
            .iter()
            .flat_map(|content| {
                self.syntax_validator
                    .diagnose_content(content, None, &fragments)
            })
            .collect()
    }

    pub async fn completion(&mut self, path: &Path, position: Position) -> Vec<CompletionItem> {
        match self.project_mut(path) {
            Some(project) => project.completions(path, position).await,
            None => Vec::new(),
        }
    }

    pub async fn hover(&mut self, path: &Path, position: Position) -> Option<HoverInfo> {
        self.project_mut(path)?.hover(path, position).await
    }

    pub async fn definition(&mut self, path: &Path, position: Position) -> Vec<DefinitionLocation> {
        match self.project_mut(path) {
            Some(project) => project.definition(path, position).await,
            None => Vec::new(),
        }
    }

    #[must_use]
    pub fn document_symbols(&self, path: &Path) -> Vec<DocumentSymbol> {
        self.project(path)
            .map(|project| project.document_symbols(path))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn workspace_symbols(&self, query: &str) -> Vec<WorkspaceSymbol> {
        match &self.state {
            SessionState::Ready(workspace) => workspace
                .projects
                .iter()
                .flat_map(|project| project.workspace_symbols(query))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn route<'a>(
    config: &GraphQLConfig,
    config_dir: &Path,
    projects: &'a mut [GraphQLProject],
    path: &Path,
) -> Option<&'a mut GraphQLProject> {
    let (name, _) = config.find_project_for_document(path, config_dir)?;
    // A file outside the project's globs must not leak into its index
    projects
        .iter_mut()
        .find(|project| project.name() == name && project.owns(path))
}

/// Whether a change to `path` should reload the config
async fn is_config_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    if is_config_file_name(name) {
        return true;
    }
    if name != "package.json" {
        return false;
    }
    tokio::fs::read_to_string(path)
        .await
        .is_ok_and(|contents| package_json_has_graphql_key(&contents))
}

async fn read_file(path: &Path) -> Option<(String, Option<std::time::SystemTime>)> {
    let text = tokio::fs::read_to_string(path).await.ok()?;
    let mtime = tokio::fs::metadata(path)
        .await
        .ok()
        .and_then(|metadata| metadata.modified().ok());
    Some((text, mtime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_project::DiagnosticSource;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = "schema: schema.graphql\ndocuments: '**/*.graphql'\n";
    const SCHEMA: &str = "type Query { user: User }\ntype User { id: ID name: String }\n";

    fn workspace(with_config: bool) -> (TempDir, MessageProcessor) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("schema.graphql"), SCHEMA).unwrap();
        if with_config {
            fs::write(root.join(".graphqlrc.yml"), CONFIG).unwrap();
        }
        let mut processor = MessageProcessor::new();
        processor.set_root(root.to_path_buf());
        (temp_dir, processor)
    }

    fn labels(items: Vec<CompletionItem>) -> Vec<String> {
        items.into_iter().map(|item| item.label).collect()
    }

    #[tokio::test]
    async fn test_requests_before_first_open_are_empty() {
        let (temp_dir, mut processor) = workspace(true);
        let path = temp_dir.path().join("query.graphql");
        fs::write(&path, "{ }").unwrap();

        assert!(processor
            .completion(&path, Position::new(0, 2))
            .await
            .is_empty());
        assert!(processor.hover(&path, Position::new(0, 2)).await.is_none());
        assert!(processor.workspace_symbols("").is_empty());
        assert!(!processor.is_initialized());

        processor.did_open(path.clone(), 1, "{ }".to_string()).await;
        assert!(processor.is_initialized());
        assert_eq!(
            labels(processor.completion(&path, Position::new(0, 2)).await),
            vec!["user"]
        );
    }

    #[tokio::test]
    async fn test_open_and_change_publish_diagnostics() {
        let (temp_dir, mut processor) = workspace(true);
        let path = temp_dir.path().join("query.graphql");

        let diagnostics = processor
            .did_open(path.clone(), 1, "{ nope }".to_string())
            .await;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].source, DiagnosticSource::Validation);

        let diagnostics = processor
            .did_change(path.clone(), 2, "{ user { id } }".to_string())
            .await;
        assert_eq!(diagnostics, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_stale_change_is_ignored() {
        let (temp_dir, mut processor) = workspace(true);
        let path = temp_dir.path().join("query.graphql");
        processor.did_open(path.clone(), 1, "{ user { id } }".to_string()).await;

        let newer = processor
            .did_change(path.clone(), 3, "{ user { name } }".to_string())
            .await;
        assert!(newer.is_some());
        let stale = processor
            .did_change(path.clone(), 2, "{ broken".to_string())
            .await;
        assert!(stale.is_none());

        assert_eq!(processor.documents.get(&path).unwrap().version, 3);
        assert!(processor.diagnostics(&path).await.is_empty());
        assert_eq!(processor.document_symbols(&path)[1].name, "user");
    }

    #[tokio::test]
    async fn test_missing_config_degrades_then_recovers() {
        let (temp_dir, mut processor) = workspace(false);
        let root = temp_dir.path();
        let path = root.join("query.graphql");

        let diagnostics = processor.did_open(path.clone(), 1, "{ nope }".to_string()).await;
        assert!(processor.is_degraded());
        assert!(diagnostics.is_empty());
        let messages = processor.take_messages();
        assert!(messages
            .iter()
            .any(|(level, _)| *level == MessageType::WARNING));

        let diagnostics = processor.did_change(path.clone(), 2, "{ nope".to_string()).await;
        assert_eq!(diagnostics.unwrap()[0].source, DiagnosticSource::Syntax);

        // An unrelated file does not retry
        let unrelated = root.join("notes.graphql");
        fs::write(&unrelated, "{ a }").unwrap();
        processor
            .did_change_watched_files(vec![FileEvent::new(unrelated, FileChangeKind::Created)])
            .await;
        assert!(processor.is_degraded());

        let config = root.join(".graphqlrc.yml");
        fs::write(&config, CONFIG).unwrap();
        let published = processor
            .did_change_watched_files(vec![FileEvent::new(config, FileChangeKind::Created)])
            .await;
        assert!(!processor.is_degraded());
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, path);
        assert_eq!(published[0].1[0].source, DiagnosticSource::Syntax);
    }

    #[tokio::test]
    async fn test_package_json_config_is_detected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("package.json");

        fs::write(&path, r#"{ "name": "app" }"#).unwrap();
        assert!(!is_config_file(&path).await);

        fs::write(&path, r#"{ "name": "app", "graphql": { "schema": "schema.graphql" } }"#).unwrap();
        assert!(is_config_file(&path).await);
        assert!(is_config_file(Path::new("/x/graphql.config.ts")).await);
    }

    #[tokio::test]
    async fn test_watched_fragment_files_feed_open_documents() {
        let (temp_dir, mut processor) = workspace(true);
        let root = temp_dir.path();
        let query = root.join("query.graphql");
        let text = "{ user { ...UserName } }".to_string();

        let diagnostics = processor.did_open(query.clone(), 1, text).await;
        assert!(!diagnostics.is_empty());

        let fragment = root.join("fragments.graphql");
        fs::write(&fragment, "fragment UserName on User { name }").unwrap();
        let published = processor
            .did_change_watched_files(vec![FileEvent::new(fragment.clone(), FileChangeKind::Created)])
            .await;
        assert_eq!(published, vec![(query.clone(), Vec::new())]);

        let definitions = processor.definition(&query, Position::new(0, 14)).await;
        assert_eq!(definitions[0].file_path, fragment);

        fs::remove_file(&fragment).unwrap();
        let published = processor
            .did_change_watched_files(vec![FileEvent::new(fragment, FileChangeKind::Deleted)])
            .await;
        assert!(!published[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_close_reverts_to_disk() {
        let (temp_dir, mut processor) = workspace(true);
        let path = temp_dir.path().join("frags.graphql");
        fs::write(&path, "fragment OnDisk on User { id }").unwrap();

        processor
            .did_open(path.clone(), 1, "fragment Unsaved on User { id }".to_string())
            .await;
        assert_eq!(processor.workspace_symbols("unsaved").len(), 1);

        processor.did_close(&path).await;
        assert!(processor.workspace_symbols("unsaved").is_empty());
        assert_eq!(processor.workspace_symbols("ondisk").len(), 1);
    }

    #[tokio::test]
    async fn test_files_outside_document_globs_stay_out_of_the_index() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("schema.graphql"), SCHEMA).unwrap();
        fs::write(
            root.join(".graphqlrc.yml"),
            "schema: schema.graphql\ndocuments: 'src/**/*.graphql'\n",
        )
        .unwrap();
        let mut processor = MessageProcessor::new();
        processor.set_root(root.to_path_buf());

        let scratch = root.join("scratch.graphql");
        processor
            .did_open(scratch.clone(), 1, "fragment Scratch on User { id }".to_string())
            .await;
        processor
            .did_change(scratch.clone(), 2, "fragment Scratch on User { name }".to_string())
            .await;
        assert!(processor.workspace_symbols("scratch").is_empty());
        assert!(processor
            .completion(&scratch, Position::new(0, 27))
            .await
            .is_empty());

        let query = root.join("src/query.graphql");
        let diagnostics = processor
            .did_open(query, 1, "{ user { ...Scratch } }".to_string())
            .await;
        assert!(!diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_multi_project_routing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("api")).unwrap();
        fs::create_dir_all(root.join("admin")).unwrap();
        fs::write(root.join("api/schema.graphql"), "type Query { products: [String] }").unwrap();
        fs::write(root.join("admin/schema.graphql"), "type Query { users: [String] }").unwrap();
        fs::write(
            root.join("graphql.config.yml"),
            "projects:\n  api:\n    schema: api/schema.graphql\n    documents: 'api/**/*.graphql'\n  admin:\n    schema: admin/schema.graphql\n    documents: 'admin/**/*.graphql'\n",
        )
        .unwrap();

        let mut processor = MessageProcessor::new();
        processor.set_root(root.to_path_buf());

        let api = root.join("api/query.graphql");
        processor.did_open(api.clone(), 1, "{ }".to_string()).await;
        let admin = root.join("admin/query.graphql");
        processor.did_open(admin.clone(), 1, "{ }".to_string()).await;

        assert_eq!(
            labels(processor.completion(&api, Position::new(0, 2)).await),
            vec!["products"]
        );
        assert_eq!(
            labels(processor.completion(&admin, Position::new(0, 2)).await),
            vec!["users"]
        );
    }
}
