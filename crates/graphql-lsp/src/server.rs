use crate::conversions::{
    to_lsp_completion_item, to_lsp_diagnostic, to_lsp_hover, to_lsp_location, to_position,
    to_symbol_information, to_workspace_symbol,
};
use crate::processor::MessageProcessor;
use crate::watcher::{self, FileChangeKind, FileEvent};
use graphql_project::Diagnostic;
use lsp_types::{
    CompletionOptions, CompletionParams, CompletionResponse, DidChangeConfigurationParams,
    DidChangeTextDocumentParams, DidChangeWatchedFilesParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DidSaveTextDocumentParams, DocumentSymbolParams,
    DocumentSymbolResponse, FileChangeType, GotoDefinitionParams, GotoDefinitionResponse, Hover,
    HoverParams, HoverProviderCapability, InitializeParams, InitializeResult, InitializedParams,
    MessageType, OneOf, ServerCapabilities, ServerInfo, SymbolInformation,
    TextDocumentSyncCapability, TextDocumentSyncKind, Uri, WorkspaceSymbol, WorkspaceSymbolParams,
};
use notify::RecommendedWatcher;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_lsp_server::jsonrpc::Result;
use tower_lsp_server::{Client, LanguageServer, UriExt};

pub struct GraphQLLanguageServer {
    client: Client,
    /// All session state; requests are answered one at a time
    processor: Arc<Mutex<MessageProcessor>>,
    /// Kept alive for as long as the server runs
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl GraphQLLanguageServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            processor: Arc::new(Mutex::new(MessageProcessor::new())),
            watcher: Mutex::new(None),
        }
    }

    async fn publish(&self, uri: Uri, diagnostics: Vec<Diagnostic>) {
        publish(&self.client, uri, diagnostics).await;
    }

    async fn flush_messages(&self, processor: &mut MessageProcessor) {
        flush_messages(&self.client, processor).await;
    }

    /// Start watching the workspace root and feed events to the processor
    async fn start_watcher(&self, root: PathBuf) {
        let (watcher, mut events) = match watcher::watch(&root) {
            Ok(watching) => watching,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to watch workspace; changes on disk will be missed");
                return;
            }
        };
        *self.watcher.lock().await = Some(watcher);

        let client = self.client.clone();
        let processor = Arc::clone(&self.processor);
        tokio::spawn(async move {
            while let Some(first) = events.recv().await {
                // Drain whatever else is queued so a burst is handled in one pass
                let mut batch = vec![first];
                while let Ok(event) = events.try_recv() {
                    batch.push(event);
                }

                let mut processor = processor.lock().await;
                let published = processor.did_change_watched_files(batch).await;
                for (path, diagnostics) in published {
                    if let Some(uri) = Uri::from_file_path(&path) {
                        publish(&client, uri, diagnostics).await;
                    }
                }
                flush_messages(&client, &mut processor).await;
            }
        });
    }
}

async fn publish(client: &Client, uri: Uri, diagnostics: Vec<Diagnostic>) {
    let diagnostics = diagnostics.into_iter().map(to_lsp_diagnostic).collect();
    client.publish_diagnostics(uri, diagnostics, None).await;
}

async fn flush_messages(client: &Client, processor: &mut MessageProcessor) {
    for (level, message) in processor.take_messages() {
        client.log_message(level, message).await;
    }
}

fn uri_path(uri: &Uri) -> Option<PathBuf> {
    let path = uri.to_file_path().map(std::borrow::Cow::into_owned);
    if path.is_none() {
        tracing::debug!(uri = uri.as_str(), "Ignoring non-file URI");
    }
    path
}

impl LanguageServer for GraphQLLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("Initializing GraphQL Language Server");

        #[allow(deprecated)] // root_uri is the fallback for clients without workspace folders
        let root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|folder| folder.uri.to_file_path())
            .or_else(|| params.root_uri.as_ref().and_then(|uri| uri.to_file_path()))
            .map(std::borrow::Cow::into_owned);

        if let Some(root) = root {
            tracing::info!(root = %root.display(), "Workspace root");
            self.processor.lock().await.set_root(root);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![
                        ".".to_string(),
                        "{".to_string(),
                        "@".to_string(),
                        "$".to_string(),
                        "(".to_string(),
                    ]),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                workspace_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "GraphQL Language Server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        tracing::info!("GraphQL Language Server initialized");
        self.client
            .log_message(MessageType::INFO, "GraphQL LSP initialized")
            .await;

        let root = self.processor.lock().await.root().map(PathBuf::from);
        if let Some(root) = root {
            self.start_watcher(root).await;
        }
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down GraphQL Language Server");
        self.watcher.lock().await.take();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        tracing::debug!(uri = document.uri.as_str(), "Document opened");
        let Some(path) = uri_path(&document.uri) else {
            return;
        };

        let mut processor = self.processor.lock().await;
        let diagnostics = processor
            .did_open(path, document.version, document.text)
            .await;
        self.flush_messages(&mut processor).await;
        drop(processor);
        self.publish(document.uri, diagnostics).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::debug!(uri = uri.as_str(), "Document changed");
        let Some(path) = uri_path(&uri) else {
            return;
        };
        // Full sync: the last change holds the whole text
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        let diagnostics = self
            .processor
            .lock()
            .await
            .did_change(path, params.text_document.version, change.text)
            .await;
        if let Some(diagnostics) = diagnostics {
            self.publish(uri, diagnostics).await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::debug!(uri = uri.as_str(), "Document saved");
        let Some(path) = uri_path(&uri) else {
            return;
        };

        let mut processor = self.processor.lock().await;
        let diagnostics = processor.did_save(path).await;
        self.flush_messages(&mut processor).await;
        drop(processor);
        self.publish(uri, diagnostics).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::debug!(uri = uri.as_str(), "Document closed");
        if let Some(path) = uri_path(&uri) {
            self.processor.lock().await.did_close(&path).await;
        }
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn did_change_configuration(&self, _params: DidChangeConfigurationParams) {
        let mut processor = self.processor.lock().await;
        processor.reload_config().await;
        self.flush_messages(&mut processor).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let events: Vec<FileEvent> = params
            .changes
            .into_iter()
            .filter_map(|change| {
                let kind = match change.typ {
                    FileChangeType::CREATED => FileChangeKind::Created,
                    FileChangeType::DELETED => FileChangeKind::Deleted,
                    _ => FileChangeKind::Changed,
                };
                Some(FileEvent::new(uri_path(&change.uri)?, kind))
            })
            .collect();

        let mut processor = self.processor.lock().await;
        let published = processor.did_change_watched_files(events).await;
        self.flush_messages(&mut processor).await;
        drop(processor);
        for (path, diagnostics) in published {
            if let Some(uri) = Uri::from_file_path(&path) {
                self.publish(uri, diagnostics).await;
            }
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position;
        let Some(path) = uri_path(&position.text_document.uri) else {
            return Ok(None);
        };

        let items = self
            .processor
            .lock()
            .await
            .completion(&path, to_position(position.position))
            .await;
        Ok(Some(CompletionResponse::Array(
            items.into_iter().map(to_lsp_completion_item).collect(),
        )))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        let Some(path) = uri_path(&position.text_document.uri) else {
            return Ok(None);
        };

        let hover = self
            .processor
            .lock()
            .await
            .hover(&path, to_position(position.position))
            .await;
        Ok(hover.map(to_lsp_hover))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position = params.text_document_position_params;
        let Some(path) = uri_path(&position.text_document.uri) else {
            return Ok(None);
        };

        let locations: Vec<_> = self
            .processor
            .lock()
            .await
            .definition(&path, to_position(position.position))
            .await
            .iter()
            .filter_map(to_lsp_location)
            .collect();
        if locations.is_empty() {
            return Ok(None);
        }
        Ok(Some(GotoDefinitionResponse::Array(locations)))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let Some(path) = uri_path(&params.text_document.uri) else {
            return Ok(None);
        };

        let symbols: Vec<SymbolInformation> = self
            .processor
            .lock()
            .await
            .document_symbols(&path)
            .into_iter()
            .filter_map(|symbol| to_symbol_information(&path, symbol))
            .collect();
        Ok(Some(DocumentSymbolResponse::Flat(symbols)))
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<OneOf<Vec<SymbolInformation>, Vec<WorkspaceSymbol>>>> {
        tracing::debug!(query = %params.query, "Workspace symbols requested");
        let symbols = self
            .processor
            .lock()
            .await
            .workspace_symbols(&params.query)
            .into_iter()
            .filter_map(to_workspace_symbol)
            .collect();
        Ok(Some(OneOf::Left(symbols)))
    }
}
