use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

use crate::accessor::{Accessor, CliAccessor, Outcome};
use crate::config::InvocationSettings;

/// Latest editor state of an open document
#[derive(Debug, Clone)]
struct OpenDocument {
    text: String,
    version: i32,
}

pub struct Backend {
    client: Client,
    accessor: Arc<dyn Accessor>,
    settings: RwLock<InvocationSettings>,
    documents: RwLock<HashMap<Url, OpenDocument>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        let accessor: CliAccessor = CliAccessor::default();
        Self::build(client, Arc::new(accessor))
    }

    /// Creates a backend answering through `accessor`
    pub fn build(client: Client, accessor: Arc<dyn Accessor>) -> Self {
        Self {
            client,
            accessor,
            settings: RwLock::new(InvocationSettings::default()),
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::FULL),
                    save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                        include_text: Some(true),
                    })),
                    ..Default::default()
                },
            )),
            document_symbol_provider: Some(OneOf::Left(true)),
            definition_provider: Some(OneOf::Left(true)),
            rename_provider: Some(OneOf::Left(true)),
            ..Default::default()
        }
    }

    /// Runs one accessor call on the blocking pool so the compiler process
    /// does not stall the event loop. Returns `None` only if the worker died.
    async fn call_accessor<T, F>(&self, capability: &'static str, call: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Accessor, &InvocationSettings) -> Outcome<T> + Send + 'static,
    {
        let accessor = Arc::clone(&self.accessor);
        let settings = self.settings.read().await.clone();

        let outcome = match tokio::task::spawn_blocking(move || call(accessor.as_ref(), &settings))
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{} worker failed: {}", capability, e);
                return None;
            }
        };

        if let Some(reason) = outcome.reason() {
            warn!("{} degraded: {}", capability, reason);
            self.client
                .log_message(MessageType::LOG, format!("{} degraded: {}", capability, reason))
                .await;
        }

        Some(outcome.into_value())
    }

    /// Text of an open document, or the file on disk if the editor never
    /// opened it
    async fn document_text(&self, uri: &Url) -> Option<String> {
        if let Some(document) = self.documents.read().await.get(uri) {
            return Some(document.text.clone());
        }

        let path = uri.to_file_path().ok()?;
        tokio::fs::read_to_string(&path)
            .await
            .inspect_err(|e| warn!("Failed to read {:?}: {}", path, e))
            .ok()
    }

    async fn open_document(&self, uri: Url, text: String, version: i32) {
        self.documents
            .write()
            .await
            .insert(uri, OpenDocument { text, version });
    }

    /// Whether `text` is still what the editor holds for `uri`. An
    /// unversioned run was never tied to an open buffer and stays current.
    async fn is_current(&self, uri: &Url, text: &str, version: Option<i32>) -> bool {
        match self.documents.read().await.get(uri) {
            Some(document) => document.text == text,
            None => version.is_none(),
        }
    }

    /// Compiles `text` and publishes its diagnostics, unless the document
    /// changed while the compiler ran.
    async fn validate(&self, uri: Url, text: String, version: Option<i32>) {
        let target = uri.clone();
        let compiled = text.clone();
        let diagnostics = self
            .call_accessor("show_errors", move |accessor, settings| {
                accessor.show_errors(&target, &compiled, settings)
            })
            .await
            .unwrap_or_default();

        if !self.is_current(&uri, &text, version).await {
            debug!("Dropping stale diagnostics for {} (version {:?})", uri, version);
            return;
        }

        self.client
            .log_message(
                MessageType::LOG,
                format!("Publishing {} diagnostics for {}", diagnostics.len(), uri),
            )
            .await;

        self.client.publish_diagnostics(uri, diagnostics, version).await;
    }

    async fn validate_open_documents(&self) {
        let snapshot: Vec<(Url, OpenDocument)> = self
            .documents
            .read()
            .await
            .iter()
            .map(|(uri, document)| (uri.clone(), document.clone()))
            .collect();

        for (uri, document) in snapshot {
            self.validate(uri, document.text, Some(document.version)).await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.client
            .log_message(MessageType::INFO, "LSP server initializing")
            .await;

        if let Some(options) = params.initialization_options {
            *self.settings.write().await = InvocationSettings::from_json(&options);
        }

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "lfortran-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "LSP server initialized")
            .await;

        let version = self
            .call_accessor("version", |accessor, settings| accessor.version(settings))
            .await
            .unwrap_or_default();

        let version = version.trim();
        if version.is_empty() {
            warn!("Could not determine lfortran version");
        } else {
            info!("Using {}", version);
            self.client
                .log_message(MessageType::INFO, format!("Using {}", version))
                .await;
        }
    }

    async fn shutdown(&self) -> Result<()> {
        self.client
            .log_message(MessageType::INFO, "LSP server shutting down")
            .await;
        Ok(())
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let settings = InvocationSettings::from_json(&params.settings);
        info!("Settings changed: {:?}", settings);
        *self.settings.write().await = settings;

        self.validate_open_documents().await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        let version = params.text_document.version;

        self.client
            .log_message(MessageType::LOG, format!("Document opened: {}", uri))
            .await;

        self.open_document(uri.clone(), text.clone(), version).await;
        self.validate(uri, text, Some(version)).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change carries the whole buffer.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        let uri = params.text_document.uri;
        let version = params.text_document.version;

        self.open_document(uri.clone(), change.text.clone(), version).await;
        self.validate(uri, change.text, Some(version)).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;

        let (saved, version) = {
            let mut documents = self.documents.write().await;
            match (documents.get_mut(&uri), params.text) {
                (Some(document), Some(text)) => {
                    document.text.clone_from(&text);
                    (Some(text), Some(document.version))
                }
                (Some(document), None) => (Some(document.text.clone()), Some(document.version)),
                (None, text) => (text, None),
            }
        };

        let text = match saved {
            Some(text) => text,
            None => match self.document_text(&uri).await {
                Some(text) => text,
                None => return,
            },
        };
        self.validate(uri, text, version).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.write().await.remove(&uri);
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let Some(text) = self.document_text(&uri).await else {
            return Ok(None);
        };

        let symbols = self
            .call_accessor("show_document_symbols", move |accessor, settings| {
                accessor.show_document_symbols(&uri, &text, settings)
            })
            .await
            .unwrap_or_default();

        Ok(Some(DocumentSymbolResponse::Flat(symbols)))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(text) = self.document_text(&uri).await else {
            return Ok(None);
        };

        let links = self
            .call_accessor("lookup_name", move |accessor, settings| {
                accessor.lookup_name(&uri, &text, position, settings)
            })
            .await
            .unwrap_or_default();

        if links.is_empty() {
            return Ok(None);
        }
        Ok(Some(GotoDefinitionResponse::Link(links)))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let new_name = params.new_name;
        let Some(text) = self.document_text(&uri).await else {
            return Ok(None);
        };

        let target = uri.clone();
        let edits = self
            .call_accessor("rename_symbol", move |accessor, settings| {
                accessor.rename_symbol(&target, &text, position, &new_name, settings)
            })
            .await
            .unwrap_or_default();

        if edits.is_empty() {
            return Ok(None);
        }
        Ok(Some(WorkspaceEdit::new(HashMap::from([(uri, edits)]))))
    }
}
