//! Shared fixtures for end-to-end tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower_lsp::ClientSocket;
use tower_lsp::jsonrpc::Request;

use lfortran_lsp::accessor::{AccessorError, CliAccessor, CompilerRunner, RealFs};
use lfortran_lsp::config::InvocationSettings;

/// Compiler stand-in returning canned output and recording the capability
/// flags of every run
#[derive(Clone, Default)]
pub struct FakeCompiler {
    output: Option<String>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeCompiler {
    pub fn with_output(output: &str) -> Self {
        Self {
            output: Some(output.to_string()),
            calls: Arc::default(),
        }
    }

    /// Behaves as if no executable could be found
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Flags of the first run started with `capability`
    pub fn call_with(&self, capability: &str) -> Option<Vec<String>> {
        self.calls()
            .into_iter()
            .find(|flags| flags.first().map(String::as_str) == Some(capability))
    }
}

impl CompilerRunner for FakeCompiler {
    fn run(
        &self,
        settings: &InvocationSettings,
        capability_flags: &[String],
        _text: &str,
    ) -> Result<String, AccessorError> {
        self.calls.lock().unwrap().push(capability_flags.to_vec());

        match &self.output {
            Some(output) => Ok(output.clone()),
            None => Err(AccessorError::ExecutableNotFound(settings.executable.clone())),
        }
    }
}

pub fn create_test_accessor(compiler: FakeCompiler) -> Arc<CliAccessor<FakeCompiler, RealFs>> {
    Arc::new(CliAccessor::new(compiler, RealFs))
}

pub fn create_initialize_request(id: i64) -> Request {
    create_initialize_request_with_options(id, Value::Null)
}

pub fn create_initialize_request_with_options(id: i64, options: Value) -> Request {
    Request::build("initialize")
        .params(json!({
            "capabilities": {},
            "initializationOptions": options,
        }))
        .id(id)
        .finish()
}

pub fn create_initialized_notification() -> Request {
    Request::build("initialized").params(json!({})).finish()
}

pub fn create_did_open_notification(uri: &str, text: &str) -> Request {
    Request::build("textDocument/didOpen")
        .params(json!({
            "textDocument": {
                "uri": uri,
                "languageId": "fortran",
                "version": 1,
                "text": text,
            }
        }))
        .finish()
}

pub fn create_did_change_notification(uri: &str, version: i32, text: &str) -> Request {
    Request::build("textDocument/didChange")
        .params(json!({
            "textDocument": { "uri": uri, "version": version },
            "contentChanges": [{ "text": text }],
        }))
        .finish()
}

pub fn create_did_change_configuration_notification(settings: Value) -> Request {
    Request::build("workspace/didChangeConfiguration")
        .params(json!({ "settings": settings }))
        .finish()
}

pub fn create_document_symbol_request(id: i64, uri: &str) -> Request {
    Request::build("textDocument/documentSymbol")
        .params(json!({ "textDocument": { "uri": uri } }))
        .id(id)
        .finish()
}

pub fn create_definition_request(id: i64, uri: &str, line: u32, character: u32) -> Request {
    Request::build("textDocument/definition")
        .params(json!({
            "textDocument": { "uri": uri },
            "position": { "line": line, "character": character },
        }))
        .id(id)
        .finish()
}

pub fn create_rename_request(
    id: i64,
    uri: &str,
    line: u32,
    character: u32,
    new_name: &str,
) -> Request {
    Request::build("textDocument/rename")
        .params(json!({
            "textDocument": { "uri": uri },
            "position": { "line": line, "character": character },
            "newName": new_name,
        }))
        .id(id)
        .finish()
}

/// Forwards everything the server sends to the client into a channel
pub fn spawn_notification_collector(mut socket: ClientSocket) -> mpsc::UnboundedReceiver<Request> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(request) = socket.next().await {
            if tx.send(request).is_err() {
                break;
            }
        }
    });

    rx
}

pub async fn wait_for_notification(
    rx: &mut mpsc::UnboundedReceiver<Request>,
    method: &str,
) -> Option<Request> {
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(request) = rx.recv().await {
            if request.method() == method {
                return Some(request);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}
