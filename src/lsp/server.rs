use anyhow::Context;
use tokio::net::TcpListener;
use tower_lsp::{LspService, Server};
use tracing::info;

use crate::lsp::backend::Backend;

/// How the server talks to the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    /// Serve the first client connecting to `host:port`
    Tcp { host: String, port: u16 },
}

pub async fn run_server(transport: Transport) -> anyhow::Result<()> {
    info!("Starting lfortran-lsp server over {:?}", transport);

    let (service, socket) = LspService::new(Backend::new);

    match transport {
        Transport::Stdio => {
            let stdin = tokio::io::stdin();
            let stdout = tokio::io::stdout();
            Server::new(stdin, stdout, socket).serve(service).await;
        }
        Transport::Tcp { host, port } => {
            let listener = TcpListener::bind((host.as_str(), port))
                .await
                .with_context(|| format!("binding {}:{}", host, port))?;
            info!("Listening on {}:{}", host, port);

            let (stream, peer) = listener
                .accept()
                .await
                .context("accepting client connection")?;
            info!("Client connected from {}", peer);

            let (read, write) = tokio::io::split(stream);
            Server::new(read, write, socket).serve(service).await;
        }
    }

    info!("lfortran-lsp server stopped");
    Ok(())
}
