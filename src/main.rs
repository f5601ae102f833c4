use std::path::PathBuf;

use clap::Parser;

use lfortran_lsp::log::{self, LogSink};
use lfortran_lsp::lsp::server::{Transport, run_server};

/// Serves LSP requests with responses from LFortran.
#[derive(Debug, Parser)]
#[command(name = "lfortran-lsp", version, about)]
struct Cli {
    /// Listen on TCP instead of stdio
    #[arg(long)]
    tcp: bool,

    /// Address to bind with --tcp
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind with --tcp
    #[arg(long, default_value_t = 2087)]
    port: u16,

    /// Write logs to stderr instead of the log file
    #[arg(long, conflicts_with = "log_file")]
    log_stderr: bool,

    /// Log file path (defaults to the data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn transport(&self) -> Transport {
        if self.tcp {
            Transport::Tcp {
                host: self.host.clone(),
                port: self.port,
            }
        } else {
            Transport::Stdio
        }
    }

    fn log_sink(&self) -> LogSink {
        match (&self.log_file, self.log_stderr) {
            (_, true) => LogSink::Stderr,
            (Some(path), false) => LogSink::File(path.clone()),
            (None, false) => LogSink::default(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    log::init(cli.log_sink())?;
    run_server(cli.transport()).await
}
