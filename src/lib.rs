//! Language server bridging LSP editors and the LFortran batch compiler.
//!
//! - [`accessor`]: one-shot compiler runs and translation of their JSON output
//! - [`lsp`]: the `tower-lsp` server wrapping the accessor
//! - [`config`]: settings validation and data paths
//! - [`log`]: tracing setup

pub mod accessor;
pub mod config;
pub mod log;
pub mod lsp;
