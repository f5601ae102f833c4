//! Compiler accessor layer
//!
//! Turns LSP requests into one-shot compiler runs and the compiler's JSON
//! back into LSP structures.
//!
//! - runner.rs: locates the executable and runs it on a temp copy of the buffer
//! - response.rs: typed decoding of the compiler's JSON
//! - resolver.rs: reported filename -> document URI
//! - position.rs: 1-based compiler coordinates <-> 0-based LSP coordinates
//! - cli.rs: per-capability adapters ([`CliAccessor`])
//! - outcome.rs: complete-or-degraded call results

pub mod cli;
pub mod error;
pub mod outcome;
pub mod position;
pub mod resolver;
pub mod response;
pub mod runner;

pub use cli::{CliAccessor, DIAGNOSTIC_SOURCE};
pub use error::AccessorError;
pub use outcome::Outcome;
pub use resolver::{Filesystem, PathResolver, RealFs};
pub use runner::{CompilerRunner, ProcessRunner};

use tower_lsp::lsp_types::{Diagnostic, LocationLink, Position, SymbolInformation, TextEdit, Url};

use crate::config::InvocationSettings;

/// Semantic queries answered by the compiler.
///
/// Every call is a synchronous round trip to an external process and never
/// fails outward: failures come back as a degraded [`Outcome`] holding an
/// empty result.
pub trait Accessor: Send + Sync {
    /// Raw output of `lfortran --version`
    fn version(&self, settings: &InvocationSettings) -> Outcome<String>;

    fn show_document_symbols(
        &self,
        uri: &Url,
        text: &str,
        settings: &InvocationSettings,
    ) -> Outcome<Vec<SymbolInformation>>;

    /// Definitions of the name under `position` (0-based)
    fn lookup_name(
        &self,
        uri: &Url,
        text: &str,
        position: Position,
        settings: &InvocationSettings,
    ) -> Outcome<Vec<LocationLink>>;

    fn show_errors(
        &self,
        uri: &Url,
        text: &str,
        settings: &InvocationSettings,
    ) -> Outcome<Vec<Diagnostic>>;

    /// Edits renaming the symbol under `position` (0-based) to `new_name`
    fn rename_symbol(
        &self,
        uri: &Url,
        text: &str,
        position: Position,
        new_name: &str,
        settings: &InvocationSettings,
    ) -> Outcome<Vec<TextEdit>>;
}
