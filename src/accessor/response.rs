//! Typed views of the compiler's JSON output

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tower_lsp::lsp_types::{DiagnosticSeverity, SymbolKind};
use tracing::debug;

use crate::accessor::error::AccessorError;
use crate::accessor::outcome::Outcome;
use crate::accessor::position::CompilerRange;

/// Location carrying only a range; the file is implied by the record
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RangeLocation {
    pub range: CompilerRange,
}

/// Entry of `--show-document-symbols`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SymbolRecord {
    pub name: String,
    pub kind: u32,
    #[serde(default)]
    pub filename: Option<String>,
    pub location: SymbolLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SymbolLocation {
    #[serde(default)]
    pub uri: Option<String>,
    pub range: CompilerRange,
}

impl SymbolRecord {
    /// Reported file of the symbol. `None` means the file being compiled.
    pub fn reported_file(&self) -> Option<&str> {
        self.filename.as_deref().or(self.location.uri.as_deref())
    }
}

/// Entry of `--lookup-name`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LookupRecord {
    #[serde(default)]
    pub filename: Option<String>,
    pub location: RangeLocation,
}

/// Output of `--show-errors`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DiagnosticsReport {
    #[serde(default)]
    pub diagnostics: Vec<DiagnosticRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiagnosticRecord {
    pub message: String,
    #[serde(default)]
    pub severity: Option<u32>,
    pub range: CompilerRange,
}

/// Entry of `--rename-symbol`. Entries without a location are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenameRecord {
    #[serde(default)]
    pub location: Option<RangeLocation>,
}

/// Decodes raw compiler output into `T`. Never fails outward: malformed
/// output yields the empty shape tagged as degraded.
pub fn parse<T>(raw: &str, capability: &'static str) -> Outcome<T>
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_str::<T>(raw) {
        Ok(parsed) => Outcome::Complete(parsed),
        Err(source) => {
            debug!("{} failed to parse compiler output: {}", capability, source);
            Outcome::degraded(
                T::default(),
                AccessorError::MalformedOutput { capability, source },
            )
        }
    }
}

/// Keeps at most `cap` diagnostics, in emitted order.
pub fn truncate_diagnostics(report: DiagnosticsReport, cap: usize) -> Vec<DiagnosticRecord> {
    let mut diagnostics = report.diagnostics;
    diagnostics.truncate(cap);
    diagnostics
}

pub fn diagnostic_severity(value: u32) -> Option<DiagnosticSeverity> {
    match value {
        1 => Some(DiagnosticSeverity::ERROR),
        2 => Some(DiagnosticSeverity::WARNING),
        3 => Some(DiagnosticSeverity::INFORMATION),
        4 => Some(DiagnosticSeverity::HINT),
        _ => None,
    }
}

pub fn symbol_kind(value: u32) -> SymbolKind {
    match value {
        1 => SymbolKind::FILE,
        2 => SymbolKind::MODULE,
        3 => SymbolKind::NAMESPACE,
        4 => SymbolKind::PACKAGE,
        5 => SymbolKind::CLASS,
        6 => SymbolKind::METHOD,
        7 => SymbolKind::PROPERTY,
        8 => SymbolKind::FIELD,
        9 => SymbolKind::CONSTRUCTOR,
        10 => SymbolKind::ENUM,
        11 => SymbolKind::INTERFACE,
        12 => SymbolKind::FUNCTION,
        13 => SymbolKind::VARIABLE,
        14 => SymbolKind::CONSTANT,
        15 => SymbolKind::STRING,
        16 => SymbolKind::NUMBER,
        17 => SymbolKind::BOOLEAN,
        18 => SymbolKind::ARRAY,
        19 => SymbolKind::OBJECT,
        20 => SymbolKind::KEY,
        21 => SymbolKind::NULL,
        22 => SymbolKind::ENUM_MEMBER,
        23 => SymbolKind::STRUCT,
        24 => SymbolKind::EVENT,
        25 => SymbolKind::OPERATOR,
        26 => SymbolKind::TYPE_PARAMETER,
        _ => SymbolKind::VARIABLE,
    }
}
