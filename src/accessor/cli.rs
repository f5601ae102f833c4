//! [`Accessor`] implementation driving the LFortran command line

use tower_lsp::lsp_types::{
    Diagnostic, Location, LocationLink, Position, SymbolInformation, TextEdit, Url,
};
use tracing::debug;

use crate::accessor::Accessor;
use crate::accessor::outcome::Outcome;
use crate::accessor::position::{to_compiler_position, to_lsp_range};
use crate::accessor::resolver::{Filesystem, PathResolver, RealFs};
use crate::accessor::response::{
    self, DiagnosticsReport, LookupRecord, RenameRecord, SymbolRecord, diagnostic_severity,
    symbol_kind,
};
use crate::accessor::runner::{CompilerRunner, ProcessRunner};
use crate::config::InvocationSettings;

/// `source` of every published diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "lfortran";

const CONTINUE_COMPILATION: &str = "--continue-compilation";

pub struct CliAccessor<R = ProcessRunner, F = RealFs> {
    runner: R,
    fs: F,
}

impl Default for CliAccessor {
    fn default() -> Self {
        Self::new(ProcessRunner::default(), RealFs)
    }
}

impl<R: CompilerRunner, F: Filesystem> CliAccessor<R, F> {
    pub fn new(runner: R, fs: F) -> Self {
        Self { runner, fs }
    }

    /// Runs the compiler, substituting `default_output` when it cannot be
    /// run. With `empty_is_success`, blank output also completes with
    /// `default_output`.
    pub fn invoke(
        &self,
        settings: &InvocationSettings,
        capability_flags: &[String],
        text: &str,
        default_output: &str,
        empty_is_success: bool,
    ) -> Outcome<String> {
        match self.runner.run(settings, capability_flags, text) {
            Ok(output) if empty_is_success && output.trim().is_empty() => {
                Outcome::Complete(default_output.to_string())
            }
            Ok(output) => Outcome::Complete(output),
            Err(reason) => {
                debug!("compiler run failed: {}", reason);
                Outcome::degraded(default_output.to_string(), reason)
            }
        }
    }
}

fn flags(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[allow(deprecated)]
fn symbol_information(name: String, kind: u32, location: Location) -> SymbolInformation {
    SymbolInformation {
        name,
        kind: symbol_kind(kind),
        tags: None,
        deprecated: None,
        location,
        container_name: None,
    }
}

/// Capability flag plus the 1-based cursor the compiler expects
fn cursor_flags(capability: &str, position: Position) -> Vec<String> {
    let (line, column) = to_compiler_position(position);
    vec![
        capability.to_string(),
        format!("--line={}", line),
        format!("--column={}", column),
        CONTINUE_COMPILATION.to_string(),
    ]
}

impl<R: CompilerRunner, F: Filesystem> Accessor for CliAccessor<R, F> {
    fn version(&self, settings: &InvocationSettings) -> Outcome<String> {
        self.invoke(settings, &flags(&["--version"]), "", "", false)
    }

    fn show_document_symbols(
        &self,
        uri: &Url,
        text: &str,
        settings: &InvocationSettings,
    ) -> Outcome<Vec<SymbolInformation>> {
        let capability_flags = flags(&["--show-document-symbols", CONTINUE_COMPILATION]);

        self.invoke(settings, &capability_flags, text, "[]", false)
            .and_then(|raw| response::parse::<Vec<SymbolRecord>>(&raw, "show_document_symbols"))
            .map(|records| {
                let mut resolver = PathResolver::new(uri, &settings.flags, &self.fs);

                let symbols: Vec<SymbolInformation> = records
                    .into_iter()
                    .map(|record| {
                        let location = Location::new(
                            resolver.resolve_reported(record.reported_file()),
                            to_lsp_range(record.location.range),
                        );
                        symbol_information(record.name, record.kind, location)
                    })
                    .collect();

                debug!("{} symbols for {}", symbols.len(), uri);
                symbols
            })
    }

    fn lookup_name(
        &self,
        uri: &Url,
        text: &str,
        position: Position,
        settings: &InvocationSettings,
    ) -> Outcome<Vec<LocationLink>> {
        let capability_flags = cursor_flags("--lookup-name", position);

        self.invoke(settings, &capability_flags, text, "[]", false)
            .and_then(|raw| response::parse::<Vec<LookupRecord>>(&raw, "lookup_name"))
            .map(|records| {
                let mut resolver = PathResolver::new(uri, &settings.flags, &self.fs);

                records
                    .into_iter()
                    .map(|record| {
                        let range = to_lsp_range(record.location.range);
                        LocationLink {
                            origin_selection_range: None,
                            target_uri: resolver.resolve_reported(record.filename.as_deref()),
                            target_range: range,
                            target_selection_range: range,
                        }
                    })
                    .collect()
            })
    }

    fn show_errors(
        &self,
        uri: &Url,
        text: &str,
        settings: &InvocationSettings,
    ) -> Outcome<Vec<Diagnostic>> {
        let capability_flags = flags(&["--show-errors", CONTINUE_COMPILATION]);

        self.invoke(settings, &capability_flags, text, "{}", true)
            .and_then(|raw| response::parse::<DiagnosticsReport>(&raw, "show_errors"))
            .map(|report| {
                let diagnostics: Vec<Diagnostic> =
                    response::truncate_diagnostics(report, settings.max_diagnostics)
                        .into_iter()
                        .map(|record| Diagnostic {
                            range: to_lsp_range(record.range),
                            severity: record.severity.and_then(diagnostic_severity),
                            source: Some(DIAGNOSTIC_SOURCE.to_string()),
                            message: record.message,
                            ..Default::default()
                        })
                        .collect();

                debug!("{} diagnostics for {}", diagnostics.len(), uri);
                diagnostics
            })
    }

    fn rename_symbol(
        &self,
        _uri: &Url,
        text: &str,
        position: Position,
        new_name: &str,
        settings: &InvocationSettings,
    ) -> Outcome<Vec<TextEdit>> {
        let capability_flags = cursor_flags("--rename-symbol", position);

        self.invoke(settings, &capability_flags, text, "[]", false)
            .and_then(|raw| response::parse::<Vec<RenameRecord>>(&raw, "rename_symbol"))
            .map(|records| {
                records
                    .into_iter()
                    .filter_map(|record| record.location)
                    .map(|location| {
                        TextEdit::new(to_lsp_range(location.range), new_name.to_string())
                    })
                    .collect()
            })
    }
}
