//! Runs the compiler as a one-shot subprocess

use std::ffi::OsString;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::accessor::error::AccessorError;
use crate::config::InvocationSettings;

/// Bare command name searched on PATH
pub const EXECUTABLE_NAME: &str = "lfortran";

pub const TEMP_FILE_PREFIX: &str = "lfortran-lsp-";

/// Suffix of the materialized buffer. The compiler echoes the path back, so
/// the resolver treats any filename with this suffix as the document itself.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Executes the compiler against buffer text
#[cfg_attr(test, mockall::automock)]
pub trait CompilerRunner: Send + Sync {
    /// Runs the compiler over `text` and returns stdout and stderr merged
    /// into one string. A non-zero exit status is not an error.
    fn run(
        &self,
        settings: &InvocationSettings,
        capability_flags: &[String],
        text: &str,
    ) -> Result<String, AccessorError>;
}

/// [`CompilerRunner`] spawning a real process
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    search_path: Option<OsString>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::with_search_path(std::env::var_os("PATH"))
    }
}

impl ProcessRunner {
    /// Creates a runner that falls back to `search_path` instead of `$PATH`
    pub fn with_search_path(search_path: Option<OsString>) -> Self {
        Self { search_path }
    }

    /// Picks the executable to run: the configured path when it is a real
    /// executable file, otherwise `lfortran` from the search path.
    pub fn locate_executable(&self, configured: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) =
            configured.filter(|path| *path != Path::new(EXECUTABLE_NAME) && is_executable(path))
        {
            return Some(path.to_path_buf());
        }

        let search_path = self.search_path.as_ref()?;
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        which::which_in(EXECUTABLE_NAME, Some(search_path), cwd)
            .ok()
            .filter(|path| is_executable(path))
    }
}

impl CompilerRunner for ProcessRunner {
    fn run(
        &self,
        settings: &InvocationSettings,
        capability_flags: &[String],
        text: &str,
    ) -> Result<String, AccessorError> {
        let Some(executable) = self.locate_executable(settings.executable.as_deref()) else {
            debug!(
                "lfortran path {:?} is not executable and no fallback was found",
                settings.executable
            );
            return Err(AccessorError::ExecutableNotFound(settings.executable.clone()));
        };

        // Removed on drop, whichever way this function returns.
        let source = write_source(text)?;

        let args = build_args(capability_flags, &settings.flags, source.path());
        let command_line = render_command_line(&executable, &args);

        let output = run_merged(&executable, &args).map_err(|source| AccessorError::Io {
            command: command_line.clone(),
            source,
        })?;

        debug!("command = `{}`, output = {}", command_line, output);

        Ok(output)
    }
}

/// Argument vector in the order the compiler expects: capability flags,
/// configured flags, then the source file.
pub fn build_args(
    capability_flags: &[String],
    configured_flags: &[String],
    source: &Path,
) -> Vec<OsString> {
    capability_flags
        .iter()
        .chain(configured_flags)
        .map(OsString::from)
        .chain(std::iter::once(source.as_os_str().to_os_string()))
        .collect()
}

fn write_source(text: &str) -> Result<NamedTempFile, AccessorError> {
    let mut file = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .suffix(TEMP_FILE_SUFFIX)
        .tempfile()
        .map_err(AccessorError::TempFile)?;

    file.write_all(text.as_bytes())
        .and_then(|_| file.flush())
        .map_err(AccessorError::TempFile)?;

    Ok(file)
}

/// Runs to completion with stdout and stderr sharing one capture file, so the
/// two streams interleave as the process wrote them.
fn run_merged(executable: &Path, args: &[OsString]) -> std::io::Result<String> {
    let mut capture = tempfile::tempfile()?;
    let stdout = capture.try_clone()?;
    let stderr = capture.try_clone()?;

    let status = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .status()?;

    if !status.success() {
        debug!("{} exited with {}", executable.display(), status);
    }

    capture.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    capture.read_to_end(&mut bytes)?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn render_command_line(executable: &Path, args: &[OsString]) -> String {
    std::iter::once(executable.as_os_str())
        .chain(args.iter().map(OsString::as_os_str))
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
