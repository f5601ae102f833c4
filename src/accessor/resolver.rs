//! Maps filenames reported by the compiler back to document URIs

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::Url;

use crate::accessor::runner::TEMP_FILE_SUFFIX;

static FILE_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^file:(?://)?").expect("file scheme pattern is valid"));

/// Filesystem queries needed for path resolution
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    fn is_file(&self, path: &Path) -> bool;

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// [`Filesystem`] backed by `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl Filesystem for RealFs {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }
}

/// Extracts include directories from compiler flags, in order.
/// Accepts both `-I<dir>` and `-I <dir>`.
pub fn include_dirs(flags: &[String]) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut flags = flags.iter();

    while let Some(flag) = flags.next() {
        match flag.strip_prefix("-I") {
            Some("") => {
                if let Some(dir) = flags.next() {
                    dirs.push(PathBuf::from(dir));
                }
            }
            Some(dir) => dirs.push(PathBuf::from(dir)),
            None => {}
        }
    }

    dirs
}

/// Removes a leading `file:` or `file://` from a reported filename.
pub fn strip_file_scheme(filename: &str) -> &str {
    match FILE_SCHEME.find(filename) {
        Some(m) => &filename[m.end()..],
        None => filename,
    }
}

/// Resolves filenames for one capability call.
///
/// The memo lives exactly as long as the resolver, which callers construct
/// fresh per call: a resolution is only valid for one include-flag set.
pub struct PathResolver<'a, F: Filesystem> {
    document_uri: &'a Url,
    include_dirs: Vec<PathBuf>,
    memo: HashMap<String, PathBuf>,
    fs: &'a F,
}

impl<'a, F: Filesystem> PathResolver<'a, F> {
    pub fn new(document_uri: &'a Url, flags: &[String], fs: &'a F) -> Self {
        Self {
            document_uri,
            include_dirs: include_dirs(flags),
            memo: HashMap::new(),
            fs,
        }
    }

    /// Resolves a reported filename; `None` stands for the document itself.
    pub fn resolve_reported(&mut self, filename: Option<&str>) -> Url {
        match filename {
            Some(filename) => self.resolve(filename),
            None => self.document_uri.clone(),
        }
    }

    /// Resolves a reported filename to a URI. Unresolvable names come back
    /// as a best-effort `file:` URI rather than an error; relative ones are
    /// anchored at the current working directory.
    pub fn resolve(&mut self, filename: &str) -> Url {
        if filename.ends_with(TEMP_FILE_SUFFIX) {
            return self.document_uri.clone();
        }

        if let Some(resolved) = self.memo.get(filename) {
            return self.path_to_uri(resolved);
        }

        let path = Path::new(strip_file_scheme(filename));

        if self.fs.is_file(path) {
            let resolved = self.canonicalize(path);
            return self.path_to_uri(&resolved);
        }

        for dir in &self.include_dirs {
            let candidate = dir.join(path);
            if self.fs.is_file(&candidate) {
                let resolved = self.canonicalize(&candidate);
                self.memo.insert(filename.to_string(), resolved.clone());
                return self.path_to_uri(&resolved);
            }
        }

        self.path_to_uri(path)
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        self.fs
            .canonicalize(path)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    fn path_to_uri(&self, path: &Path) -> Url {
        // Relative leftovers stay relative to the working directory the
        // compiler ran in, never to the filesystem root.
        let absolute = if path.is_relative() {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(path),
                Err(_) => return self.document_uri.clone(),
            }
        } else {
            path.to_path_buf()
        };

        Url::from_file_path(&absolute).unwrap_or_else(|_| self.document_uri.clone())
    }
}
