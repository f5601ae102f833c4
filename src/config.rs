use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

/// Section name under which the editor extension stores our settings
pub const CONFIGURATION_SECTION: &str = "LFortranLanguageServer";

/// Default cap on the number of diagnostics published per document
pub const DEFAULT_MAX_NUMBER_OF_PROBLEMS: usize = 100;

/// Returns the path to the data directory for lfortran-lsp.
/// Uses $XDG_DATA_HOME/lfortran-lsp if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/lfortran-lsp,
/// or ./lfortran-lsp if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("lfortran-lsp.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("lfortran-lsp")
}

/// Validated settings for a single compiler invocation.
///
/// Built once at the session boundary and handed to the accessor read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSettings {
    /// Configured compiler path. `None` means "search PATH".
    pub executable: Option<PathBuf>,
    /// Extra compiler flags, passed after the capability flags.
    pub flags: Vec<String>,
    /// Maximum number of diagnostics kept from a single run.
    pub max_diagnostics: usize,
}

impl Default for InvocationSettings {
    fn default() -> Self {
        Self {
            executable: None,
            flags: Vec::new(),
            max_diagnostics: DEFAULT_MAX_NUMBER_OF_PROBLEMS,
        }
    }
}

impl InvocationSettings {
    /// Parses client settings, accepting either the bare section or an object
    /// wrapping it under [`CONFIGURATION_SECTION`]. Malformed input falls back
    /// to defaults.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let section = value.get(CONFIGURATION_SECTION).unwrap_or(value);

        match serde_json::from_value::<ClientSettings>(section.clone()) {
            Ok(settings) => settings.into(),
            Err(e) => {
                warn!("Ignoring malformed settings {}: {}", section, e);
                Self::default()
            }
        }
    }
}

/// Settings as sent by the editor extension.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    pub compiler: CompilerSection,
    pub max_number_of_problems: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerSection {
    pub lfortran_path: Option<String>,
    pub flags: Vec<String>,
}

impl From<ClientSettings> for InvocationSettings {
    fn from(settings: ClientSettings) -> Self {
        let executable = settings
            .compiler
            .lfortran_path
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Self {
            executable,
            flags: settings.compiler.flags,
            max_diagnostics: settings
                .max_number_of_problems
                .unwrap_or(DEFAULT_MAX_NUMBER_OF_PROBLEMS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/lfortran-lsp"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.local/share/lfortran-lsp"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./lfortran-lsp"));
    }

    #[test]
    fn from_json_reads_bare_section() {
        let settings = InvocationSettings::from_json(&json!({
            "compiler": {
                "lfortranPath": "/opt/lfortran/bin/lfortran",
                "flags": ["-I/tmp/includes", "--fixed-form"]
            },
            "maxNumberOfProblems": 5
        }));

        assert_eq!(
            settings,
            InvocationSettings {
                executable: Some(PathBuf::from("/opt/lfortran/bin/lfortran")),
                flags: vec!["-I/tmp/includes".to_string(), "--fixed-form".to_string()],
                max_diagnostics: 5,
            }
        );
    }

    #[test]
    fn from_json_unwraps_configuration_section() {
        let settings = InvocationSettings::from_json(&json!({
            "LFortranLanguageServer": {
                "compiler": { "flags": ["-I/usr/include"] }
            }
        }));

        assert_eq!(settings.flags, vec!["-I/usr/include".to_string()]);
        assert_eq!(settings.executable, None);
        assert_eq!(settings.max_diagnostics, DEFAULT_MAX_NUMBER_OF_PROBLEMS);
    }

    #[test]
    fn from_json_treats_blank_path_as_absent() {
        let settings = InvocationSettings::from_json(&json!({
            "compiler": { "lfortranPath": "   " }
        }));

        assert_eq!(settings.executable, None);
    }

    #[test]
    fn from_json_falls_back_to_defaults_on_malformed_input() {
        let settings = InvocationSettings::from_json(&json!({
            "compiler": { "flags": "not-a-list" }
        }));

        assert_eq!(settings, InvocationSettings::default());
    }
}
