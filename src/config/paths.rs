//! Cross-platform application paths using the `dirs` crate.
//!
//! Config dir (`settings.toml`):
//!   Windows: %APPDATA%\vallex-studio\
//!   macOS:   ~/Library/Application Support/vallex-studio/
//!   Linux:   ~/.config/vallex-studio/
//!
//! Data dir (Whisper GGML files, BPE vocabulary):
//!   Windows: %LOCALAPPDATA%\vallex-studio\
//!   macOS:   ~/Library/Application Support/vallex-studio/
//!   Linux:   ~/.local/share/vallex-studio/

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    pub data_dir: PathBuf,
    /// Whisper GGML files and the BPE vocabulary.
    pub models_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "vallex-studio";

    /// Resolves all paths using the `dirs` crate, falling back to the current
    /// directory when the platform has no standard location.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self {
            settings_file: config_dir.join("settings.toml"),
            models_dir: data_dir.join("models"),
            config_dir,
            data_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths.models_dir.starts_with(&paths.data_dir));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths.config_dir.ends_with("vallex-studio"));
    }
}
