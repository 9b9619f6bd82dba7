use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::defaults::DEFAULT_WORKSPACE_STARTUP_FILE;

/// Locations of source files evaluated when a session initialises.
///
/// Whether either file actually runs is decided by the client through
/// `initializationOptions`; these settings only say where to look.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct StartupSettings {
    /// Absolute path of the global startup file, if one is configured.
    pub global_startup_file: Option<Utf8PathBuf>,
    /// File name looked up at the root of every workspace folder.
    pub workspace_startup_file: String,
}

impl Default for StartupSettings {
    fn default() -> Self {
        Self {
            global_startup_file: None,
            workspace_startup_file: DEFAULT_WORKSPACE_STARTUP_FILE.to_owned(),
        }
    }
}

impl StartupSettings {
    /// Returns the configured global startup file.
    #[must_use]
    pub fn global_startup_file(&self) -> Option<&Utf8Path> {
        self.global_startup_file.as_deref()
    }

    /// Resolves the startup file for a workspace folder.
    #[must_use]
    pub fn workspace_startup_file(&self, folder: &Utf8Path) -> Utf8PathBuf {
        folder.join(&self.workspace_startup_file)
    }
}
