//! `initialize` parameters the session acts on.

use camino::Utf8PathBuf;
use serde::Deserialize;
use serde_json::Value;

use crate::uri::uri_to_path;

/// Subset of the client's `initialize` parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct InitializeParams {
    pub(crate) capabilities: Value,
    workspace_folders: Option<Vec<WorkspaceFolder>>,
    root_uri: Option<String>,
    root_path: Option<String>,
    pub(crate) initialization_options: Option<InitializationOptions>,
}

#[derive(Debug, Deserialize)]
struct WorkspaceFolder {
    uri: String,
}

impl InitializeParams {
    /// Parses the request parameters; `null` means every field is absent.
    pub(crate) fn parse(params: Value) -> Result<Self, serde_json::Error> {
        if params.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(params)
    }

    /// Workspace roots from `workspaceFolders`, falling back to `rootUri`
    /// and then `rootPath`.
    pub(crate) fn workspace_roots(&self) -> Vec<Utf8PathBuf> {
        if let Some(folders) = self.workspace_folders.as_ref().filter(|f| !f.is_empty()) {
            return folders
                .iter()
                .map(|folder| uri_to_path(&folder.uri))
                .collect();
        }
        if let Some(uri) = &self.root_uri {
            return vec![uri_to_path(uri)];
        }
        self.root_path
            .as_deref()
            .map(|path| vec![Utf8PathBuf::from(path)])
            .unwrap_or_default()
    }

    pub(crate) fn options(&self) -> InitializationOptions {
        self.initialization_options.clone().unwrap_or_default()
    }
}

/// Server-specific `initializationOptions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct InitializationOptions {
    /// Inclusive `[first, last]` range for the coordination port.
    pub(crate) suggested_server_port_range: Option<(u16, u16)>,
    use_global_startup_file: Option<Flag>,
    use_workspace_startup_file: Option<Flag>,
}

impl InitializationOptions {
    pub(crate) fn use_global_startup_file(&self) -> bool {
        self.use_global_startup_file.as_ref().is_some_and(Flag::enabled)
    }

    pub(crate) fn use_workspace_startup_file(&self) -> bool {
        self.use_workspace_startup_file
            .as_ref()
            .is_some_and(Flag::enabled)
    }
}

/// Boolean option that some clients send as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn enabled(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Text(text) => text == "true",
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!({}), false)]
    #[case(json!({ "useGlobalStartupFile": true }), true)]
    #[case(json!({ "useGlobalStartupFile": "true" }), true)]
    #[case(json!({ "useGlobalStartupFile": "yes" }), false)]
    #[case(json!({ "useGlobalStartupFile": false }), false)]
    fn startup_flags_accept_bools_and_strings(#[case] options: Value, #[case] expected: bool) {
        let options: InitializationOptions =
            serde_json::from_value(options).expect("options parse");
        assert_eq!(options.use_global_startup_file(), expected);
        assert!(!options.use_workspace_startup_file());
    }

    #[rstest]
    #[case::folders(
        json!({
            "workspaceFolders": [{ "uri": "file:///a", "name": "a" }, { "uri": "file:///b", "name": "b" }],
            "rootUri": "file:///ignored",
        }),
        vec!["/a", "/b"]
    )]
    #[case::root_uri(json!({ "workspaceFolders": [], "rootUri": "file:///r" }), vec!["/r"])]
    #[case::root_path(json!({ "rootUri": null, "rootPath": "/p" }), vec!["/p"])]
    #[case::nothing(json!(null), vec![])]
    fn workspace_roots_fall_back_in_order(#[case] params: Value, #[case] expected: Vec<&str>) {
        let params = InitializeParams::parse(params).expect("params parse");
        let expected: Vec<Utf8PathBuf> = expected.into_iter().map(Utf8PathBuf::from).collect();
        assert_eq!(params.workspace_roots(), expected);
    }

    #[rstest]
    fn port_range_parses_from_pair() {
        let params = InitializeParams::parse(json!({
            "initializationOptions": { "suggestedServerPortRange": [57_110, 57_120] }
        }))
        .expect("params parse");
        assert_eq!(
            params.options().suggested_server_port_range,
            Some((57_110, 57_120))
        );
    }
}
