//! Conversion from `file://` URIs to UTF-8 paths.

use camino::Utf8PathBuf;
use url::Url;

/// Converts a `file://` URI to a path, percent-decoding it.
///
/// URIs the `url` crate cannot turn into a local path fall back to the text
/// after `file://`, or the whole URI.
#[must_use]
pub fn uri_to_path(uri: &str) -> Utf8PathBuf {
    if let Some(path) = parse_file_uri(uri) {
        return path;
    }
    uri.strip_prefix("file://")
        .map_or_else(|| Utf8PathBuf::from(uri), Utf8PathBuf::from)
}

fn parse_file_uri(uri: &str) -> Option<Utf8PathBuf> {
    let url = Url::parse(uri).ok()?;
    let path = url.to_file_path().ok()?;
    Utf8PathBuf::try_from(path).ok()
}
