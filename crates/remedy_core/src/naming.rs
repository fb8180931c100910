use std::path::Path;

/// Extension of the incident reports the user submits.
pub const SOURCE_EXTENSION: &str = ".json";
/// Extension of the script the pipeline writes back.
pub const RESULT_EXTENSION: &str = ".py";

/// Derives the result object name from the uploaded object name.
///
/// The signing service and the pipeline re-derive the same name on their side,
/// so the mapping is exact: a trailing `.json` is swapped for `.py`, anything
/// else simply gets `.py` appended.
pub fn derive_result_name(source_name: &str) -> String {
    let stem = source_name
        .strip_suffix(SOURCE_EXTENSION)
        .unwrap_or(source_name);
    format!("{stem}{RESULT_EXTENSION}")
}

/// Object name for a local file: its final path component.
pub fn source_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
