//! Upload type gate.

use std::path::Path;

/// Upload extensions accepted by the source adapter.
pub const SUPPORTED_UPLOAD_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Whether an uploaded file name carries one of the accepted extensions.
/// Case is ignored.
pub fn is_supported_upload(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|ext| SUPPORTED_UPLOAD_EXTENSIONS.contains(&ext.as_str()))
}
