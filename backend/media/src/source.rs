//! Image source adapter.
//!
//! A user interaction may carry a camera capture, a file upload, both, or
//! neither. Exactly one image comes out: the capture wins, the upload is the
//! fallback, and an empty interaction yields nothing.

use std::path::Path;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::mime_detect::{is_supported_upload, SUPPORTED_UPLOAD_EXTENSIONS};

/// Where an image came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    Camera,
    Upload { filename: String },
}

/// A file received through the upload affordance.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

/// Undecoded image bytes selected for this interaction.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub origin: ImageOrigin,
    pub data: Bytes,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("unsupported file type for \"{filename}\" (accepted: {accepted})")]
    UnsupportedFormat { filename: String, accepted: String },
}

/// Pick the image for this interaction.
///
/// Browsers submit an empty part for an untouched file input, so empty
/// payloads count as absent.
pub fn select_source(
    camera: Option<Bytes>,
    upload: Option<UploadedFile>,
) -> Result<Option<RawImage>, SourceError> {
    if let Some(data) = camera.filter(|d| !d.is_empty()) {
        debug!(bytes = data.len(), "Using camera capture");
        return Ok(Some(RawImage {
            origin: ImageOrigin::Camera,
            data,
        }));
    }

    let Some(upload) = upload.filter(|u| !u.data.is_empty()) else {
        return Ok(None);
    };

    if !is_supported_upload(Path::new(&upload.filename)) {
        return Err(SourceError::UnsupportedFormat {
            filename: upload.filename,
            accepted: SUPPORTED_UPLOAD_EXTENSIONS.join(", "),
        });
    }

    debug!(filename = %upload.filename, bytes = upload.data.len(), "Using uploaded file");
    Ok(Some(RawImage {
        origin: ImageOrigin::Upload {
            filename: upload.filename,
        },
        data: upload.data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, data: &'static [u8]) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            data: Bytes::from_static(data),
        }
    }

    #[test]
    fn nothing_provided_yields_nothing() {
        assert_eq!(select_source(None, None).unwrap().map(|r| r.origin), None);
    }

    #[test]
    fn empty_parts_count_as_absent() {
        let picked = select_source(Some(Bytes::new()), Some(upload("", b""))).unwrap();
        assert!(picked.is_none());
    }

    #[test]
    fn camera_wins_over_upload() {
        let picked = select_source(Some(Bytes::from_static(b"cam")), Some(upload("a.png", b"up")))
            .unwrap()
            .unwrap();
        assert_eq!(picked.origin, ImageOrigin::Camera);
        assert_eq!(&picked.data[..], b"cam");
    }

    #[test]
    fn falls_back_to_upload() {
        let picked = select_source(None, Some(upload("reef.jpeg", b"up"))).unwrap().unwrap();
        assert_eq!(
            picked.origin,
            ImageOrigin::Upload {
                filename: "reef.jpeg".into()
            }
        );
    }

    #[test]
    fn rejects_other_extensions() {
        let err = select_source(None, Some(upload("reef.gif", b"GIF89a"))).unwrap_err();
        assert!(err.to_string().contains("reef.gif"));
        assert!(err.to_string().contains("jpg, jpeg, png"));
    }
}
