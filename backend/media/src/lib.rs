//! Image intake for the analysis pipeline.
//!
//! `source` picks the one image a user interaction provides, `image` decodes
//! it and re-encodes it for transport to the inference API.

pub mod image;
pub mod mime_detect;
pub mod source;

pub use crate::image::{
    encode_for_transport, CapturedImage, MediaError, DEFAULT_JPEG_QUALITY, TRANSPORT_MEDIA_TYPE,
};
pub use mime_detect::{is_supported_upload, SUPPORTED_UPLOAD_EXTENSIONS};
pub use source::{select_source, ImageOrigin, RawImage, SourceError, UploadedFile};
