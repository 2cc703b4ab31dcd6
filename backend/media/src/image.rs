//! Decoding of selected images and their transport encoding.
//!
//! Whatever the source format, the payload sent to the inference API is a
//! baseline JPEG in base64 so the declared media type never varies.

use ::image::codecs::jpeg::JpegEncoder;
use ::image::{DynamicImage, ImageError, ImageFormat};
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use finsight_core::EncodedImagePayload;

use crate::source::{ImageOrigin, RawImage};

/// Media type of every transport payload.
pub const TRANSPORT_MEDIA_TYPE: &str = "image/jpeg";

pub const DEFAULT_JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("could not decode image: {0}")]
    Decode(#[source] ImageError),

    #[error("could not encode image: {0}")]
    Encode(#[source] ImageError),
}

/// A decoded still image, held for one analysis cycle.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pixels: DynamicImage,
    origin: ImageOrigin,
    original: Bytes,
    format: ImageFormat,
}

impl CapturedImage {
    /// Decode the selected bytes. Malformed input fails here, before any
    /// remote call is made.
    pub fn decode(raw: RawImage) -> Result<Self, MediaError> {
        let format = ::image::guess_format(&raw.data).map_err(MediaError::Decode)?;
        let pixels =
            ::image::load_from_memory_with_format(&raw.data, format).map_err(MediaError::Decode)?;
        debug!(
            width = pixels.width(),
            height = pixels.height(),
            format = ?format,
            "Decoded captured image"
        );
        Ok(Self {
            pixels,
            origin: raw.origin,
            original: raw.data,
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn origin(&self) -> &ImageOrigin {
        &self.origin
    }

    /// Media type of the bytes as received.
    pub fn source_media_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Data URI of the original bytes, for showing the image back to the user.
    pub fn preview_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.source_media_type(),
            general_purpose::STANDARD.encode(&self.original)
        )
    }
}

/// Re-encode to JPEG at `quality` and wrap as a base64 payload.
///
/// Alpha is dropped. Output is stable for identical pixels and settings on
/// one build of the encoder.
pub fn encode_for_transport(
    image: &CapturedImage,
    quality: u8,
) -> Result<EncodedImagePayload, MediaError> {
    let rgb = image.pixels.to_rgb8();
    let mut buffer = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        encoder.encode_image(&rgb).map_err(MediaError::Encode)?;
    }
    debug!(jpeg_bytes = buffer.len(), quality, "Encoded image for transport");
    Ok(EncodedImagePayload::new(
        TRANSPORT_MEDIA_TYPE,
        general_purpose::STANDARD.encode(&buffer),
    ))
}
