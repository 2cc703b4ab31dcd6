//! Capture form intake.
//!
//! Reads the multipart body posted by the page into its three fields.

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use bytes::Bytes;
use tracing::{debug, warn};

use finsight_media::UploadedFile;

pub const SESSION_FIELD: &str = "session_id";
pub const CAMERA_FIELD: &str = "camera";
pub const UPLOAD_FIELD: &str = "upload";

#[derive(Debug, Default)]
pub struct CaptureForm {
    pub session_id: Option<String>,
    pub camera: Option<Bytes>,
    pub upload: Option<UploadedFile>,
}

impl CaptureForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                SESSION_FIELD => form.session_id = Some(field.text().await?),
                CAMERA_FIELD => form.camera = Some(field.bytes().await?),
                UPLOAD_FIELD => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await?;
                    form.upload = Some(UploadedFile { filename, data });
                }
                other => warn!(field = %other, "Ignoring unknown form field"),
            }
        }

        debug!(
            camera = form.camera.as_ref().map_or(0, Bytes::len),
            upload = form.upload.as_ref().map_or(0, |u| u.data.len()),
            "Read capture form"
        );
        Ok(form)
    }
}
