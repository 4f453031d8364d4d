//! Camera snapshots.
//!
//! A [`CameraSession`] owns the device stream for as long as it lives. The
//! stream is stopped after every capture and when the session is dropped, so
//! retaking a photo means opening a new session.

use super::CaptureSource;
use crate::asset::ImageAsset;
use crate::error::{CameraError, ClientError};
use crate::normalizer::{encode_jpeg, JPEG_MIME_TYPE};
use async_trait::async_trait;
use image::{imageops, RgbImage};

pub const CAPTURE_FILE_NAME: &str = "capture.jpg";

/// Snapshot quality, higher than the upload re-encode since it is re-encoded again.
pub const CAPTURE_JPEG_QUALITY: u8 = 95;

/// A user-facing camera driver.
pub trait CameraDevice: Send {
    /// Acquire the device. Fails with [`CameraError::Unavailable`] when it is busy.
    fn start(&mut self) -> Result<(), CameraError>;
    fn grab_frame(&mut self) -> Result<RgbImage, CameraError>;
    /// Release the device. Must be safe to call when already stopped.
    fn stop(&mut self);
    fn is_streaming(&self) -> bool;
}

pub struct CameraSession {
    device: Box<dyn CameraDevice>,
}

impl CameraSession {
    pub fn open(mut device: Box<dyn CameraDevice>) -> Result<Self, ClientError> {
        device.start().map_err(|e| {
            tracing::warn!(error = %e, "Failed to start camera");
            ClientError::Camera(e)
        })?;
        tracing::debug!("Camera stream started");
        Ok(Self { device })
    }

    pub fn is_streaming(&self) -> bool {
        self.device.is_streaming()
    }

    /// Take one mirrored snapshot and stop the stream.
    pub fn take_photo(&mut self) -> Result<ImageAsset, ClientError> {
        if !self.device.is_streaming() {
            return Err(CameraError::NotStreaming.into());
        }

        let frame = self.device.grab_frame();
        self.stop();
        let frame = frame?;

        // Match the mirrored preview the user sees.
        let mirrored = imageops::flip_horizontal(&frame);
        let bytes = encode_jpeg(&mirrored, CAPTURE_JPEG_QUALITY)
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        Ok(ImageAsset {
            file_name: CAPTURE_FILE_NAME.to_string(),
            mime_type: JPEG_MIME_TYPE.to_string(),
            bytes,
            dimensions: Some(mirrored.dimensions()),
        })
    }

    pub fn stop(&mut self) {
        if self.device.is_streaming() {
            self.device.stop();
            tracing::debug!("Camera stream stopped");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl CaptureSource for CameraSession {
    async fn capture(&mut self) -> Result<ImageAsset, ClientError> {
        self.take_photo()
    }
}
