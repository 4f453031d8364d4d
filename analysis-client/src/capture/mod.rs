//! Producers of raw photos: a file on disk or a live camera snapshot.

pub mod camera;
pub mod file;

use crate::asset::ImageAsset;
use crate::error::ClientError;
use async_trait::async_trait;

pub use camera::{CameraDevice, CameraSession};
pub use file::FileSource;

/// Something that yields one photo for the analysis pipeline.
#[async_trait]
pub trait CaptureSource: Send {
    async fn capture(&mut self) -> Result<ImageAsset, ClientError>;
}
