use super::CaptureSource;
use crate::asset::ImageAsset;
use crate::error::ClientError;
use async_trait::async_trait;
use image::ImageFormat;
use std::path::{Path, PathBuf};

/// Reads a photo the user picked from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// MIME type from the content, falling back to the file extension.
pub fn detect_mime_type(bytes: &[u8], path: &Path) -> String {
    image::guess_format(bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

#[async_trait]
impl CaptureSource for FileSource {
    async fn capture(&mut self) -> Result<ImageAsset, ClientError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let mime_type = detect_mime_type(&bytes, &self.path);
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        tracing::debug!(file = %file_name, %mime_type, bytes = bytes.len(), "Read image from disk");

        Ok(ImageAsset::new(file_name, mime_type, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn content_wins_over_extension() {
        assert_eq!(detect_mime_type(&PNG_MAGIC, Path::new("face.jpg")), "image/png");
    }

    #[test]
    fn extension_is_the_fallback() {
        assert_eq!(detect_mime_type(b"???", Path::new("face.jpeg")), "image/jpeg");
        assert_eq!(
            detect_mime_type(b"???", Path::new("notes.txt")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let mut source = FileSource::new("/definitely/not/here.png");
        assert!(matches!(source.capture().await, Err(ClientError::Io(_))));
    }
}
