use std::path::Path;

/// An image travelling through the pipeline.
///
/// Built by a capture source, replaced once by the normalizer, then consumed by
/// the submission client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Pixel size, known once the image has been decoded.
    pub dimensions: Option<(u32, u32)>,
}

impl ImageAsset {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
            dimensions: None,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Swap the extension for `.jpg`, keeping the stem (`face.png` → `face.jpg`).
pub fn jpeg_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");
    format!("{}.jpg", stem)
}
