//! Checks applied to a selected file before any decoding or network traffic.

use crate::asset::ImageAsset;
use crate::error::ClientError;

pub const ACCEPTED_MIME_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// 5 MB upload ceiling.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub fn validate_upload(asset: &ImageAsset) -> Result<(), ClientError> {
    if !ACCEPTED_MIME_TYPES.contains(&asset.mime_type.as_str()) {
        return Err(ClientError::Validation(
            "Invalid file type. Please upload a JPEG or PNG image.".to_string(),
        ));
    }

    if asset.size() > MAX_UPLOAD_BYTES {
        return Err(ClientError::Validation(
            "File is too large. Please upload an image smaller than 5MB.".to_string(),
        ));
    }

    Ok(())
}
