//! Upload validation module
//!
//! Provides validation utilities for multipart image uploads.

use crate::error::ApiError;

/// MIME prefix every upload must carry
const IMAGE_MIME_PREFIX: &str = "image/";

/// Fixed message returned when the upload is not an image
pub const NOT_AN_IMAGE_MESSAGE: &str = "Please upload an image file";

/// Validates the declared Content-Type of an uploaded file
///
/// Accepts any `image/*` type, case-insensitively. A missing Content-Type is
/// rejected.
pub fn validate_image_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) if ct.to_ascii_lowercase().starts_with(IMAGE_MIME_PREFIX) => Ok(()),
        _ => Err(ApiError::bad_request(NOT_AN_IMAGE_MESSAGE)),
    }
}

/// Validates the size of an uploaded file
///
/// Returns an error if the file exceeds the maximum size.
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        let actual_mb = size / (1024 * 1024);
        Err(ApiError::payload_too_large(format!(
            "File too large: {} MB exceeds maximum of {} MB",
            actual_mb, max_mb
        )))
    } else {
        Ok(())
    }
}
