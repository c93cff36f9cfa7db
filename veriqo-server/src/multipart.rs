//! Multipart form parsing for image uploads

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::ApiError;
use crate::validation::{validate_file_size, validate_image_content_type};

/// Name of the multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// An image uploaded via multipart form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// File data bytes
    pub data: Bytes,
    /// Content-Type from the multipart field
    pub content_type: String,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

impl ImageUpload {
    /// Read the `file` field from a multipart request
    ///
    /// The declared Content-Type is checked before the body is read, so a
    /// non-image upload is rejected without buffering it. Other fields are
    /// skipped, as are any `file` fields after the first.
    pub async fn from_multipart(
        multipart: &mut Multipart,
        max_file_size: usize,
    ) -> Result<Self, ApiError> {
        let mut upload: Option<ImageUpload> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            if field.name() != Some(FILE_FIELD) || upload.is_some() {
                continue;
            }

            let content_type = field.content_type().map(|s| s.to_string());
            validate_image_content_type(content_type.as_deref())?;
            let file_name = field.file_name().map(|s| s.to_string());

            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?;

            validate_file_size(data.len(), max_file_size)?;

            upload = Some(ImageUpload {
                data,
                // Validated above
                content_type: content_type.unwrap_or_default(),
                file_name,
            });
        }

        upload.ok_or_else(|| {
            ApiError::bad_request("No file provided. Use 'file' field in multipart form.")
        })
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::FromRequest, http::Request};

    const BOUNDARY: &str = "----UnitBoundary";

    fn multipart_request(parts: &[(&str, Option<&str>, Option<&str>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, file_name, content_type, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            let disposition = match file_name {
                Some(f) => format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, f
                ),
                None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", name),
            };
            body.extend_from_slice(disposition.as_bytes());
            if let Some(ct) = content_type {
                body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn parse(request: Request<Body>, max: usize) -> Result<ImageUpload, ApiError> {
        let mut multipart = Multipart::from_request(request, &()).await.unwrap();
        ImageUpload::from_multipart(&mut multipart, max).await
    }

    #[tokio::test]
    async fn test_reads_image_field() {
        let request = multipart_request(&[
            ("note", None, None, &b"ignored"[..]),
            ("file", Some("cat.png"), Some("image/png"), &b"\x89PNG"[..]),
        ]);
        let upload = parse(request, 1024).await.unwrap();

        assert_eq!(upload.file_name.as_deref(), Some("cat.png"));
        assert_eq!(upload.content_type, "image/png");
        assert_eq!(upload.size(), 4);
    }

    #[tokio::test]
    async fn test_rejects_non_image() {
        let request = multipart_request(&[(
            "file",
            Some("doc.pdf"),
            Some("application/pdf"),
            &b"%PDF"[..],
        )]);
        assert!(matches!(
            parse(request, 1024).await,
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_missing_file() {
        let request = multipart_request(&[("note", None, None, &b"hello"[..])]);
        assert!(parse(request, 1024).await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_oversized_file() {
        let request = multipart_request(&[("file", Some("big.jpg"), Some("image/jpeg"), &[0u8; 64][..])]);
        assert!(matches!(
            parse(request, 16).await,
            Err(ApiError::PayloadTooLarge(_))
        ));
    }
}
