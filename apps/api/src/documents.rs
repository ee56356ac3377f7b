//! Document text extraction for uploaded resumes.
//!
//! Best effort: layout is lost and text follows page/line order. A document
//! that yields no text at all is reported as an error rather than an empty
//! success.

use axum::extract::Multipart;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::errors::AppError;

/// Form field carrying the uploaded document.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Reads the `file` part of a multipart form. Other parts are ignored.
pub async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation("No file uploaded".to_string()))
}

/// Extracts plain text from a PDF on a blocking thread.
pub async fn extract_pdf_text(bytes: Bytes) -> Result<String, AppError> {
    let size = bytes.len();
    let unreadable = |cause: String| {
        warn!("PDF extraction failed for {size}-byte upload: {cause}");
        AppError::UnprocessableEntity("Could not read text from the uploaded PDF".to_string())
    };
    // pdf-extract can panic on malformed input; the join error absorbs it.
    let raw = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| unreadable(e.to_string()))?
        .map_err(|e| unreadable(e.to_string()))?;

    let text = normalize_whitespace(&raw);
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "The uploaded PDF contains no extractable text".to_string(),
        ));
    }
    debug!("Extracted {} chars from {size}-byte PDF", text.chars().count());
    Ok(text)
}

/// Collapses runs of whitespace within each line and drops blank lines.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keeps the name safe for use inside an object key.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "upload.pdf".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        let raw = "  Jane   Doe \n\n\tSoftware  Engineer\n   \nRust, Go ";
        assert_eq!(
            normalize_whitespace(raw),
            "Jane Doe\nSoftware Engineer\nRust, Go"
        );
    }

    #[test]
    fn test_normalize_whitespace_blank_input() {
        assert_eq!(normalize_whitespace(" \n \t\n"), "");
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_unprocessable() {
        let err = extract_pdf_text(Bytes::from_static(b"definitely not a pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("My Resume (v2).pdf"), "My_Resume__v2_.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\cv.pdf"), "cv.pdf");
        assert_eq!(sanitize_file_name(".."), "upload.pdf");
    }
}
