//! Document ingestion — turns an uploaded file into plain text suitable as
//! generator input. Text files pass through; PDFs go through `pdf-extract`.

use axum::{extract::Multipart, Json};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub filename: String,
    pub characters: usize,
    pub text: String,
}

/// POST /api/v1/ingest — multipart upload, first file field wins.
pub async fn handle_ingest(mut multipart: Multipart) -> Result<Json<IngestResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;

        let text = extract_text(&filename, &bytes)?;
        info!(
            "Ingested '{filename}' ({} bytes, {} chars of text)",
            bytes.len(),
            text.chars().count()
        );
        return Ok(Json(IngestResponse {
            characters: text.chars().count(),
            filename,
            text,
        }));
    }

    Err(AppError::Validation(
        "No file found in the upload".to_string(),
    ))
}

fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, AppError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let text = match extension.as_str() {
        "txt" | "md" => String::from_utf8_lossy(bytes).into_owned(),
        "pdf" => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| AppError::Validation(format!("Could not extract text from PDF: {e}")))?,
        other => {
            return Err(AppError::Validation(format!(
                "Unsupported file type '.{other}' (expected .txt, .md, or .pdf)"
            )))
        }
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Validation(
            "The file contained no extractable text".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_file_passes_through() {
        let text = extract_text("notes.txt", b"Cells divide by mitosis.").unwrap();
        assert_eq!(text, "Cells divide by mitosis.");
    }

    #[test]
    fn test_markdown_passes_through() {
        let text = extract_text("notes.md", b"# Mitosis\nCells divide.").unwrap();
        assert!(text.starts_with("# Mitosis"));
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let result = extract_text("slides.pptx", b"whatever");
        let Err(AppError::Validation(msg)) = result else {
            panic!("expected validation error");
        };
        assert!(msg.contains(".pptx"));
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(matches!(
            extract_text("empty.txt", b"   \n  "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_fatal() {
        let text = extract_text("notes.txt", &[0x48, 0x69, 0xFF, 0x21]).unwrap();
        assert!(text.starts_with("Hi"));
    }
}
