use std::fs;
use std::path::Path;

use crate::error::{LogsaiError, Result};

/// 100MB, the upload ceiling.
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Log,
    Text,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            "log" => Some(DocumentKind::Log),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

/// Reads an uploaded file into plain text.
///
/// Size is checked from metadata before anything is read. Only `.log` and
/// `.txt` are decoded here; PDF and DOCX must be extracted upstream.
pub fn read_document(path: &Path, max_bytes: u64) -> Result<String> {
    let kind = DocumentKind::from_path(path).ok_or_else(|| {
        LogsaiError::UnsupportedFormat(
            path.extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_else(|| "<none>".to_string()),
        )
    })?;

    let size = fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(LogsaiError::FileTooLarge {
            size,
            limit: max_bytes,
        });
    }

    let text = match kind {
        DocumentKind::Log | DocumentKind::Text => String::from_utf8(fs::read(path)?)
            .map_err(|_| LogsaiError::InvalidEncoding(path.to_path_buf()))?,
        DocumentKind::Pdf => return Err(LogsaiError::UnsupportedFormat("pdf".to_string())),
        DocumentKind::Docx => return Err(LogsaiError::UnsupportedFormat("docx".to_string())),
    };

    if text.trim().is_empty() {
        return Err(LogsaiError::EmptyDocument);
    }

    tracing::debug!(path = %path.display(), bytes = size, "read document");
    Ok(text)
}

/// Splits on `\n` and `\r\n`, keeping blank lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}
