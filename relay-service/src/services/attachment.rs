use crate::services::providers::EmailAttachment;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

pub const DEFAULT_FILE_NAME: &str = "posts.xlsx";

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Attachment payload is empty")]
    Empty,

    #[error("Attachment is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
}

/// Decode the dashboard's base64 spreadsheet. Data URLs
/// (`data:<mime>;base64,<payload>`) and embedded line breaks are accepted.
pub fn decode_payload(encoded: &str) -> Result<Vec<u8>, AttachmentError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(AttachmentError::Empty);
    }

    Ok(STANDARD.decode(compact)?)
}

pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

/// Build the MIME attachment from the request fields.
pub fn spreadsheet(encoded: &str, file_name: Option<&str>) -> Result<EmailAttachment, AttachmentError> {
    let bytes = decode_payload(encoded)?;
    let file_name = file_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FILE_NAME)
        .to_string();

    Ok(EmailAttachment {
        content_type: content_type_for(&file_name).to_string(),
        file_name,
        bytes,
    })
}
