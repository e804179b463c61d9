use std::path::PathBuf;
use thiserror::Error;

/// Errors writing to the order spreadsheet.
#[derive(Error, Debug)]
pub enum SheetsError {
    /// Spreadsheet id or credentials are not configured.
    #[error("Google Sheets is not configured: {0}")]
    NotConfigured(&'static str),

    /// The credentials file could not be read.
    #[error("Failed to read credentials from {path}: {source}")]
    CredentialsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The credentials file is not a service account key.
    #[error("Invalid service account key: {0}")]
    InvalidCredentials(String),

    /// Signing the token request or exchanging it failed.
    #[error("Failed to authenticate with Google Sheets API: {0}")]
    Auth(String),

    /// Failed to send a request.
    #[error("Request failed: {0}")]
    Request(String),

    /// Google answered with an error.
    #[error("Google Sheets API error ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Google answered with something we could not use.
    #[error("Invalid Google Sheets response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for SheetsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SheetsError::InvalidResponse(e.to_string())
        } else {
            SheetsError::Request(e.to_string())
        }
    }
}

/// Message from a Google API error body (`{"error": {"message": ...}}`).
pub(crate) fn google_error_message(body: &str, status: u16) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            let error = v.get("error")?;
            error
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| v.get("error_description").and_then(|m| m.as_str()))
                .or_else(|| error.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("request failed with status {status}"))
}
