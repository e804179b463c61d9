//! Sheets API v4 client, limited to appending rows.

use crate::credentials::ServiceAccountKey;
use crate::error::google_error_message;
use crate::token::TokenProvider;
use crate::SheetsError;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use storefront_commerce::sheet::CellValue;
use tracing::{error, info};

/// Production API base.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Sheet (tab) rows are appended to when none is configured.
pub const DEFAULT_SHEET_NAME: &str = "Hoja 1";

/// Result of an append call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResult {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub table_range: Option<String>,
    #[serde(default)]
    pub updates: Option<AppendUpdates>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendUpdates {
    #[serde(default)]
    pub updated_range: Option<String>,
    #[serde(default)]
    pub updated_rows: Option<u32>,
}

impl AppendResult {
    /// Range the row landed in, e.g. `'Hoja 1'!A12:K12`.
    pub fn updated_range(&self) -> Option<&str> {
        self.updates.as_ref()?.updated_range.as_deref()
    }
}

/// Appends rows to one sheet of one spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    sheet_name: String,
    tokens: Arc<TokenProvider>,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: impl Into<String>, key: ServiceAccountKey) -> Result<Self, SheetsError> {
        let spreadsheet_id = spreadsheet_id.into();
        if spreadsheet_id.trim().is_empty() {
            return Err(SheetsError::NotConfigured("spreadsheet id is empty"));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        let tokens = Arc::new(TokenProvider::new(key, http.clone())?);
        Ok(Self {
            http,
            api_base: SHEETS_API_BASE.to_string(),
            spreadsheet_id,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            tokens,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = sheet_name.into();
        self
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Append one row after the last row with data.
    pub async fn append_row(&self, cells: &[CellValue]) -> Result<AppendResult, SheetsError> {
        let url = self.append_url()?;
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "values": [cells] }))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            let message = google_error_message(&body, status);
            error!(status, %message, "error appending data to Google Sheet");
            return Err(SheetsError::Rejected { status, message });
        }

        let result: AppendResult =
            serde_json::from_str(&body).map_err(|e| SheetsError::InvalidResponse(e.to_string()))?;
        info!(range = result.updated_range().unwrap_or("?"), "row appended to Google Sheet");
        Ok(result)
    }

    fn append_url(&self) -> Result<url::Url, SheetsError> {
        let mut url = url::Url::parse(&self.api_base)
            .map_err(|e| SheetsError::Request(format!("invalid API base: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Request("invalid API base".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{}!A1:append", self.sheet_name));
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::TEST_KEY_JSON;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> SheetsClient {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.test",
                "expires_in": 3599
            })))
            .mount(server)
            .await;
        let key = ServiceAccountKey::from_json(TEST_KEY_JSON)
            .unwrap()
            .with_token_uri(format!("{}/token", server.uri()));
        SheetsClient::new("sheet-123", key)
            .unwrap()
            .with_api_base(server.uri())
    }

    #[test]
    fn test_requires_spreadsheet_id() {
        let key = ServiceAccountKey::from_json(TEST_KEY_JSON).unwrap();
        assert!(matches!(
            SheetsClient::new(" ", key),
            Err(SheetsError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_append_url() {
        let server = MockServer::start().await;
        let client = client(&server).await.with_api_base("https://sheets.googleapis.com/");
        assert_eq!(
            client.append_url().unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/Hoja%201!A1:append?valueInputOption=USER_ENTERED"
        );
    }

    #[tokio::test]
    async fn test_append_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-123/values/Hoja%201!A1:append"))
            .and(query_param("valueInputOption", "USER_ENTERED"))
            .and(header("authorization", "Bearer ya29.test"))
            .and(body_json(serde_json::json!({"values": [["Ana", 29990.0]]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "spreadsheetId": "sheet-123",
                "tableRange": "'Hoja 1'!A1:K11",
                "updates": {"updatedRange": "'Hoja 1'!A12:K12", "updatedRows": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server)
            .await
            .append_row(&[CellValue::text("Ana"), CellValue::Number(29990.0)])
            .await
            .unwrap();
        assert_eq!(result.updated_range(), Some("'Hoja 1'!A12:K12"));
    }

    #[tokio::test]
    async fn test_append_row_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-123/values/Hoja%201!A1:append"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "The caller does not have permission"}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .append_row(&[CellValue::text("x")])
            .await
            .unwrap_err();
        match err {
            SheetsError::Rejected { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "The caller does not have permission");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
