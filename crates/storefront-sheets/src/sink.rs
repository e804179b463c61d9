use crate::client::SheetsClient;
use crate::SheetsError;
use async_trait::async_trait;
use storefront_commerce::sheet::SheetRow;

/// Somewhere paid orders are recorded.
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Append one row; returns the range written when the backend reports one.
    async fn append(&self, row: &SheetRow) -> Result<Option<String>, SheetsError>;
}

#[async_trait]
impl RowSink for SheetsClient {
    async fn append(&self, row: &SheetRow) -> Result<Option<String>, SheetsError> {
        let result = self.append_row(row.cells()).await?;
        Ok(result.updated_range().map(str::to_string))
    }
}
