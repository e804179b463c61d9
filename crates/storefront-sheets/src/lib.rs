//! Google Sheets order log.
//!
//! Every paid order becomes one row appended to a spreadsheet, authenticated
//! with a service account key:
//!
//! ```ignore
//! use storefront_sheets::{RowSink, ServiceAccountKey, SheetsClient};
//!
//! let key = ServiceAccountKey::from_file("credentials.json").await?;
//! let sheets = SheetsClient::new(spreadsheet_id, key)?;
//! sheets.append(&SheetRow::test_row(Utc::now())).await?;
//! ```

mod client;
mod credentials;
mod error;
mod sink;
mod token;

pub use client::{AppendResult, AppendUpdates, SheetsClient, DEFAULT_SHEET_NAME, SHEETS_API_BASE};
pub use credentials::{ServiceAccountKey, GOOGLE_TOKEN_URI};
pub use error::SheetsError;
pub use sink::RowSink;
pub use token::{TokenProvider, SPREADSHEETS_SCOPE};
