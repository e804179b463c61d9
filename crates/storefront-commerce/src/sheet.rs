//! The spreadsheet row written for every paid order.
//!
//! Column order is fixed; the spreadsheet's header row must match
//! [`SheetColumn::ALL`].

use crate::order::{PaymentConfirmation, PendingOrder};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for a required value the customer never provided.
pub const MISSING_VALUE: &str = "[FALTA]";

/// Placeholder for values the gateway did not report.
pub const NOT_AVAILABLE: &str = "N/A";

/// Spreadsheet columns, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetColumn {
    FirstName,
    LastName,
    Phone,
    Email,
    Address,
    Region,
    Commune,
    CarrierNotes,
    OrderDate,
    OrderId,
    AmountPaid,
}

impl SheetColumn {
    pub const ALL: [SheetColumn; 11] = [
        SheetColumn::FirstName,
        SheetColumn::LastName,
        SheetColumn::Phone,
        SheetColumn::Email,
        SheetColumn::Address,
        SheetColumn::Region,
        SheetColumn::Commune,
        SheetColumn::CarrierNotes,
        SheetColumn::OrderDate,
        SheetColumn::OrderId,
        SheetColumn::AmountPaid,
    ];

    /// Header text in the spreadsheet.
    pub fn header(&self) -> &'static str {
        match self {
            SheetColumn::FirstName => "Nombre",
            SheetColumn::LastName => "Apellido",
            SheetColumn::Phone => "Teléfono",
            SheetColumn::Email => "Email",
            SheetColumn::Address => "Dirección",
            SheetColumn::Region => "Región",
            SheetColumn::Commune => "Comuna",
            SheetColumn::CarrierNotes => "Observación Transportista",
            SheetColumn::OrderDate => "Fecha Pedido",
            SheetColumn::OrderId => "ID Orden",
            SheetColumn::AmountPaid => "Monto Pagado",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// A single cell value, sent as a JSON string or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Number(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One spreadsheet row, one cell per [`SheetColumn`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetRow(Vec<CellValue>);

impl SheetRow {
    /// Row for a paid order.
    ///
    /// Customer fields come from the pending order; blank required fields
    /// become [`MISSING_VALUE`]. The form email wins over the payer email.
    /// The order date is the gateway's payment time when it parses, else
    /// `now`.
    pub fn build(
        pending: &PendingOrder,
        confirmation: &PaymentConfirmation,
        now: DateTime<Utc>,
    ) -> Self {
        let customer = &pending.customer;
        let cells = SheetColumn::ALL
            .iter()
            .map(|column| match column {
                SheetColumn::FirstName => required(&customer.first_name),
                SheetColumn::LastName => required(&customer.last_name),
                SheetColumn::Phone => required(&customer.phone),
                SheetColumn::Email => {
                    let form_email = customer.email.trim();
                    if !form_email.is_empty() {
                        CellValue::text(form_email)
                    } else {
                        required(confirmation.payer_email.as_deref().unwrap_or(""))
                    }
                }
                SheetColumn::Address => required(&customer.address),
                SheetColumn::Region => required(&customer.region),
                SheetColumn::Commune => required(&customer.commune),
                SheetColumn::CarrierNotes => CellValue::text(customer.observations.trim()),
                SheetColumn::OrderDate => {
                    let at = confirmation
                        .timestamp
                        .as_deref()
                        .and_then(parse_gateway_time)
                        .unwrap_or(now);
                    CellValue::Text(format_timestamp(at))
                }
                SheetColumn::OrderId => CellValue::text(pending.order_id.as_str()),
                SheetColumn::AmountPaid => match confirmation.amount {
                    Some(amount) if amount != 0.0 && amount.is_finite() => {
                        CellValue::Number(amount)
                    }
                    _ => CellValue::text(NOT_AVAILABLE),
                },
            })
            .collect();
        Self(cells)
    }

    /// Fixed row used to check that the spreadsheet is writable.
    pub fn test_row(now: DateTime<Utc>) -> Self {
        Self(vec![
            CellValue::text("Prueba Nombre"),
            CellValue::text("Prueba Apellido"),
            CellValue::text("+56912345678"),
            CellValue::text("test@example.com"),
            CellValue::text("Calle Falsa 123"),
            CellValue::text("Testlandia"),
            CellValue::text("Providencia Test"),
            CellValue::text("Es una prueba"),
            CellValue::Text(format_timestamp(now)),
            CellValue::text("TEST-ORDER-123"),
            CellValue::Number(9990.0),
        ])
    }

    /// Header row matching the column order.
    pub fn header() -> Self {
        Self(
            SheetColumn::ALL
                .iter()
                .map(|c| CellValue::text(c.header()))
                .collect(),
        )
    }

    pub fn cell(&self, column: SheetColumn) -> Option<&CellValue> {
        self.0.get(column.index())
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.0
    }

    pub fn into_cells(self) -> Vec<CellValue> {
        self.0
    }
}

fn required(value: &str) -> CellValue {
    let value = value.trim();
    if value.is_empty() {
        CellValue::text(MISSING_VALUE)
    } else {
        CellValue::text(value)
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Gateways send RFC 3339 (Mercado Pago) or `YYYY-MM-DD HH:MM:SS` (Flow).
fn parse_gateway_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::CustomerDetails;
    use crate::money::Money;
    use crate::order::{Gateway, OrderId, PaymentStatus};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 8, 15, 30, 0).unwrap()
    }

    fn pending() -> PendingOrder {
        PendingOrder::new(
            OrderId::parse("AstroShop-1712590000000-abc123").unwrap(),
            Gateway::MercadoPago,
            CustomerDetails {
                first_name: "Ana".into(),
                last_name: "Rojas".into(),
                email: "ana@example.cl".into(),
                phone: "912345678".into(),
                address: "Av. Providencia 1234".into(),
                region: "Metropolitana".into(),
                commune: "Providencia".into(),
                observations: "Dejar en conserjería".into(),
            },
            Money::clp(29990),
        )
    }

    fn confirmation() -> PaymentConfirmation {
        PaymentConfirmation::new(Gateway::MercadoPago, "123", PaymentStatus::Paid)
            .with_order_id("AstroShop-1712590000000-abc123")
            .with_amount(29990.0)
            .with_payer_email("payer@mp.example")
            .with_timestamp("2025-04-08T10:00:00.000-04:00")
    }

    fn text(row: &SheetRow, column: SheetColumn) -> String {
        row.cell(column).unwrap().to_string()
    }

    #[test]
    fn test_headers_in_order() {
        let headers: Vec<&str> = SheetColumn::ALL.iter().map(|c| c.header()).collect();
        assert_eq!(
            headers,
            vec![
                "Nombre",
                "Apellido",
                "Teléfono",
                "Email",
                "Dirección",
                "Región",
                "Comuna",
                "Observación Transportista",
                "Fecha Pedido",
                "ID Orden",
                "Monto Pagado"
            ]
        );
        assert_eq!(SheetRow::header().cells().len(), 11);
    }

    #[test]
    fn test_build_full_row() {
        let row = SheetRow::build(&pending(), &confirmation(), now());
        assert_eq!(row.cells().len(), SheetColumn::ALL.len());
        assert_eq!(text(&row, SheetColumn::FirstName), "Ana");
        assert_eq!(text(&row, SheetColumn::Email), "ana@example.cl");
        assert_eq!(text(&row, SheetColumn::CarrierNotes), "Dejar en conserjería");
        assert_eq!(text(&row, SheetColumn::OrderDate), "2025-04-08T14:00:00.000Z");
        assert_eq!(
            text(&row, SheetColumn::OrderId),
            "AstroShop-1712590000000-abc123"
        );
        assert_eq!(
            row.cell(SheetColumn::AmountPaid),
            Some(&CellValue::Number(29990.0))
        );
    }

    #[test]
    fn test_missing_fields() {
        let mut order = pending();
        order.customer.last_name = String::new();
        order.customer.phone = " ".into();
        order.customer.observations = String::new();
        order.customer.email = String::new();

        let row = SheetRow::build(&order, &confirmation(), now());
        assert_eq!(text(&row, SheetColumn::LastName), MISSING_VALUE);
        assert_eq!(text(&row, SheetColumn::Phone), MISSING_VALUE);
        assert_eq!(text(&row, SheetColumn::CarrierNotes), "");
        assert_eq!(text(&row, SheetColumn::Email), "payer@mp.example");

        let mut no_payer = confirmation();
        no_payer.payer_email = None;
        let row = SheetRow::build(&order, &no_payer, now());
        assert_eq!(text(&row, SheetColumn::Email), MISSING_VALUE);
    }

    #[test]
    fn test_amount_and_date_fallbacks() {
        let mut confirmation = confirmation();
        confirmation.amount = None;
        confirmation.timestamp = Some("not a date".into());
        let row = SheetRow::build(&pending(), &confirmation, now());
        assert_eq!(text(&row, SheetColumn::AmountPaid), NOT_AVAILABLE);
        assert_eq!(text(&row, SheetColumn::OrderDate), "2025-04-08T15:30:00.000Z");

        confirmation.amount = Some(0.0);
        confirmation.timestamp = Some("2025-04-07 09:15:00".into());
        let row = SheetRow::build(&pending(), &confirmation, now());
        assert_eq!(text(&row, SheetColumn::AmountPaid), NOT_AVAILABLE);
        assert_eq!(text(&row, SheetColumn::OrderDate), "2025-04-07T09:15:00.000Z");
    }

    #[test]
    fn test_test_row() {
        let row = SheetRow::test_row(now());
        assert_eq!(row.cells().len(), SheetColumn::ALL.len());
        assert_eq!(text(&row, SheetColumn::OrderId), "TEST-ORDER-123");
        assert_eq!(
            serde_json::to_value(&row).unwrap()[10],
            serde_json::json!(9990.0)
        );
    }
}
