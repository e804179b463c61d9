use crate::state::ServiceState;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use storefront_commerce::sheet::SheetRow;
use tracing::{error, info};

/// Append a fixed test row to check the spreadsheet is writable.
pub async fn test_sheets(State(state): State<ServiceState>) -> (StatusCode, String) {
    let Some(sheets) = state.reconciler.sheets() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error en la prueba: Google Sheets no está configurado".to_string(),
        );
    };

    match sheets.append(&SheetRow::test_row(Utc::now())).await {
        Ok(range) => {
            info!(range = ?range, "test row appended");
            (
                StatusCode::OK,
                "Prueba de escritura en Google Sheet exitosa. Revisa tu hoja.".to_string(),
            )
        }
        Err(e) => {
            error!(error = %e, "test row append failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error en la prueba: {e}"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::reconcile::testing::MemorySink;
    use crate::routes::build_router;
    use crate::routes::test_support::{get, state};
    use axum::http::StatusCode;
    use std::sync::Arc;
    use storefront_commerce::sheet::SheetColumn;

    #[tokio::test]
    async fn test_appends_test_row() {
        let sink = Arc::new(MemorySink::default());
        let (_dir, state) = state();
        let app = build_router(state.with_sheets(sink.clone()));

        let (status, body) = get(app, "/api/test-sheets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Prueba de escritura en Google Sheet exitosa. Revisa tu hoja.");

        let rows = sink.rows.lock().unwrap();
        assert_eq!(
            rows[0].cell(SheetColumn::OrderId).unwrap().to_string(),
            "TEST-ORDER-123"
        );
    }

    #[tokio::test]
    async fn test_reports_failure() {
        let (_dir, state) = state();
        let (status, body) = get(build_router(state.clone()), "/api/test-sheets").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Error en la prueba:"));

        let app = build_router(state.with_sheets(Arc::new(MemorySink::failing())));
        let (status, body) = get(app, "/api/test-sheets").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("The caller does not have permission"), "{body}");
    }
}
