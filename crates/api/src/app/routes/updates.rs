use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use stockbook_core::{ProductId, UpdateEventId};
use stockbook_products::format_price;
use stockbook_store::{ExportRow, Store, month_bounds};

use crate::app::{dto, errors};

const EXPORT_COLUMNS: [&str; 7] = [
    "Time",
    "Code",
    "Name",
    "Manufacturer",
    "Supplier",
    "Price",
    "Change",
];

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_updates))
        .route("/export", get(export))
        .route("/:id", axum::routing::delete(delete_update))
}

/// The audit trail, newest event first.
pub async fn list_updates(Extension(store): Extension<Store>) -> axum::response::Response {
    match store.list_update_events().await {
        Ok(events) => {
            let items = events
                .iter()
                .map(dto::history_event_to_json)
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e, "Update event"),
    }
}

/// Delete a whole update event, reversing its quantity deltas.
pub async fn delete_update(
    Extension(store): Extension<Store>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UpdateEventId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_message(StatusCode::BAD_REQUEST, "Invalid update event ID"),
    };

    match store.delete_update_event(id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => errors::domain_error_to_response(e, "Update event"),
    }
}

/// CSV export of the audit trail, optionally filtered by product and/or
/// calendar month.
pub async fn export(
    Extension(store): Extension<Store>,
    Query(query): Query<dto::ExportQuery>,
) -> axum::response::Response {
    let product_id: Option<ProductId> = match query.product_id.as_deref() {
        Some(raw) => match raw.parse() {
            Ok(id) => Some(id),
            Err(_) => return errors::json_message(StatusCode::BAD_REQUEST, "Invalid product ID"),
        },
        None => None,
    };

    let bounds = match query.month.as_deref() {
        Some(month) => match month_bounds(month) {
            Ok(bounds) => Some(bounds),
            Err(_) => return errors::json_message(StatusCode::BAD_REQUEST, "Invalid month"),
        },
        None => None,
    };

    let rows = match store.export_rows(product_id, bounds).await {
        Ok(rows) => rows,
        Err(e) => return errors::domain_error_to_response(e, "Update event"),
    };

    let csv = match render_csv(&rows) {
        Ok(csv) => csv,
        Err(e) => return errors::domain_error_to_response(e, "Update event"),
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment;filename=history.csv",
            ),
        ],
        csv,
    )
        .into_response()
}

fn render_csv(rows: &[ExportRow]) -> stockbook_core::DomainResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(EXPORT_COLUMNS)
        .map_err(|e| stockbook_core::DomainError::internal(format!("csv write failed: {e}")))?;

    for row in rows {
        writer
            .write_record([
                row.time.to_rfc3339(),
                row.code.clone(),
                row.name.clone(),
                row.manufacturer.clone().unwrap_or_default(),
                row.supplier.clone().unwrap_or_default(),
                row.price.as_ref().map(format_price).unwrap_or_default(),
                row.change.to_string(),
            ])
            .map_err(|e| stockbook_core::DomainError::internal(format!("csv write failed: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| stockbook_core::DomainError::internal(format!("csv flush failed: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| stockbook_core::DomainError::internal(format!("csv encoding failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    #[test]
    fn csv_columns_are_fixed_and_ordered() {
        let rows = vec![ExportRow {
            time: Utc.with_ymd_and_hms(2023, 5, 4, 12, 30, 0).unwrap(),
            code: "SKU-1".to_string(),
            name: "Widget".to_string(),
            manufacturer: Some("Acme".to_string()),
            supplier: None,
            price: Some(Decimal::new(1250, 2)),
            change: -3,
        }];

        let csv = render_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Time,Code,Name,Manufacturer,Supplier,Price,Change"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2023-05-04T12:30:00+00:00,SKU-1,Widget,Acme,,12.50,-3"
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn csv_escapes_embedded_commas() {
        let rows = vec![ExportRow {
            time: Utc.with_ymd_and_hms(2023, 5, 4, 0, 0, 0).unwrap(),
            code: "SKU-2".to_string(),
            name: "Bolt, hex".to_string(),
            manufacturer: None,
            supplier: None,
            price: None,
            change: 7,
        }];

        let csv = render_csv(&rows).unwrap();
        assert!(csv.contains("\"Bolt, hex\""));
    }
}
