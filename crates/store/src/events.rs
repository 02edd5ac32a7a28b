//! Update-event persistence: the reconciliation transaction, the audit-trail
//! listing, event deletion with quantity reversal, and the CSV export query.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::Row;

use stockbook_core::{DomainError, DomainResult, ProductId, UpdateEventId};
use stockbook_inventory::{CoalescedLine, ScanLine, UpdateEvent, plan};

use crate::{Store, map_sqlx_error};

/// One line of the audit-trail listing, denormalized for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryLine {
    pub product_id: ProductId,
    pub code: String,
    pub name: String,
    pub price: Option<Decimal>,
    pub manufacturer: Option<String>,
    pub supplier: Option<String>,
    pub delta: i64,
}

/// An update event with its lines, newest events first in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEvent {
    pub id: UpdateEventId,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<HistoryLine>,
}

/// One row of the CSV export, in its fixed column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub time: DateTime<Utc>,
    pub code: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub supplier: Option<String>,
    pub price: Option<Decimal>,
    pub change: i64,
}

/// Inclusive bounds of a calendar month given as `YYYY-MM`:
/// `[first-of-month 00:00:00, last-of-month 23:59:59]`.
pub fn month_bounds(month: &str) -> DomainResult<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|_| DomainError::validation("Invalid month"))?;

    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
    .ok_or_else(|| DomainError::validation("Invalid month"))?;

    let start = first.and_time(NaiveTime::MIN);
    let end = next_month.and_time(NaiveTime::MIN) - Duration::seconds(1);

    Ok((
        Utc.from_utc_datetime(&start),
        Utc.from_utc_datetime(&end),
    ))
}

impl Store {
    /// Apply a scanned batch: validate against current quantities, mutate
    /// them, and record exactly one audit event — all in one transaction.
    ///
    /// Row locks (`FOR UPDATE`) on every referenced product serialize
    /// concurrent overlapping batches, so validation can never run against
    /// quantities another in-flight batch is about to change. On any
    /// failure the transaction rolls back and nothing is mutated.
    pub async fn reconcile(&self, lines: &[ScanLine]) -> DomainResult<UpdateEvent> {
        let mut ids: Vec<i64> = lines.iter().map(|l| l.product_id.value()).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("reconcile", e))?;

        let rows = sqlx::query("SELECT id, quantity FROM products WHERE id = ANY($1) FOR UPDATE")
            .bind(&ids)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("reconcile", e))?;

        let mut current: HashMap<ProductId, i64> = HashMap::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("reconcile", e))?;
            let quantity: i64 = row
                .try_get("quantity")
                .map_err(|e| map_sqlx_error("reconcile", e))?;
            current.insert(ProductId::new(id), quantity);
        }

        // Validate-before-apply: a failing batch leaves the store untouched.
        let changes = plan(lines, &current)?;

        for change in &changes {
            sqlx::query("UPDATE products SET quantity = $1 WHERE id = $2")
                .bind(change.next)
                .bind(change.product_id.value())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("reconcile", e))?;
        }

        let event_row =
            sqlx::query("INSERT INTO update_events DEFAULT VALUES RETURNING id, created_at")
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("reconcile", e))?;
        let event_id: i64 = event_row
            .try_get("id")
            .map_err(|e| map_sqlx_error("reconcile", e))?;
        let created_at: DateTime<Utc> = event_row
            .try_get("created_at")
            .map_err(|e| map_sqlx_error("reconcile", e))?;

        for change in &changes {
            sqlx::query(
                "INSERT INTO update_event_products (update_event_id, product_id, quantity) \
                 VALUES ($1, $2, $3)",
            )
            .bind(event_id)
            .bind(change.product_id.value())
            .bind(change.delta)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("reconcile", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("reconcile", e))?;

        tracing::info!(
            event_id,
            entries = changes.len(),
            "reconciled stock batch"
        );

        Ok(UpdateEvent {
            id: UpdateEventId::new(event_id),
            created_at,
            entries: changes
                .iter()
                .map(|c| CoalescedLine {
                    product_id: c.product_id,
                    delta: c.delta,
                })
                .collect(),
        })
    }

    /// The audit trail: events newest first, each event's lines sorted by
    /// product name.
    pub async fn list_update_events(&self) -> DomainResult<Vec<HistoryEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT ue.id AS event_id, ue.created_at,
                   uep.quantity AS delta,
                   p.id AS product_id, p.code, p.name, p.price,
                   m.name AS manufacturer_name, s.name AS supplier_name
            FROM update_events ue
            LEFT JOIN update_event_products uep ON uep.update_event_id = ue.id
            LEFT JOIN products p ON p.id = uep.product_id
            LEFT JOIN manufacturers m ON m.id = p.manufacturer_id
            LEFT JOIN suppliers s ON s.id = p.supplier_id
            ORDER BY ue.created_at DESC, ue.id DESC, p.name ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_update_events", e))?;

        let mut events: Vec<HistoryEvent> = Vec::new();
        for row in &rows {
            let event_id: i64 = row
                .try_get("event_id")
                .map_err(|e| map_sqlx_error("list_update_events", e))?;
            let created_at: DateTime<Utc> = row
                .try_get("created_at")
                .map_err(|e| map_sqlx_error("list_update_events", e))?;

            if events.last().map(|e| e.id.value()) != Some(event_id) {
                events.push(HistoryEvent {
                    id: UpdateEventId::new(event_id),
                    created_at,
                    lines: Vec::new(),
                });
            }

            // Events whose products were all deleted keep an empty line set.
            let product_id: Option<i64> = row
                .try_get("product_id")
                .map_err(|e| map_sqlx_error("list_update_events", e))?;
            if let Some(product_id) = product_id {
                let line = HistoryLine {
                    product_id: ProductId::new(product_id),
                    code: row
                        .try_get("code")
                        .map_err(|e| map_sqlx_error("list_update_events", e))?,
                    name: row
                        .try_get("name")
                        .map_err(|e| map_sqlx_error("list_update_events", e))?,
                    price: row
                        .try_get::<Option<Decimal>, _>("price")
                        .map_err(|e| map_sqlx_error("list_update_events", e))?,
                    manufacturer: row
                        .try_get("manufacturer_name")
                        .map_err(|e| map_sqlx_error("list_update_events", e))?,
                    supplier: row
                        .try_get("supplier_name")
                        .map_err(|e| map_sqlx_error("list_update_events", e))?,
                    delta: row
                        .try_get("delta")
                        .map_err(|e| map_sqlx_error("list_update_events", e))?,
                };
                if let Some(event) = events.last_mut() {
                    event.lines.push(line);
                }
            }
        }
        Ok(events)
    }

    /// Delete a whole update event, rolling each affected product's quantity
    /// back by the negated recorded delta, atomically.
    ///
    /// The reversal honors the non-negative invariant: if undoing an event
    /// would drive any quantity below zero, nothing is deleted.
    pub async fn delete_update_event(&self, id: UpdateEventId) -> DomainResult<()> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("delete_update_event", e))?;

        let exists = sqlx::query("SELECT id FROM update_events WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_update_event", e))?;
        if exists.is_none() {
            return Err(DomainError::NotFound);
        }

        let links = sqlx::query(
            "SELECT product_id, quantity FROM update_event_products \
             WHERE update_event_id = $1 ORDER BY product_id ASC",
        )
        .bind(id.value())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_update_event", e))?;

        let mut reversals: Vec<(i64, i64)> = Vec::with_capacity(links.len());
        for link in &links {
            let product_id: i64 = link
                .try_get("product_id")
                .map_err(|e| map_sqlx_error("delete_update_event", e))?;
            let delta: i64 = link
                .try_get("quantity")
                .map_err(|e| map_sqlx_error("delete_update_event", e))?;
            reversals.push((product_id, delta));
        }

        let ids: Vec<i64> = reversals.iter().map(|&(id, _)| id).collect();
        let rows = sqlx::query("SELECT id, quantity FROM products WHERE id = ANY($1) FOR UPDATE")
            .bind(&ids)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_update_event", e))?;

        let mut current: HashMap<i64, i64> = HashMap::with_capacity(rows.len());
        for row in &rows {
            let pid: i64 = row
                .try_get("id")
                .map_err(|e| map_sqlx_error("delete_update_event", e))?;
            let quantity: i64 = row
                .try_get("quantity")
                .map_err(|e| map_sqlx_error("delete_update_event", e))?;
            current.insert(pid, quantity);
        }

        for (index, &(product_id, delta)) in reversals.iter().enumerate() {
            let quantity = *current
                .get(&product_id)
                .ok_or_else(|| DomainError::internal("event link references missing product"))?;
            let next = quantity - delta;
            if next < 0 {
                return Err(DomainError::insufficient_stock(index));
            }
            sqlx::query("UPDATE products SET quantity = $1 WHERE id = $2")
                .bind(next)
                .bind(product_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("delete_update_event", e))?;
        }

        // Links cascade with the event row.
        sqlx::query("DELETE FROM update_events WHERE id = $1")
            .bind(id.value())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_update_event", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("delete_update_event", e))?;

        tracing::info!(event_id = id.value(), "deleted update event");
        Ok(())
    }

    /// Rows for the audit-trail CSV export, oldest event first, optionally
    /// filtered by product and/or an inclusive time window.
    pub async fn export_rows(
        &self,
        product_id: Option<ProductId>,
        bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> DomainResult<Vec<ExportRow>> {
        let (start, end) = match bounds {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };

        let rows = sqlx::query(
            r#"
            SELECT ue.created_at AS time,
                   p.code, p.name, p.price,
                   m.name AS manufacturer_name, s.name AS supplier_name,
                   uep.quantity AS change
            FROM update_event_products uep
            JOIN update_events ue ON ue.id = uep.update_event_id
            JOIN products p ON p.id = uep.product_id
            LEFT JOIN manufacturers m ON m.id = p.manufacturer_id
            LEFT JOIN suppliers s ON s.id = p.supplier_id
            WHERE ($1::bigint IS NULL OR uep.product_id = $1)
              AND ($2::timestamptz IS NULL OR ue.created_at >= $2)
              AND ($3::timestamptz IS NULL OR ue.created_at <= $3)
            ORDER BY ue.created_at ASC, ue.id ASC, p.name ASC
            "#,
        )
        .bind(product_id.map(|id| id.value()))
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("export_rows", e))?;

        rows.iter()
            .map(|row| {
                Ok(ExportRow {
                    time: row
                        .try_get("time")
                        .map_err(|e| map_sqlx_error("export_rows", e))?,
                    code: row
                        .try_get("code")
                        .map_err(|e| map_sqlx_error("export_rows", e))?,
                    name: row
                        .try_get("name")
                        .map_err(|e| map_sqlx_error("export_rows", e))?,
                    manufacturer: row
                        .try_get("manufacturer_name")
                        .map_err(|e| map_sqlx_error("export_rows", e))?,
                    supplier: row
                        .try_get("supplier_name")
                        .map_err(|e| map_sqlx_error("export_rows", e))?,
                    price: row
                        .try_get::<Option<Decimal>, _>("price")
                        .map_err(|e| map_sqlx_error("export_rows", e))?,
                    change: row
                        .try_get("change")
                        .map_err(|e| map_sqlx_error("export_rows", e))?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_cover_the_whole_month_inclusive() {
        let (start, end) = month_bounds("2023-05").unwrap();
        assert_eq!(start.to_rfc3339(), "2023-05-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2023-05-31T23:59:59+00:00");
    }

    #[test]
    fn month_bounds_handle_december_rollover() {
        let (start, end) = month_bounds("2023-12").unwrap();
        assert_eq!(start.to_rfc3339(), "2023-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2023-12-31T23:59:59+00:00");
    }

    #[test]
    fn month_bounds_handle_february() {
        let (_, end) = month_bounds("2024-02").unwrap();
        assert_eq!(end.to_rfc3339(), "2024-02-29T23:59:59+00:00");
    }

    #[test]
    fn invalid_months_are_rejected() {
        for bad in ["2023-13", "2023", "May 2023", ""] {
            let err = month_bounds(bad).unwrap_err();
            match err {
                DomainError::Validation(msg) => assert_eq!(msg, "Invalid month"),
                _ => panic!("Expected Validation error for {bad:?}"),
            }
        }
    }
}
