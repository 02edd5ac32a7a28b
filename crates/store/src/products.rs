//! Product persistence: CRUD, code lookup, and the bulk quantity reset.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::Row;
use sqlx::postgres::PgRow;

use stockbook_core::{DomainError, DomainResult, PartyId, ProductId, UpdateEventId};
use stockbook_parties::{PartyKind, PartyRef};
use stockbook_products::{Product, ProductDraft};

use crate::parties::ensure_party;
use crate::{Store, map_sqlx_error, map_unique_violation};

const DUPLICATE_CODE: &str = "A product already exists with this code";

/// Base SELECT joining party names onto product rows.
pub(crate) const PRODUCT_SELECT: &str = r#"
SELECT p.id, p.code, p.name, p.description, p.price, p.quantity, p.created_at,
       m.id AS manufacturer_id, m.name AS manufacturer_name,
       s.id AS supplier_id, s.name AS supplier_name
FROM products p
LEFT JOIN manufacturers m ON m.id = p.manufacturer_id
LEFT JOIN suppliers s ON s.id = p.supplier_id
"#;

/// One audit-trail entry on a product detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductHistoryEntry {
    pub event_id: UpdateEventId,
    pub created_at: DateTime<Utc>,
    pub delta: i64,
}

pub(crate) fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    let manufacturer = party_ref(
        row.try_get("manufacturer_id")?,
        row.try_get("manufacturer_name")?,
    );
    let supplier = party_ref(row.try_get("supplier_id")?, row.try_get("supplier_name")?);

    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        code: row.try_get("code")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get::<Option<Decimal>, _>("price")?,
        quantity: row.try_get("quantity")?,
        manufacturer,
        supplier,
        created_at: row.try_get("created_at")?,
    })
}

fn party_ref(id: Option<i64>, name: Option<String>) -> Option<PartyRef> {
    match (id, name) {
        (Some(id), Some(name)) => Some(PartyRef {
            id: PartyId::new(id),
            name,
        }),
        _ => None,
    }
}

impl Store {
    /// List products, optionally filtered to an exact code match.
    ///
    /// The code filter is the resolution step scanners use to turn a product
    /// code into an id before submitting a batch.
    pub async fn list_products(&self, code: Option<&str>) -> DomainResult<Vec<Product>> {
        let sql = format!(
            "{PRODUCT_SELECT} WHERE ($1::text IS NULL OR p.code = $1) ORDER BY p.name ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(code)
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter()
            .map(|row| product_from_row(row).map_err(|e| map_sqlx_error("list_products", e)))
            .collect()
    }

    /// Fetch one product (no history).
    pub async fn fetch_product(&self, id: ProductId) -> DomainResult<Product> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("fetch_product", e))?
            .ok_or(DomainError::NotFound)?;

        product_from_row(&row).map_err(|e| map_sqlx_error("fetch_product", e))
    }

    /// Fetch one product together with its audit-trail entries (oldest first).
    pub async fn fetch_product_history(
        &self,
        id: ProductId,
    ) -> DomainResult<Vec<ProductHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT uep.update_event_id, ue.created_at, uep.quantity
            FROM update_event_products uep
            JOIN update_events ue ON ue.id = uep.update_event_id
            WHERE uep.product_id = $1
            ORDER BY ue.created_at ASC, ue.id ASC
            "#,
        )
        .bind(id.value())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("fetch_product_history", e))?;

        rows.iter()
            .map(|row| {
                Ok(ProductHistoryEntry {
                    event_id: UpdateEventId::new(
                        row.try_get("update_event_id")
                            .map_err(|e| map_sqlx_error("fetch_product_history", e))?,
                    ),
                    created_at: row
                        .try_get("created_at")
                        .map_err(|e| map_sqlx_error("fetch_product_history", e))?,
                    delta: row
                        .try_get("quantity")
                        .map_err(|e| map_sqlx_error("fetch_product_history", e))?,
                })
            })
            .collect()
    }

    /// Create a product. Party names are connected-or-created; quantity
    /// starts at zero and is never writable through this path.
    pub async fn create_product(&self, draft: &ProductDraft) -> DomainResult<Product> {
        draft.validate()?;

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_product", e))?;

        let manufacturer_id = match &draft.manufacturer {
            Some(name) => Some(ensure_party(&mut tx, PartyKind::Manufacturer, name).await?),
            None => None,
        };
        let supplier_id = match &draft.supplier {
            Some(name) => Some(ensure_party(&mut tx, PartyKind::Supplier, name).await?),
            None => None,
        };

        let row = sqlx::query(
            r#"
            INSERT INTO products (code, name, description, price, manufacturer_id, supplier_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&draft.code)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(manufacturer_id.map(i64::from))
        .bind(supplier_id.map(i64::from))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation("create_product", "code", DUPLICATE_CODE, e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("create_product", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_product", e))?;

        self.fetch_product(ProductId::new(id)).await
    }

    /// Fully replace a product's catalogue fields. Quantity is untouched.
    pub async fn update_product(&self, id: ProductId, draft: &ProductDraft) -> DomainResult<Product> {
        draft.validate()?;

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;

        let manufacturer_id = match &draft.manufacturer {
            Some(name) => Some(ensure_party(&mut tx, PartyKind::Manufacturer, name).await?),
            None => None,
        };
        let supplier_id = match &draft.supplier {
            Some(name) => Some(ensure_party(&mut tx, PartyKind::Supplier, name).await?),
            None => None,
        };

        let updated = sqlx::query(
            r#"
            UPDATE products
            SET code = $1, name = $2, description = $3, price = $4,
                manufacturer_id = $5, supplier_id = $6
            WHERE id = $7
            RETURNING id
            "#,
        )
        .bind(&draft.code)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(manufacturer_id.map(i64::from))
        .bind(supplier_id.map(i64::from))
        .bind(id.value())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_unique_violation("update_product", "code", DUPLICATE_CODE, e))?;

        if updated.is_none() {
            return Err(DomainError::NotFound);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;

        self.fetch_product(id).await
    }

    /// Delete a product. Its audit links cascade away with it.
    pub async fn delete_product(&self, id: ProductId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    /// Bulk reset: every product's quantity becomes zero.
    ///
    /// Deliberately unaudited (no update event is written), matching the
    /// product's accepted traceability gap.
    pub async fn reset_quantities(&self) -> DomainResult<()> {
        sqlx::query("UPDATE products SET quantity = 0")
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("reset_quantities", e))?;
        Ok(())
    }
}
