//! Manufacturer/supplier persistence.
//!
//! Both kinds share one code path; the kind picks the table. Parties are
//! created implicitly from product writes (connect-or-create by name), so
//! there is no standalone create here.

use serde::Serialize;
use sqlx::Row;
use sqlx::{Postgres, Transaction};

use stockbook_core::{DomainError, DomainResult, PartyId};
use stockbook_parties::{Party, PartyKind, validate_party_name};
use stockbook_products::Product;

use crate::products::{PRODUCT_SELECT, product_from_row};
use crate::{Store, map_sqlx_error, map_unique_violation};

/// A party with the products that reference it, for the list/detail pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyWithProducts {
    pub id: PartyId,
    pub kind: PartyKind,
    pub name: String,
    pub products: Vec<Product>,
}

fn table(kind: PartyKind) -> &'static str {
    match kind {
        PartyKind::Manufacturer => "manufacturers",
        PartyKind::Supplier => "suppliers",
    }
}

fn fk_column(kind: PartyKind) -> &'static str {
    match kind {
        PartyKind::Manufacturer => "manufacturer_id",
        PartyKind::Supplier => "supplier_id",
    }
}

fn duplicate_name_message(kind: PartyKind) -> String {
    format!("A {} already exists with this name", kind.label())
}

/// Connect-or-create a party by name inside an open transaction, returning
/// its id. Unknown names are created; known names resolve to the existing
/// row.
pub(crate) async fn ensure_party(
    tx: &mut Transaction<'_, Postgres>,
    kind: PartyKind,
    name: &str,
) -> DomainResult<PartyId> {
    validate_party_name(name)?;

    // DO UPDATE instead of DO NOTHING so RETURNING always yields the row.
    let sql = format!(
        "INSERT INTO {} (name) VALUES ($1) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
        table(kind)
    );
    let row = sqlx::query(&sql)
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("ensure_party", e))?;

    let id: i64 = row
        .try_get("id")
        .map_err(|e| map_sqlx_error("ensure_party", e))?;
    Ok(PartyId::new(id))
}

impl Store {
    /// List all parties of one kind, each with its products sorted by name.
    pub async fn list_parties(&self, kind: PartyKind) -> DomainResult<Vec<PartyWithProducts>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY name ASC", table(kind));
        let rows = sqlx::query(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("list_parties", e))?;

        let mut parties = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row
                .try_get("id")
                .map_err(|e| map_sqlx_error("list_parties", e))?;
            let name: String = row
                .try_get("name")
                .map_err(|e| map_sqlx_error("list_parties", e))?;
            let products = self.party_products(kind, PartyId::new(id)).await?;
            parties.push(PartyWithProducts {
                id: PartyId::new(id),
                kind,
                name,
                products,
            });
        }
        Ok(parties)
    }

    /// Fetch one party with its products, or `NotFound`.
    pub async fn get_party(&self, kind: PartyKind, id: PartyId) -> DomainResult<PartyWithProducts> {
        let sql = format!("SELECT name FROM {} WHERE id = $1", table(kind));
        let row = sqlx::query(&sql)
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("get_party", e))?
            .ok_or(DomainError::NotFound)?;

        let name: String = row
            .try_get("name")
            .map_err(|e| map_sqlx_error("get_party", e))?;
        let products = self.party_products(kind, id).await?;

        Ok(PartyWithProducts {
            id,
            kind,
            name,
            products,
        })
    }

    /// Rename a party. Duplicate names surface as a field-scoped conflict.
    pub async fn rename_party(
        &self,
        kind: PartyKind,
        id: PartyId,
        name: &str,
    ) -> DomainResult<Party> {
        validate_party_name(name)?;

        let sql = format!("UPDATE {} SET name = $1 WHERE id = $2 RETURNING id", table(kind));
        let row = sqlx::query(&sql)
            .bind(name)
            .bind(id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                map_unique_violation("rename_party", "name", &duplicate_name_message(kind), e)
            })?;

        if row.is_none() {
            return Err(DomainError::NotFound);
        }

        Ok(Party {
            id,
            kind,
            name: name.to_string(),
        })
    }

    /// Delete a party. Referencing products are detached (their foreign key
    /// is set NULL by the schema), never deleted.
    pub async fn delete_party(&self, kind: PartyKind, id: PartyId) -> DomainResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table(kind));
        let result = sqlx::query(&sql)
            .bind(id.value())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_party", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn party_products(&self, kind: PartyKind, id: PartyId) -> DomainResult<Vec<Product>> {
        let sql = format!(
            "{PRODUCT_SELECT} WHERE p.{} = $1 ORDER BY p.name ASC",
            fk_column(kind)
        );
        let rows = sqlx::query(&sql)
            .bind(id.value())
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("party_products", e))?;

        rows.iter()
            .map(|row| product_from_row(row).map_err(|e| map_sqlx_error("party_products", e)))
            .collect()
    }
}
