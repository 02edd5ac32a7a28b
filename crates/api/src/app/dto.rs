use serde::Deserialize;
use serde_json::{Value, json};

use stockbook_core::{DomainResult, ProductId};
use stockbook_inventory::{ScanLine, UpdateEvent};
use stockbook_parties::PartyRef;
use stockbook_products::{Product, ProductDraft, format_price, parse_price};
use stockbook_store::{HistoryEvent, PartyWithProducts, ProductHistoryEntry};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: Option<String>,
}

/// Create/replace payload for a product. `price` is a form string and may
/// carry thousands separators; `manufacturer`/`supplier` are party names.
///
/// Required fields are `Option` so their absence surfaces as a 400 from
/// draft validation rather than a body-rejection.
#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub manufacturer: Option<String>,
    pub supplier: Option<String>,
}

impl ProductPayload {
    pub fn into_draft(self) -> DomainResult<ProductDraft> {
        let price = match self.price {
            Some(raw) => Some(parse_price(&raw)?),
            None => None,
        };
        Ok(ProductDraft {
            code: self.code.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description,
            price,
            manufacturer: self.manufacturer,
            supplier: self.supplier,
        })
    }
}

/// One scanned line: positive quantity adds stock, negative removes.
#[derive(Debug, Deserialize)]
pub struct ScanEntry {
    pub id: i64,
    pub quantity: i64,
}

impl ScanEntry {
    pub fn into_line(self) -> ScanLine {
        ScanLine {
            product_id: ProductId::new(self.id),
            delta: self.quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub product_id: Option<String>,
    pub month: Option<String>,
}

// -------------------------
// Response mapping
// -------------------------

fn party_ref_to_json(party: Option<&PartyRef>) -> Value {
    match party {
        Some(p) => json!({ "id": p.id, "name": p.name }),
        None => Value::Null,
    }
}

pub fn product_to_json(product: &Product) -> Value {
    json!({
        "id": product.id,
        "code": product.code,
        "name": product.name,
        "description": product.description,
        "price": product.price.as_ref().map(format_price),
        "quantity": product.quantity,
        "manufacturer": party_ref_to_json(product.manufacturer.as_ref()),
        "supplier": party_ref_to_json(product.supplier.as_ref()),
        "created_at": product.created_at.to_rfc3339(),
    })
}

pub fn product_detail_to_json(product: &Product, history: &[ProductHistoryEntry]) -> Value {
    let mut value = product_to_json(product);
    value["update_events"] = history
        .iter()
        .map(|entry| {
            json!({
                "id": entry.event_id,
                "created_at": entry.created_at.to_rfc3339(),
                "quantity": entry.delta,
            })
        })
        .collect::<Vec<_>>()
        .into();
    value
}

pub fn update_event_to_json(event: &UpdateEvent) -> Value {
    json!({
        "id": event.id,
        "created_at": event.created_at.to_rfc3339(),
        "products": event
            .entries
            .iter()
            .map(|entry| json!({ "id": entry.product_id, "quantity": entry.delta }))
            .collect::<Vec<_>>(),
    })
}

pub fn history_event_to_json(event: &HistoryEvent) -> Value {
    json!({
        "id": event.id,
        "created_at": event.created_at.to_rfc3339(),
        "products": event
            .lines
            .iter()
            .map(|line| {
                json!({
                    "id": line.product_id,
                    "code": line.code,
                    "name": line.name,
                    "price": line.price.as_ref().map(format_price),
                    "manufacturer": line.manufacturer,
                    "supplier": line.supplier,
                    "quantity": line.delta,
                })
            })
            .collect::<Vec<_>>(),
    })
}

pub fn party_to_json(party: &PartyWithProducts) -> Value {
    json!({
        "id": party.id,
        "name": party.name,
        "products": party.products.iter().map(product_to_json).collect::<Vec<_>>(),
    })
}
