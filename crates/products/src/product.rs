use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, DomainResult, ProductId};
use stockbook_parties::PartyRef;

/// A catalogued product with its current stock level.
///
/// `quantity` is mutated only by the reconciliation routine, the bulk reset,
/// and update-event deletion; product create/edit never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: i64,
    pub manufacturer: Option<PartyRef>,
    pub supplier: Option<PartyRef>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product, or fully replacing one on edit.
///
/// `manufacturer` and `supplier` are party NAMES; unknown names are created
/// on write rather than rejected. Omitted optional fields clear the stored
/// value on edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub manufacturer: Option<String>,
    pub supplier: Option<String>,
}

impl ProductDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.code.trim().is_empty() {
            return Err(DomainError::validation("code cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if let Some(manufacturer) = &self.manufacturer {
            if manufacturer.trim().is_empty() {
                return Err(DomainError::validation("manufacturer cannot be blank"));
            }
        }
        if let Some(supplier) = &self.supplier {
            if supplier.trim().is_empty() {
                return Err(DomainError::validation("supplier cannot be blank"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price::parse_price;

    fn draft() -> ProductDraft {
        ProductDraft {
            code: "SKU-001".to_string(),
            name: "Widget".to_string(),
            description: None,
            price: Some(parse_price("9.99").unwrap()),
            manufacturer: Some("Acme".to_string()),
            supplier: None,
        }
    }

    #[test]
    fn valid_draft_passes() {
        draft().validate().unwrap();
    }

    #[test]
    fn empty_code_is_rejected() {
        let mut d = draft();
        d.code = "  ".to_string();
        let err = d.validate().unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for empty code"),
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut d = draft();
        d.name = String::new();
        assert!(d.validate().is_err());
    }

    #[test]
    fn blank_party_names_are_rejected() {
        let mut d = draft();
        d.supplier = Some("   ".to_string());
        assert!(d.validate().is_err());
    }

    #[test]
    fn missing_optionals_are_fine() {
        let d = ProductDraft {
            code: "C1".to_string(),
            name: "N".to_string(),
            description: None,
            price: None,
            manufacturer: None,
            supplier: None,
        };
        d.validate().unwrap();
    }
}
