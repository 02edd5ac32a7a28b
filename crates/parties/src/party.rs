use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, DomainResult, PartyId};

/// Party kind: manufacturer or supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyKind {
    Manufacturer,
    Supplier,
}

impl PartyKind {
    /// Lowercase label, used in log fields and identifiers.
    pub fn label(&self) -> &'static str {
        match self {
            PartyKind::Manufacturer => "manufacturer",
            PartyKind::Supplier => "supplier",
        }
    }

    /// Capitalized noun for user-facing messages.
    pub fn noun(&self) -> &'static str {
        match self {
            PartyKind::Manufacturer => "Manufacturer",
            PartyKind::Supplier => "Supplier",
        }
    }
}

/// A manufacturer or supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    pub kind: PartyKind,
    pub name: String,
}

/// Lightweight reference to a party, embedded in product read models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyRef {
    pub id: PartyId,
    pub name: String,
}

/// Validate a party name supplied on create/rename.
pub fn validate_party_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels() {
        assert_eq!(PartyKind::Manufacturer.label(), "manufacturer");
        assert_eq!(PartyKind::Supplier.noun(), "Supplier");
    }

    #[test]
    fn blank_names_are_rejected() {
        let err = validate_party_name("   ").unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for blank name"),
        }
    }

    #[test]
    fn names_pass_validation() {
        validate_party_name("Acme Tooling").unwrap();
    }
}
