use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, DomainResult, ProductId, UpdateEventId};

/// One scanned line in a batch: positive delta adds stock, negative removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanLine {
    pub product_id: ProductId,
    pub delta: i64,
}

/// A batch entry after duplicate product ids have been merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoalescedLine {
    pub product_id: ProductId,
    pub delta: i64,
}

/// The validated outcome for one product: the quantity transition the store
/// must apply and the net delta to record on the audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityChange {
    pub product_id: ProductId,
    pub previous: i64,
    pub next: i64,
    pub delta: i64,
}

/// A committed audit record, as returned to the caller after a successful
/// reconciliation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub id: UpdateEventId,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<CoalescedLine>,
}

/// Merge duplicate product ids by summing their deltas.
///
/// Output order is the first occurrence of each product in the batch, so
/// error indices stay stable for the caller.
pub fn coalesce(lines: &[ScanLine]) -> Vec<CoalescedLine> {
    let mut order: Vec<ProductId> = Vec::new();
    let mut nets: HashMap<ProductId, i64> = HashMap::new();

    for line in lines {
        match nets.get_mut(&line.product_id) {
            Some(net) => *net += line.delta,
            None => {
                order.push(line.product_id);
                nets.insert(line.product_id, line.delta);
            }
        }
    }

    order
        .into_iter()
        .map(|product_id| CoalescedLine {
            product_id,
            delta: nets[&product_id],
        })
        .collect()
}

/// Validate a batch against current quantities and produce the changes to
/// apply.
///
/// Contract (validate-before-apply):
/// 1. the batch must be non-empty and every raw entry's delta nonzero;
/// 2. every coalesced entry must reference a known product, else
///    `InvalidProductReference` with that entry's post-coalescing index;
/// 3. no coalesced entry may drive its product's quantity negative, else
///    `InsufficientStock` with that entry's post-coalescing index.
///
/// On success, returns one `QuantityChange` per coalesced entry. The caller
/// applies all of them plus exactly one audit event atomically, or nothing.
pub fn plan(
    lines: &[ScanLine],
    current: &HashMap<ProductId, i64>,
) -> DomainResult<Vec<QuantityChange>> {
    if lines.is_empty() {
        return Err(DomainError::validation("batch cannot be empty"));
    }
    for (position, line) in lines.iter().enumerate() {
        if line.delta == 0 {
            return Err(DomainError::validation(format!(
                "entry {position}: quantity cannot be zero"
            )));
        }
    }

    let coalesced = coalesce(lines);

    for (index, line) in coalesced.iter().enumerate() {
        if !current.contains_key(&line.product_id) {
            return Err(DomainError::invalid_product_reference(index));
        }
    }

    let mut changes = Vec::with_capacity(coalesced.len());
    for (index, line) in coalesced.iter().enumerate() {
        let previous = current[&line.product_id];
        let next = previous + line.delta;
        if next < 0 {
            return Err(DomainError::insufficient_stock(index));
        }
        changes.push(QuantityChange {
            product_id: line.product_id,
            previous,
            next,
            delta: line.delta,
        });
    }

    Ok(changes)
}
