use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::{Movement, Quantity};

/// Net stock of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product: String,
    pub stock: Quantity,
}

/// Per-kind breakdown of a product's movements.
/// For a ledger holding only known kinds, `stock == received - sold - removed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub product: String,
    pub stock: Quantity,
    pub received: Quantity,
    pub sold: Quantity,
    pub removed: Quantity,
    pub movements: i64,
}

/// Compute the stock of a single product by replaying its movements.
/// Stock = sum of IN quantities - sum of SALE and REMOVAL quantities.
/// Movements for other products are ignored; an empty history yields 0.
pub fn compute_stock(product: &str, movements: &[Movement]) -> Quantity {
    movements
        .iter()
        .filter(|m| m.product == product)
        .fold(0, |stock: Quantity, m| stock.saturating_add(m.delta()))
}

/// Compute stock for every product that appears in `movements`.
pub fn compute_all_stock(movements: &[Movement]) -> HashMap<String, Quantity> {
    let mut levels: HashMap<String, Quantity> = HashMap::new();

    for movement in movements {
        let stock = levels.entry(movement.product.clone()).or_insert(0);
        *stock = stock.saturating_add(movement.delta());
    }

    levels
}

/// Result of cross-checking stored aggregates against a full replay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    pub movement_count: i64,
    pub product_count: usize,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Compare stock levels aggregated by the store with a replay of the raw log.
pub fn build_integrity_report(
    movements: &[Movement],
    stored_levels: &HashMap<String, Quantity>,
    invalid_kinds: i64,
    negative_quantities: i64,
) -> IntegrityReport {
    let replayed = compute_all_stock(movements);
    let mut issues = Vec::new();

    if invalid_kinds > 0 {
        issues.push(format!("{} movement(s) with an unknown kind", invalid_kinds));
    }
    if negative_quantities > 0 {
        issues.push(format!(
            "{} movement(s) with a negative quantity",
            negative_quantities
        ));
    }

    // Sorted so the report is stable across runs
    let products: BTreeSet<&String> = replayed.keys().chain(stored_levels.keys()).collect();

    for product in &products {
        let expected = replayed.get(*product).copied().unwrap_or(0);
        let stored = stored_levels.get(*product).copied().unwrap_or(0);
        if expected != stored {
            issues.push(format!(
                "Stock mismatch for '{}': replay gives {}, store gives {}",
                product, expected, stored
            ));
        }
    }

    let out_of_order = movements.windows(2).filter(|w| w[0].id >= w[1].id).count();
    if out_of_order > 0 {
        issues.push(format!(
            "{} movement id(s) not strictly increasing",
            out_of_order
        ));
    }

    IntegrityReport {
        movement_count: movements.len() as i64,
        product_count: products.len(),
        issues,
    }
}
