use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the store, strictly increasing in append order.
pub type MovementId = i64;

/// Stock quantities are signed so that balances can go below zero.
pub type Quantity = i64;

/// Largest quantity a single movement can carry. SQLite stores integers as
/// signed 64-bit values.
pub const MAX_QUANTITY: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementKind {
    /// Goods received into stock
    In,
    /// Goods sold to a customer
    Sale,
    /// Goods written off (damage, loss, shrinkage)
    Removal,
}

impl MovementKind {
    pub const ALL: [MovementKind; 3] = [MovementKind::In, MovementKind::Sale, MovementKind::Removal];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::In => "IN",
            MovementKind::Sale => "SALE",
            MovementKind::Removal => "REMOVAL",
        }
    }

    /// Parse the stored form. Matching is exact: "in" is not a known kind.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(MovementKind::In),
            "SALE" => Some(MovementKind::Sale),
            "REMOVAL" => Some(MovementKind::Removal),
            _ => None,
        }
    }

    /// Signed contribution of `quantity` units of this kind to a stock balance.
    /// SALE and REMOVAL both decrease stock by the same amount.
    /// Quantities above `MAX_QUANTITY` never reach the store and saturate here.
    pub fn signed(&self, quantity: u64) -> Quantity {
        let units = Quantity::try_from(quantity).unwrap_or(Quantity::MAX);
        match self {
            MovementKind::In => units,
            MovementKind::Sale | MovementKind::Removal => -units,
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single recorded change to the stock of one product.
/// Movements are immutable once stored; the ledger only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Assigned by the repository on append
    pub id: MovementId,
    pub product: String,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub quantity: u64,
    /// When the movement was recorded
    pub timestamp: DateTime<Utc>,
}

impl Movement {
    /// Create a new, not yet persisted movement. The id is assigned by the repository.
    pub fn new(product: impl Into<String>, kind: MovementKind, quantity: u64) -> Self {
        Self {
            id: 0,
            product: product.into(),
            kind,
            quantity,
            timestamp: Utc::now(),
        }
    }

    /// Signed effect of this movement on its product's stock.
    pub fn delta(&self) -> Quantity {
        self.kind.signed(self.quantity)
    }
}
