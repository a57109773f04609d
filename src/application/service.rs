use std::path::Path;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::domain::{
    build_integrity_report, IntegrityReport, Movement, MovementId, MovementKind, StockLevel,
    StockSummary, MAX_QUANTITY,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing the stock ledger operations.
/// This is the primary interface for any client (HTTP API, CLI).
///
/// Cloning is cheap: clones share the underlying connection pool.
#[derive(Clone)]
pub struct StockService {
    repo: Repository,
}

impl StockService {
    /// Create a new stock service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open the database at the given path, creating the file, its parent
    /// directory and the movement table when missing.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        debug!(database = database_path, "Database ready");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Ledger operations
    // ========================

    /// Append a movement and return it with its assigned id.
    pub async fn record_movement(
        &self,
        product: &str,
        kind: MovementKind,
        quantity: u64,
    ) -> Result<Movement, AppError> {
        if quantity > MAX_QUANTITY {
            return Err(AppError::InvalidQuantity(quantity.to_string()));
        }

        let mut movement = Movement::new(product, kind, quantity);
        self.repo.append_movement(&mut movement).await?;

        info!(
            id = movement.id,
            product = %movement.product,
            kind = %movement.kind,
            quantity = movement.quantity,
            "Recorded stock movement"
        );
        Ok(movement)
    }

    /// Get a movement by id.
    pub async fn get_movement(&self, id: MovementId) -> Result<Movement, AppError> {
        self.repo
            .get_movement(id)
            .await?
            .ok_or(AppError::MovementNotFound(id))
    }

    /// List movements, optionally restricted to one product, oldest first.
    pub async fn list_movements(
        &self,
        product: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Movement>, AppError> {
        match product {
            Some(product) => Ok(self.repo.list_movements_for_product(product, limit).await?),
            None => {
                let mut movements = self.repo.list_movements().await?;
                if let Some(limit) = limit {
                    movements.truncate(limit);
                }
                Ok(movements)
            }
        }
    }

    // ========================
    // Balance operations
    // ========================

    /// Get the stock of a single product. Unknown products have stock 0.
    pub async fn get_stock(&self, product: &str) -> Result<StockLevel, AppError> {
        let stock = self.repo.compute_stock(product).await?;
        Ok(StockLevel {
            product: product.to_string(),
            stock,
        })
    }

    /// Get stock levels for every product with movements, sorted by product.
    pub async fn get_all_stock(&self) -> Result<Vec<StockLevel>, AppError> {
        let levels = self.repo.compute_all_stock().await?;

        let mut levels: Vec<StockLevel> = levels
            .into_iter()
            .map(|(product, stock)| StockLevel { product, stock })
            .collect();
        levels.sort_by(|a, b| a.product.cmp(&b.product));

        Ok(levels)
    }

    /// Get the per-kind breakdown of a product's movements.
    pub async fn get_summary(&self, product: &str) -> Result<StockSummary, AppError> {
        Ok(self.repo.summarize_product(product).await?)
    }

    // ========================
    // Integrity operations
    // ========================

    /// Replay the full log and compare it against the store's aggregates.
    /// Undecodable rows are counted in the stats, not in the stock comparison.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let stats = self.repo.get_integrity_stats().await?;
        let movements = self.repo.list_movements().await?;
        let stored = self.repo.compute_all_decodable_stock().await?;

        let mut report = build_integrity_report(
            &movements,
            &stored,
            stats.invalid_kinds,
            stats.negative_quantities,
        );
        report.movement_count = stats.movement_count;

        if !report.is_healthy() {
            warn!(issues = report.issues.len(), "Ledger integrity check found issues");
        }
        Ok(report)
    }
}

/// Parse a movement kind typed by a person. Case-insensitive.
pub fn parse_kind(input: &str) -> Result<MovementKind, AppError> {
    MovementKind::from_str(&input.trim().to_uppercase())
        .ok_or_else(|| AppError::InvalidMovementKind(input.to_string()))
}

/// Parse a non-negative whole quantity no larger than `MAX_QUANTITY`.
pub fn parse_quantity(input: &str) -> Result<u64, AppError> {
    input
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|quantity| *quantity <= MAX_QUANTITY)
        .ok_or_else(|| AppError::InvalidQuantity(input.to_string()))
}
