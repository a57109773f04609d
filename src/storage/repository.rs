use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::{Movement, MovementId, MovementKind, Quantity, StockSummary};

use super::MIGRATION_001_INITIAL;

/// Rows that decode into a `Movement`. Tables created by older deployments
/// carry no CHECK constraints and may hold anything; `check` reports those rows.
const DECODABLE_ROWS: &str = "type IN ('IN', 'SALE', 'REMOVAL') AND quantity >= 0 \
     AND product IS NOT NULL AND timestamp IS NOT NULL";

/// Signed stock contribution of a row. Anything that is not an IN decreases stock.
const SIGNED_QUANTITY: &str = "CASE WHEN type = 'IN' THEN quantity ELSE -quantity END";

/// Statistics for ledger integrity verification.
#[derive(Debug, Clone)]
pub struct IntegrityStats {
    pub movement_count: i64,
    pub invalid_kinds: i64,
    pub negative_quantities: i64,
}

/// Repository for appending and querying stock movements.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create the movement table, its index and the append-only triggers.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ========================
    // Ledger store
    // ========================

    /// Append a movement to the log and assign its id.
    pub async fn append_movement(&self, movement: &mut Movement) -> Result<MovementId> {
        let quantity = i64::try_from(movement.quantity)
            .with_context(|| format!("Quantity {} is too large to store", movement.quantity))?;

        let row = sqlx::query(
            r#"
            INSERT INTO stock_movements (product, type, quantity, timestamp)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&movement.product)
        .bind(movement.kind.as_str())
        .bind(quantity)
        .bind(movement.timestamp.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to append movement")?;

        movement.id = row.get("id");
        Ok(movement.id)
    }

    /// Get a movement by id. Rows that don't decode into a `Movement` are
    /// treated as absent.
    pub async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>> {
        let query = format!(
            "SELECT id, product, type, quantity, timestamp FROM stock_movements WHERE id = ? AND {}",
            DECODABLE_ROWS
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch movement")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_movement(&row)?)),
            None => Ok(None),
        }
    }

    /// List all movements, ordered by id.
    pub async fn list_movements(&self) -> Result<Vec<Movement>> {
        let query = format!(
            "SELECT id, product, type, quantity, timestamp FROM stock_movements WHERE {} ORDER BY id",
            DECODABLE_ROWS
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list movements")?;

        rows.iter().map(Self::row_to_movement).collect()
    }

    /// List the movements of one product, oldest first.
    pub async fn list_movements_for_product(
        &self,
        product: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Movement>> {
        let mut query = format!(
            "SELECT id, product, type, quantity, timestamp FROM stock_movements WHERE product = ? AND {} ORDER BY id",
            DECODABLE_ROWS
        );

        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let rows = sqlx::query(&query)
            .bind(product)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list movements for product")?;

        rows.iter().map(Self::row_to_movement).collect()
    }

    // ========================
    // Balance calculation
    // ========================

    /// Compute the stock of a product using SQL aggregation.
    /// Unknown products have no rows and yield 0.
    pub async fn compute_stock(&self, product: &str) -> Result<Quantity> {
        let query = format!(
            "SELECT COALESCE(SUM({}), 0) AS stock FROM stock_movements WHERE product = ?",
            SIGNED_QUANTITY
        );

        let row = sqlx::query(&query)
            .bind(product)
            .fetch_one(&self.pool)
            .await
            .context("Failed to compute stock")?;

        Ok(row.get("stock"))
    }

    /// Compute stock for all products in a single query.
    /// Products with no movements won't be in the map (stock = 0).
    pub async fn compute_all_stock(&self) -> Result<HashMap<String, Quantity>> {
        self.aggregate_stock("product IS NOT NULL").await
    }

    /// Stock per product counting only rows that decode into a `Movement`,
    /// i.e. the rows a replay of `list_movements` sees.
    pub async fn compute_all_decodable_stock(&self) -> Result<HashMap<String, Quantity>> {
        self.aggregate_stock(DECODABLE_ROWS).await
    }

    async fn aggregate_stock(&self, filter: &str) -> Result<HashMap<String, Quantity>> {
        let query = format!(
            "SELECT product, SUM({}) AS stock FROM stock_movements WHERE {} GROUP BY product",
            SIGNED_QUANTITY, filter
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to compute all stock")?;

        let mut levels = HashMap::new();
        for row in rows {
            let product: String = row.get("product");
            let stock: Quantity = row.get("stock");
            levels.insert(product, stock);
        }

        Ok(levels)
    }

    /// Per-kind totals for one product.
    pub async fn summarize_product(&self, product: &str) -> Result<StockSummary> {
        let query = format!(
            r#"
            SELECT
                COALESCE(SUM({}), 0) AS stock,
                COALESCE(SUM(CASE WHEN type = 'IN' THEN quantity ELSE 0 END), 0) AS received,
                COALESCE(SUM(CASE WHEN type = 'SALE' THEN quantity ELSE 0 END), 0) AS sold,
                COALESCE(SUM(CASE WHEN type = 'REMOVAL' THEN quantity ELSE 0 END), 0) AS removed,
                COUNT(*) AS movements
            FROM stock_movements
            WHERE product = ?
            "#,
            SIGNED_QUANTITY
        );

        let row = sqlx::query(&query)
            .bind(product)
            .fetch_one(&self.pool)
            .await
            .context("Failed to summarize product")?;

        Ok(StockSummary {
            product: product.to_string(),
            stock: row.get("stock"),
            received: row.get("received"),
            sold: row.get("sold"),
            removed: row.get("removed"),
            movements: row.get("movements"),
        })
    }

    /// Get statistics for integrity checking.
    pub async fn get_integrity_stats(&self) -> Result<IntegrityStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS movement_count,
                COALESCE(SUM(CASE WHEN type IS NULL OR type NOT IN ('IN', 'SALE', 'REMOVAL') THEN 1 ELSE 0 END), 0) AS invalid_kinds,
                COALESCE(SUM(CASE WHEN quantity < 0 THEN 1 ELSE 0 END), 0) AS negative_quantities
            FROM stock_movements
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to get integrity stats")?;

        Ok(IntegrityStats {
            movement_count: row.get("movement_count"),
            invalid_kinds: row.get("invalid_kinds"),
            negative_quantities: row.get("negative_quantities"),
        })
    }

    fn row_to_movement(row: &sqlx::sqlite::SqliteRow) -> Result<Movement> {
        let kind_str: String = row.get("type");
        let quantity: i64 = row.get("quantity");
        let timestamp_str: String = row.get("timestamp");

        Ok(Movement {
            id: row.get("id"),
            product: row.get("product"),
            kind: MovementKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid movement type: {}", kind_str))?,
            quantity: u64::try_from(quantity)
                .with_context(|| format!("Invalid quantity: {}", quantity))?,
            timestamp: parse_timestamp(&timestamp_str)?,
        })
    }
}

/// Parse a stored timestamp. Rows written by older deployments use a naive
/// ISO 8601 form without offset; those are taken as UTC.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .with_context(|| format!("Invalid timestamp: {}", s))
}
