use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::StockService;
use crate::domain::{Movement, StockLevel};

/// Full ledger snapshot for JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub movements: Vec<Movement>,
    pub stock: Vec<StockLevel>,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    service: &'a StockService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a StockService) -> Self {
        Self { service }
    }

    /// Export every movement to CSV, oldest first
    pub async fn export_movements_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let movements = self.service.list_movements(None, None).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "product", "type", "quantity", "timestamp"])?;

        for movement in &movements {
            csv_writer.write_record(&[
                movement.id.to_string(),
                movement.product.clone(),
                movement.kind.as_str().to_string(),
                movement.quantity.to_string(),
                movement.timestamp.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(movements.len())
    }

    /// Export every movement as a JSON array
    pub async fn export_movements_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let movements = self.service.list_movements(None, None).await?;

        serde_json::to_writer_pretty(&mut writer, &movements)?;
        writer.flush()?;

        Ok(movements.len())
    }

    /// Export current stock levels to CSV
    pub async fn export_stock_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let levels = self.service.get_all_stock().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Header comes from the StockLevel field names
        for level in &levels {
            csv_writer.serialize(level)?;
        }
        if levels.is_empty() {
            csv_writer.write_record(["product", "stock"])?;
        }

        csv_writer.flush()?;
        Ok(levels.len())
    }

    /// Export stock levels as a JSON array
    pub async fn export_stock_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let levels = self.service.get_all_stock().await?;

        serde_json::to_writer_pretty(&mut writer, &levels)?;
        writer.flush()?;

        Ok(levels.len())
    }

    /// Export the whole ledger as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let movements = self.service.list_movements(None, None).await?;
        let stock = self.service.get_all_stock().await?;

        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            movements,
            stock,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
