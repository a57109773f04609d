// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use stockledger::application::StockService;
use stockledger::domain::MovementKind;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(StockService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = StockService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Record a batch of movements in order
pub async fn record_all(
    service: &StockService,
    movements: &[(&str, MovementKind, u64)],
) -> Result<()> {
    for (product, kind, quantity) in movements {
        service.record_movement(product, *kind, *quantity).await?;
    }
    Ok(())
}

/// The movements from the reference example: 100 in, 30 sold, 5 removed
pub fn widget_example() -> Vec<(&'static str, MovementKind, u64)> {
    vec![
        ("widget", MovementKind::In, 100),
        ("widget", MovementKind::Sale, 30),
        ("widget", MovementKind::Removal, 5),
    ]
}
