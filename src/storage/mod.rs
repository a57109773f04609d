mod repository;

pub use repository::*;

/// SQL bootstrap for the movement log. Idempotent.
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
