// Database module
// Dual store: SQLite holds the canonical content records, LanceDB holds the
// embedding vectors keyed by record id

pub mod lancedb;
pub mod sqlite;
