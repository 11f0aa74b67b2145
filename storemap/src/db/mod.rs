//! Accès PostgreSQL : pool, décodage des colonnes, lecture par lots

pub mod decode;
pub mod pool;
pub mod source;

pub use decode::PgValue;
pub use pool::{create_pool, test_connection, DatabaseConfig, SslMode};
pub use source::{fetch_rows, DEFAULT_BATCH_SIZE, DEFAULT_QUERY};
