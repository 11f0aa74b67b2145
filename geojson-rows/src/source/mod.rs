//! Sources de lignes
//!
//! Une source est un itérateur de `Result<Row, _>`. La source CSV vit ici ;
//! la source PostgreSQL, asynchrone, est fournie par le binaire `storemap`.

pub mod delimited;

pub use delimited::CsvSource;
