//! # storemap
//!
//! Export des comparaisons de prix par magasin vers GeoJSON.
//!
//! ## Features
//!
//! - Conversion CSV → GeoJSON (sans base de données)
//! - Export PostgreSQL → GeoJSON, lecture par lots de 1000 lignes
//! - Diagnostics des vues de comparaison de prix
//! - CLI simple
//!
//! ## Usage CLI
//!
//! ```bash
//! # CSV vers GeoJSON
//! storemap from-csv --input data/store_price_comparisons.csv --output data/stores.geojson
//!
//! # PostgreSQL vers GeoJSON (connexion via .env / PG* / --db-config)
//! storemap from-postgres --output data/stores.geojson
//!
//! # Pourquoi la vue est-elle vide ?
//! storemap diagnose
//! storemap quick-check
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod diagnose;

pub use config::{ConfigError, DatabaseSettings};
pub use db::pool::{create_pool, DatabaseConfig};
