//! Définition et implémentation des commandes CLI
//!
//! - `from-csv`: CSV → GeoJSON (sans DB)
//! - `from-postgres`: requête PostgreSQL → GeoJSON
//! - `diagnose` / `quick-check`: diagnostics des vues de comparaison

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use geojson_rows::{
    writer, CollectionBuilder, ConversionReport, ConvertOptions, CoordinateColumns, TextPolicy,
};

use crate::config::{self, DatabaseSettings};
use crate::db;

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a CSV file with latitude/longitude columns to GeoJSON
    FromCsv {
        /// Input CSV file (header row required)
        #[arg(short, long, default_value = "data/store_price_comparisons.csv")]
        input: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Export the result of a PostgreSQL query to GeoJSON
    FromPostgres {
        /// SQL query (default: the store_price_comparisons view)
        #[arg(long, conflicts_with = "query_file")]
        query: Option<String>,

        /// File containing the SQL query
        #[arg(long)]
        query_file: Option<PathBuf>,

        /// Rows fetched per batch
        #[arg(long, default_value_t = crate::db::DEFAULT_BATCH_SIZE)]
        batch_size: i32,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Explain why store_price_comparisons returns no rows (full walk from source tables)
    Diagnose {
        #[command(flatten)]
        db: DbArgs,
    },

    /// Quick check of the comparison views
    QuickCheck {
        #[command(flatten)]
        db: DbArgs,
    },
}

/// Options de sortie communes aux exports
#[derive(Args)]
pub struct OutputArgs {
    /// Output GeoJSON file
    #[arg(short, long, default_value = "data/stores.geojson")]
    pub output: PathBuf,

    /// Latitude column name
    #[arg(long, default_value = "latitude")]
    pub lat_column: String,

    /// Longitude column name
    #[arg(long, default_value = "longitude")]
    pub lng_column: String,

    /// Save the conversion report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl OutputArgs {
    fn columns(&self) -> CoordinateColumns {
        CoordinateColumns {
            latitude: self.lat_column.clone(),
            longitude: self.lng_column.clone(),
        }
    }
}

/// Options de connexion PostgreSQL
#[derive(Args)]
pub struct DbArgs {
    /// JSON file with connection settings (host, port, database, user, password, ssl_mode)
    #[arg(long)]
    pub db_config: Option<PathBuf>,

    /// PostgreSQL host (défaut : env PGHOST / localhost)
    #[arg(long)]
    pub host: Option<String>,

    /// PostgreSQL port (défaut : env PGPORT / 5432)
    #[arg(long)]
    pub port: Option<u16>,

    /// PostgreSQL database name (défaut : env PGDATABASE)
    #[arg(long)]
    pub database: Option<String>,

    /// PostgreSQL user (défaut : env PGUSER)
    #[arg(long)]
    pub user: Option<String>,

    /// PostgreSQL password (défaut : env PGPASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// SSL mode: disable, prefer, require (défaut : env PGSSLMODE / disable)
    #[arg(long)]
    pub ssl: Option<String>,
}

impl DbArgs {
    fn overrides(&self) -> DatabaseSettings {
        DatabaseSettings {
            host: self.host.clone(),
            port: self.port,
            dbname: self.database.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            pool_size: None,
            ssl_mode: self.ssl.clone(),
        }
    }

    /// Résout la configuration, crée le pool et vérifie la connexion
    async fn connect(&self) -> Result<deadpool_postgres::Pool> {
        let db_config = config::resolve(self.db_config.as_deref(), self.overrides())?;
        println!("Connecting to PostgreSQL database {}...", db_config);

        let pool = db::create_pool(&db_config)?;
        db::test_connection(&pool).await?;
        Ok(pool)
    }
}

/// Exécute la commande from-csv
pub fn cmd_from_csv(input: &Path, output: &OutputArgs) -> Result<()> {
    info!(input = %input.display(), output = %output.output.display(), "Converting CSV");

    let report = geojson_rows::csv_to_geojson(input, &output.output, output.columns())
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    finish_report(&report, output)
}

/// Exécute la commande from-postgres
pub async fn cmd_from_postgres(
    query: Option<String>,
    query_file: Option<&Path>,
    batch_size: i32,
    output: &OutputArgs,
    db_args: &DbArgs,
) -> Result<()> {
    let query = match (query, query_file) {
        (Some(q), _) => q,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file: {}", path.display()))?,
        (None, None) => db::DEFAULT_QUERY.to_string(),
    };

    let pool = db_args.connect().await?;

    let mut builder = CollectionBuilder::new(ConvertOptions {
        columns: output.columns(),
        text_policy: TextPolicy::Verbatim,
    });

    println!("Executing query...");
    let rows = db::fetch_rows(&pool, &query, batch_size, |row| {
        builder.push_row(row);
    })
    .await?;
    pool.close();
    println!("Database connection closed");
    info!(rows, features = builder.len(), "Query complete");

    let (geojson, mut report) = geojson_rows::finish(builder);
    writer::write_geojson(geojson, &output.output, &mut report)
        .with_context(|| format!("Failed to write {}", output.output.display()))?;

    finish_report(&report, output)
}

/// Exécute la commande diagnose
pub async fn cmd_diagnose(db_args: &DbArgs) -> Result<()> {
    let pool = db_args.connect().await?;
    crate::diagnose::diagnose(&pool).await?;
    pool.close();
    Ok(())
}

/// Exécute la commande quick-check
pub async fn cmd_quick_check(db_args: &DbArgs) -> Result<()> {
    let pool = db_args.connect().await?;
    crate::diagnose::quick_check(&pool).await?;
    pool.close();
    Ok(())
}

fn finish_report(report: &ConversionReport, output: &OutputArgs) -> Result<()> {
    report.display();
    println!("Converted {} features to GeoJSON", report.features_written);
    println!("Output saved to {}", output.output.display());

    if let Some(path) = &output.report {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to save report: {}", path.display()))?;
        println!("Report saved to {}", path.display());
    }
    Ok(())
}
