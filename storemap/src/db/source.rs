//! Source de lignes PostgreSQL, lue par lots via un portail

use anyhow::{Context, Result};
use deadpool_postgres::Pool;
use tracing::debug;

use geojson_rows::Row;

use super::decode::PgValue;

/// Requête par défaut : la vue des comparaisons de prix par magasin
pub const DEFAULT_QUERY: &str = r#"
SELECT
    store_code,
    store_name,
    chainname,
    subchainname,
    storeid,
    address,
    city,
    zipcode,
    latitude,
    longitude,
    average_price_diff,
    popular_item_count
FROM public.store_price_comparisons
ORDER BY store_code
"#;

/// Taille des lots lus depuis le portail
pub const DEFAULT_BATCH_SIZE: i32 = 1000;

/// Convertit une ligne PostgreSQL en `Row`, colonnes dans l'ordre du SELECT
pub fn to_row(pg_row: &tokio_postgres::Row) -> Result<Row> {
    let mut row = Row::new();
    for (i, column) in pg_row.columns().iter().enumerate() {
        let value: PgValue = pg_row
            .try_get(i)
            .with_context(|| format!("Failed to decode column {}", column.name()))?;
        row.push(column.name(), value.0);
    }
    Ok(row)
}

/// Exécute `query` et passe chaque ligne à `sink`, lot par lot.
///
/// Les lots ne servent qu'à borner la mémoire : l'ordre et le traitement
/// sont ceux d'une lecture ligne à ligne. Retourne le nombre de lignes lues.
pub async fn fetch_rows<F>(pool: &Pool, query: &str, batch_size: i32, mut sink: F) -> Result<usize>
where
    F: FnMut(&Row),
{
    let mut client = pool
        .get()
        .await
        .context("Failed to get connection from pool")?;
    let client: &mut tokio_postgres::Client = &mut client;

    let tx = client
        .build_transaction()
        .read_only(true)
        .start()
        .await
        .context("Failed to start transaction")?;

    let statement = query.trim().trim_end_matches(';');
    let portal = tx
        .bind(statement, &[])
        .await
        .context("Failed to execute query")?;

    let mut total = 0;
    loop {
        let batch = tx
            .query_portal(&portal, batch_size.max(1))
            .await
            .context("Failed to fetch rows")?;
        if batch.is_empty() {
            break;
        }
        debug!(rows = batch.len(), total, "Fetched batch");

        for pg_row in &batch {
            sink(&to_row(pg_row)?);
            total += 1;
        }
    }

    tx.commit().await.context("Failed to close transaction")?;
    Ok(total)
}
