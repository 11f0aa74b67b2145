//! Diagnostics de la base : pourquoi la vue des comparaisons est-elle vide ?
//!
//! Deux parcours : `diagnose` remonte depuis les tables sources jusqu'à la
//! vue, `quick-check` interroge directement les vues.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;

use geojson_rows::Value;

use crate::db::PgValue;

/// Date de chargement codée en dur dans les vues
pub const VIEW_UPLOAD_DATE: &str = "2025-06-01";

fn view_upload_date() -> Result<NaiveDate> {
    NaiveDate::parse_from_str(VIEW_UPLOAD_DATE, "%Y-%m-%d")
        .with_context(|| format!("Invalid view upload date: {}", VIEW_UPLOAD_DATE))
}

/// Seuil de popularité des vues (nombre de magasins distincts)
pub const POPULAR_THRESHOLD: i64 = 10;

/// Seuil abaissé utilisé pour le test de la vue
pub const RELAXED_THRESHOLD: i64 = 5;

/// Chaînes exclues des comparaisons
const EXCLUDED_CHAINS: &str = "ARRAY['סופר פארם', 'Yellow', 'דור אלון']";

/// Filtre magasins commun à toutes les requêtes (`alias` = table all_stores)
fn store_filter(alias: &str) -> String {
    format!(
        "({a}.chainname <> ALL ({chains})) AND {a}.subchainname <> 'Be' AND {a}.subchainname <> 'אונליין'",
        a = alias,
        chains = EXCLUDED_CHAINS
    )
}

/// Filtre prix : date `$1`, prix strictement positif (`p` = table allprices)
fn price_filter(alias: &str) -> String {
    format!(
        "{p}.upload_date = $1::date AND {p}.itemprice > 0 AND {p}.itemprice IS NOT NULL",
        p = alias
    )
}

/// CTE des articles vendus dans plus de `$2` magasins à la date `$1`
fn popular_items_cte() -> String {
    format!(
        "popular_items AS (
            SELECT ap.itemcode
            FROM allprices ap
            JOIN all_stores st ON ap.store_code = st.store_code
            WHERE {} AND {}
            GROUP BY ap.itemcode
            HAVING count(DISTINCT ap.store_code) > $2
        )",
        price_filter("ap"),
        store_filter("st")
    )
}

/// Formate un entier avec séparateur de milliers (`1234567` -> `1,234,567`)
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

/// Parcours complet depuis les tables sources
pub async fn diagnose(pool: &Pool) -> Result<()> {
    let client = pool
        .get()
        .await
        .context("Failed to get connection from pool")?;

    section("1. Checking available upload dates in allprices table");
    let dates = client
        .query(
            "SELECT upload_date, COUNT(*) AS record_count
             FROM allprices
             WHERE upload_date IS NOT NULL
             GROUP BY upload_date
             ORDER BY upload_date DESC
             LIMIT 10",
            &[],
        )
        .await
        .context("Failed to list upload dates")?;

    let Some(latest) = dates.first() else {
        println!("No data found in allprices table!");
        return Ok(());
    };
    let latest_date: NaiveDate = latest.try_get("upload_date")?;

    println!("Available upload dates:");
    for row in &dates {
        let date: NaiveDate = row.try_get("upload_date")?;
        let count: i64 = row.try_get("record_count")?;
        println!("  {}: {} records", date, group_thousands(count));
    }
    println!("\nLatest date with data: {}", latest_date);

    section("2. Checking all_stores table");
    let store_count: i64 = client
        .query_one("SELECT COUNT(*) AS store_count FROM all_stores", &[])
        .await
        .context("Failed to count stores")?
        .try_get("store_count")?;
    println!("Total stores in all_stores: {}", group_thousands(store_count));

    let chains = client
        .query(
            "SELECT chainname, COUNT(*) AS store_count
             FROM all_stores
             GROUP BY chainname
             ORDER BY store_count DESC
             LIMIT 10",
            &[],
        )
        .await
        .context("Failed to count stores by chain")?;
    println!("\nTop chains by store count:");
    for row in &chains {
        let chain: PgValue = row.try_get("chainname")?;
        let count: i64 = row.try_get("store_count")?;
        println!("  {}: {} stores", chain.0, group_thousands(count));
    }

    section("3. Checking items_new table");
    let item_count: i64 = client
        .query_one("SELECT COUNT(*) AS item_count FROM items_new", &[])
        .await
        .context("Failed to count items")?
        .try_get("item_count")?;
    println!("Total items in items_new: {}", group_thousands(item_count));

    section(&format!("4. Testing with latest date: {}", latest_date));
    let popular_count: i64 = client
        .query_one(
            &format!(
                "WITH {} SELECT COUNT(*) AS popular_item_count FROM popular_items",
                popular_items_cte()
            ),
            &[&latest_date, &POPULAR_THRESHOLD],
        )
        .await
        .context("Failed to count popular items")?
        .try_get("popular_item_count")?;
    println!(
        "Popular items (>{} stores) with latest date: {}",
        POPULAR_THRESHOLD,
        group_thousands(popular_count)
    );

    if popular_count == 0 {
        println!("\n⚠️  No popular items found! Let's check with lower threshold...");
        let stats = client
            .query_one(
                &format!(
                    "WITH store_counts AS (
                        SELECT ap.itemcode, count(DISTINCT ap.store_code) AS store_count
                        FROM allprices ap
                        JOIN all_stores st ON ap.store_code = st.store_code
                        WHERE {} AND {}
                        GROUP BY ap.itemcode
                    )
                    SELECT
                        COUNT(*) AS total_items,
                        COUNT(CASE WHEN store_count >= 5 THEN 1 END) AS items_5_plus_stores,
                        COUNT(CASE WHEN store_count >= 3 THEN 1 END) AS items_3_plus_stores,
                        MAX(store_count) AS max_stores_per_item
                    FROM store_counts",
                    price_filter("ap"),
                    store_filter("st")
                ),
                &[&latest_date],
            )
            .await
            .context("Failed to compute threshold statistics")?;

        let five: i64 = stats.try_get("items_5_plus_stores")?;
        let three: i64 = stats.try_get("items_3_plus_stores")?;
        let max: Option<i64> = stats.try_get("max_stores_per_item")?;
        println!("Items with 5+ stores: {}", group_thousands(five));
        println!("Items with 3+ stores: {}", group_thousands(three));
        match max {
            Some(m) => println!("Max stores per item: {}", m),
            None => println!("Max stores per item: None"),
        }
    }

    section("5. Testing store_price_comparisons view with latest date");
    let combinations: i64 = client
        .query_one(&store_item_diffs_query(), &[&latest_date, &RELAXED_THRESHOLD])
        .await
        .context("Failed to test store price comparisons")?
        .try_get("total_store_items")?;
    println!(
        "Store-item combinations with valid price differences: {}",
        group_thousands(combinations)
    );

    if combinations > 0 {
        println!(
            "\n✅ Success! Data found with date {} and lower threshold ({}+ stores)",
            latest_date, RELAXED_THRESHOLD
        );
        println!(
            "\nSuggested fix: Update your views to use '{}' instead of '{}'",
            latest_date, VIEW_UPLOAD_DATE
        );
        println!(
            "And consider lowering the popular items threshold from {} to {} stores",
            POPULAR_THRESHOLD, RELAXED_THRESHOLD
        );
    } else {
        println!("\n❌ Still no data found. There might be other issues...");
    }

    Ok(())
}

/// Reconstitution de la vue avec date `$1` et seuil `$2`
fn store_item_diffs_query() -> String {
    format!(
        "WITH {popular},
        avg_prices AS (
            SELECT i.itemcode, avg(p.itemprice) AS average_price
            FROM popular_items pi
            JOIN items_new i ON pi.itemcode = i.itemcode
            JOIN allprices p ON i.itemcode = p.itemcode
            JOIN all_stores s ON p.store_code = s.store_code
            WHERE {prices_p} AND {stores_s}
            GROUP BY i.itemcode
        ),
        store_item_price_diffs AS (
            SELECT s.store_code,
                p.itemcode,
                CASE
                    WHEN ap.average_price > 0
                        THEN (p.itemprice - ap.average_price) / ap.average_price * 100
                    ELSE NULL
                END AS price_diff_percent
            FROM all_stores s
            JOIN allprices p ON s.store_code = p.store_code
            JOIN avg_prices ap ON p.itemcode = ap.itemcode
            WHERE {prices_p} AND {stores_s}
        )
        SELECT COUNT(*) AS total_store_items
        FROM store_item_price_diffs
        WHERE price_diff_percent IS NOT NULL",
        popular = popular_items_cte(),
        prices_p = price_filter("p"),
        stores_s = store_filter("s"),
    )
}

/// Vérification rapide des vues
pub async fn quick_check(pool: &Pool) -> Result<()> {
    let client = pool
        .get()
        .await
        .context("Failed to get connection from pool")?;
    let view_date = view_upload_date()?;

    println!("\n1. Testing popular_items_avg_prices view directly...");
    let view_count: i64 = client
        .query_one("SELECT COUNT(*) AS count FROM popular_items_avg_prices", &[])
        .await
        .context("Failed to query popular_items_avg_prices")?
        .try_get("count")?;
    println!(
        "   popular_items_avg_prices has {} records",
        group_thousands(view_count)
    );

    if view_count == 0 {
        println!("\n❌ Problem: popular_items_avg_prices view is empty!");

        println!("\n2. Testing the popular_items CTE separately...");
        let cte_count: i64 = client
            .query_one(
                &format!(
                    "WITH {} SELECT COUNT(*) AS popular_count FROM popular_items",
                    popular_items_cte()
                ),
                &[&view_date, &POPULAR_THRESHOLD],
            )
            .await
            .context("Failed to count popular items")?
            .try_get("popular_count")?;
        println!("   Popular items CTE: {} items", group_thousands(cte_count));

        if cte_count > 0 {
            println!("\n3. Testing the JOIN with items_new...");
            let join_count: i64 = client
                .query_one(
                    &format!(
                        "WITH {} SELECT COUNT(*) AS join_count
                         FROM popular_items pi
                         JOIN items_new i ON pi.itemcode = i.itemcode",
                        popular_items_cte()
                    ),
                    &[&view_date, &POPULAR_THRESHOLD],
                )
                .await
                .context("Failed to join popular items with items_new")?
                .try_get("join_count")?;
            println!("   After JOIN with items_new: {} items", group_thousands(join_count));
        }
        return Ok(());
    }

    println!("✅ popular_items_avg_prices view is working!");
    println!("\n2. Testing store_price_comparisons view...");

    match check_comparisons_view(&client).await {
        Ok(()) => {}
        Err(e) if e.code() == Some(&SqlState::QUERY_CANCELED) => {
            println!("❌ store_price_comparisons view query timed out (>30s)");
            println!("   This suggests a performance issue in the view");
        }
        Err(e) => println!("❌ Error testing store_price_comparisons: {}", e),
    }

    Ok(())
}

async fn check_comparisons_view(client: &tokio_postgres::Client) -> Result<(), tokio_postgres::Error> {
    client.batch_execute("SET statement_timeout = '30s'").await?;

    let count: i64 = client
        .query_one("SELECT COUNT(*) AS count FROM store_price_comparisons", &[])
        .await?
        .try_get("count")?;
    println!("   store_price_comparisons has {} records", group_thousands(count));

    if count == 0 {
        println!("❌ store_price_comparisons view is empty!");
        return Ok(());
    }

    println!("✅ Both views are working!");
    println!("\n3. Testing a sample query...");
    let sample = client
        .query(
            "SELECT store_code, store_name, chainname, city,
                    average_price_diff, popular_item_count,
                    latitude, longitude
             FROM store_price_comparisons
             WHERE latitude IS NOT NULL AND longitude IS NOT NULL
             LIMIT 5",
            &[],
        )
        .await?;

    println!("Sample data:");
    for row in &sample {
        let get = |name: &str| -> Result<Value, tokio_postgres::Error> {
            Ok(row.try_get::<_, PgValue>(name)?.0)
        };
        println!("   {} ({}) - {}", get("store_name")?, get("chainname")?, get("city")?);
        println!(
            "     Price diff: {}%, Items: {}",
            format_price_diff(&get("average_price_diff")?),
            get("popular_item_count")?
        );
        println!("     Coords: {}, {}", get("latitude")?, get("longitude")?);
    }

    Ok(())
}

/// Écart de prix à deux décimales quand il est numérique
fn format_price_diff(value: &Value) -> String {
    match value {
        Value::Float(f) => format!("{:.2}", f),
        Value::Int(i) => format!("{:.2}", *i as f64),
        other => other.to_string(),
    }
}
