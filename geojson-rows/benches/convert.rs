//! Benchmarks de la conversion lignes -> GeoJSON
//!
//! Exécution: `cargo bench -p geojson-rows`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geojson_rows::{convert, writer, ConvertOptions, ConvertError, Row, Value};

/// Génère des lignes synthétiques de type "comparaison de prix"
fn synthetic_rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            let mut row = Row::new();
            row.push("store_code", format!("{:05}", i));
            row.push("store_name", format!("Store {}", i));
            row.push("city", "Tel Aviv");
            row.push("latitude", format!("{:.5}", 29.5 + (i % 400) as f64 * 0.01));
            row.push("longitude", format!("{:.5}", 34.2 + (i % 200) as f64 * 0.01));
            row.push(
                "average_price_diff",
                if i % 50 == 0 {
                    Value::from("NaN")
                } else {
                    Value::from(format!("{:.3}", (i % 21) as f64 - 10.0))
                },
            );
            row.push("popular_item_count", (i % 300).to_string());
            row
        })
        .collect()
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");

    for size in [1_000usize, 10_000] {
        let rows = synthetic_rows(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("rows", size), &rows, |b, rows| {
            b.iter(|| {
                let source = rows.iter().cloned().map(Ok::<_, ConvertError>);
                let (geojson, _) = convert(source, ConvertOptions::default()).unwrap();
                black_box(geojson)
            })
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let rows = synthetic_rows(10_000);
    let (geojson, _) = convert(
        rows.into_iter().map(Ok::<_, ConvertError>),
        ConvertOptions::default(),
    )
    .unwrap();

    c.bench_function("render_10000", |b| {
        b.iter(|| black_box(writer::render(&geojson).unwrap()))
    });
}

criterion_group!(benches, bench_convert, bench_render);
criterion_main!(benches);
