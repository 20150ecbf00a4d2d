use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use statview::format::period::{Period, PeriodMode};
use statview::report::dataset::{OverviewRecord, SiteDataset};
use statview::report::series::{build_series, sorted_properties};
use statview::report::views::Reports;
use std::collections::BTreeMap;
use std::hint::black_box;

fn record(i: u64) -> OverviewRecord {
    OverviewRecord {
        hits: Some(i * 7),
        pages: Some(i * 3),
        visits: Some(i),
        visitors: Some(i / 2),
        bandwidth: Some(i * 4096),
    }
}

/// Overview keyed like the report files: one key per day, per month and per
/// year, covering `years` years starting in 2000.
fn make_overview(years: u32) -> BTreeMap<String, OverviewRecord> {
    let mut overview = BTreeMap::new();
    let mut i = 0u64;
    for year in 2000..2000 + years {
        overview.insert(format!("{year}"), record(i));
        for month in 1..=12u32 {
            overview.insert(format!("{year}{month:02}"), record(i));
            for day in 1..=28u32 {
                overview.insert(format!("{year}{month:02}{day:02}"), record(i));
                i += 1;
            }
        }
    }
    overview
}

fn bench_build_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_series");

    for years in [1, 10, 50] {
        // Sorting runs once; only the scan for one period is measured
        let sorted = sorted_properties(make_overview(years));

        group.bench_with_input(BenchmarkId::new("month", years), &sorted, |b, sorted| {
            b.iter(|| build_series(black_box(sorted), black_box("200006"), PeriodMode::Month));
        });
        group.bench_with_input(BenchmarkId::new("year", years), &sorted, |b, sorted| {
            b.iter(|| build_series(black_box(sorted), black_box("2000"), PeriodMode::Year));
        });
    }

    group.finish();
}

fn bench_reports(c: &mut Criterion) {
    let mut group = c.benchmark_group("reports");

    let dataset = SiteDataset {
        url: "http://bench.example.com".to_string(),
        periods: vec!["200006".to_string()],
        overview: make_overview(10),
        ..SiteDataset::default()
    };
    let period = Period::parse("200006").unwrap();

    group.bench_function("build_month_10y", |b| {
        b.iter(|| Reports::build(black_box(&dataset), black_box(&period)));
    });

    group.finish();
}

criterion_group!(benches, bench_build_series, bench_reports);
criterion_main!(benches);
