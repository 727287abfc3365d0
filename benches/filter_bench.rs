//! Filter throughput over a synthetic collection.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use telemetry_unifier::{apply_filters, detect_shape, unify, FilterSpec, TelemetryRecord};

fn collection(size: usize) -> Vec<TelemetryRecord> {
    let statuses = ["Healthy", "Warning", "Error", "Overheating"];
    (0..size)
        .map(|i| {
            let value = json!({
                "deviceID": format!("PUMP-{}", i % 500),
                "location": format!("Plant {}/Line {}", i % 7, i % 13),
                "timestamp": 1_704_067_200_000i64 + (i as i64) * 60_000,
                "startTime": 1_704_067_200_000i64,
                "endTime": 1_704_067_200_000i64 + ((i % 240) as i64) * 60_000,
                "operationStatus": statuses[i % statuses.len()],
                "temp": 20.0 + (i % 80) as f64,
                "vibration": (i % 10) as f64 / 10.0,
                "deviceType": "pump"
            });
            match detect_shape(&value).into_reading() {
                Some(reading) => unify(&reading),
                None => unreachable!("synthetic reading is flat"),
            }
        })
        .collect()
}

fn bench_filters(c: &mut Criterion) {
    let records = collection(10_000);

    let all_constraints = FilterSpec {
        search: Some("plant 3".to_string()),
        status: Some("Warning".to_string()),
        temperature_min: Some(30.0),
        temperature_max: Some(90.0),
        duration_min: Some(10.0),
        duration_max: Some(200.0),
        date_from: NaiveDate::from_ymd_opt(2024, 1, 1),
        date_to: NaiveDate::from_ymd_opt(2024, 1, 5),
    };

    c.bench_function("filter_empty_spec_10k", |b| {
        b.iter(|| apply_filters(black_box(&records), black_box(&FilterSpec::default())))
    });

    c.bench_function("filter_all_constraints_10k", |b| {
        b.iter(|| apply_filters(black_box(&records), black_box(&all_constraints)))
    });
}

criterion_group!(benches, bench_filters);
criterion_main!(benches);
