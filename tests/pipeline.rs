//! End-to-end checks: materialize real files, ingest them into a store,
//! and run the operators over the result.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{Float64Array, Float64Builder, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use rusty_tplot::ingest::reader::load_file;
use rusty_tplot::{
    degap, derive, ingest_dataset, FillPolicy, IngestOptions, TimeSeriesStore,
};

fn scratch_file(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rusty_tplot_it_{}", std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir.join(name)
}

fn nan_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| (x.is_nan() && y.is_nan()) || x == y)
}

#[test]
fn json_ingest_converts_time_and_prefixes_names() {
    let path = scratch_file("goes.json");
    fs::write(
        &path,
        r#"{
            "time": { "units": "seconds since 2000-01-01 12:00:00", "values": [0.0, 60.0] },
            "variables": {
                "density": { "values": [1.5, -9999.0], "fill_value": -9999.0 }
            }
        }"#,
    )
    .unwrap();

    let mut store = TimeSeriesStore::new();
    let opts = IngestOptions {
        prefix: "g15_".into(),
        ..Default::default()
    };
    let stored = ingest_dataset(&mut store, load_file(&path).unwrap(), &opts).unwrap();
    assert_eq!(stored, vec!["g15_density".to_string()]);

    let var = store.get("g15_density").unwrap();
    // 2000-01-01T12:00:00Z is 946728000 unix seconds.
    assert_eq!(var.time, vec![946_728_000, 946_728_060]);
    assert_eq!(var.data.value(0, 0), 1.5);
    assert!(var.data.value(1, 0).is_nan());
}

#[test]
fn merge_accumulates_consecutive_files() {
    let first = scratch_file("day1.json");
    let second = scratch_file("day2.json");
    fs::write(
        &first,
        r#"{ "time": { "values": [0.0, 1.0] },
             "variables": { "flux": { "values": [1.0, 2.0] } } }"#,
    )
    .unwrap();
    fs::write(
        &second,
        r#"{ "time": { "values": [2.0, 3.0] },
             "variables": { "flux": { "values": [3.0, 4.0] } } }"#,
    )
    .unwrap();

    let mut store = TimeSeriesStore::new();
    let opts = IngestOptions {
        merge: true,
        ..Default::default()
    };
    ingest_dataset(&mut store, load_file(&first).unwrap(), &opts).unwrap();
    ingest_dataset(&mut store, load_file(&second).unwrap(), &opts).unwrap();

    let var = store.get("flux").unwrap();
    assert_eq!(var.time, vec![0, 1, 2, 3]);
    assert_eq!(var.data.values(), &[1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn csv_through_degap_and_derive() {
    let path = scratch_file("series.csv");
    fs::write(
        &path,
        "time,gappy,pos\n0,1.0,0.0\n4,2.0,1.0\n12,4.0,4.0\n16,5.0,9.0\n",
    )
    .unwrap();

    let mut store = TimeSeriesStore::new();
    ingest_dataset(
        &mut store,
        load_file(&path).unwrap(),
        &IngestOptions::default(),
    )
    .unwrap();

    degap(&mut store, "gappy", 4, 0, FillPolicy::Nan, None).unwrap();
    let gappy = store.get("gappy").unwrap();
    assert_eq!(gappy.time, vec![0, 4, 8, 12, 16]);
    assert!(nan_eq(
        gappy.data.values(),
        &[1.0, 2.0, f64::NAN, 4.0, 5.0]
    ));

    derive(&mut store, "pos", Some("vel")).unwrap();
    let vel = store.get("vel").unwrap();
    assert_eq!(vel.time, vec![0, 4, 12]);
    assert_eq!(vel.data.values(), &[0.25, 0.375, 1.25]);

    let names: Vec<&str> = store.names().collect();
    assert_eq!(names, vec!["gappy", "pos", "vel"]);
}

#[test]
fn parquet_spectral_column_with_metadata() {
    let path = scratch_file("spectra.parquet");

    let mut flux_builder = ListBuilder::new(Float64Builder::new());
    for row in 0..3 {
        let values = flux_builder.values();
        values.append_value(10.0 + row as f64);
        values.append_value(20.0 + row as f64);
        flux_builder.append(true);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("time", DataType::Float64, false).with_metadata(HashMap::from([(
            "units".to_string(),
            "minutes since 1970-01-01".to_string(),
        )])),
        Field::new("density", DataType::Float64, false).with_metadata(HashMap::from([(
            "missing_value".to_string(),
            "-9999".to_string(),
        )])),
        Field::new(
            "eflux",
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        )
        .with_metadata(HashMap::from([("bins".to_string(), "100;300".to_string())])),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(vec![0.0, 1.0, 2.0])),
            Arc::new(Float64Array::from(vec![5.0, -9999.0, 6.0])),
            Arc::new(flux_builder.finish()),
        ],
    )
    .unwrap();

    let file = fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let mut store = TimeSeriesStore::new();
    ingest_dataset(
        &mut store,
        load_file(&path).unwrap(),
        &IngestOptions::default(),
    )
    .unwrap();

    let density = store.get("density").unwrap();
    assert_eq!(density.time, vec![0, 60, 120]);
    assert!(density.data.value(1, 0).is_nan());

    let eflux = store.get("eflux").unwrap();
    assert_eq!(eflux.data.cols(), 2);
    assert_eq!(eflux.spec_bins, Some(vec![100.0, 300.0]));
    assert_eq!(eflux.data.row(2), &[12.0, 22.0]);

    // Spectral variables differentiate per bin.
    derive(&mut store, "eflux", None).unwrap();
    let deflux = store.get("eflux").unwrap();
    assert_eq!(deflux.time, vec![0, 60]);
    assert_eq!(deflux.data.values(), &[1.0 / 60.0, 1.0 / 60.0, 1.0 / 60.0, 1.0 / 60.0]);
    assert_eq!(deflux.spec_bins, Some(vec![100.0, 300.0]));
}
