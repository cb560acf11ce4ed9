use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Array, Float64Builder, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use rusty_tplot::ingest::reader::load_file;
use rusty_tplot::{ingest_dataset, IngestOptions, TimeSeriesStore};

const TIME_UNITS: &str = "seconds since 2000-01-01 12:00:00";
const FILL_VALUE: f64 = -9999.0;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    // Time axis: 1-minute cadence over three hours, with a 15-minute
    // telemetry dropout for degap to chew on.
    let time_offsets: Vec<f64> = (0..180)
        .filter(|&i| !(60..75).contains(&i))
        .map(|i| i as f64 * 60.0)
        .collect();
    let n = time_offsets.len();

    // Plain variable: slowly varying density with noise; every 23rd sample
    // is replaced by the instrument's declared fill value.
    let density: Vec<f64> = time_offsets
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            if i % 23 == 22 {
                FILL_VALUE
            } else {
                5.0 + gaussian(t, 4500.0, 1800.0, 3.0) + rng.gauss(0.0, 0.2)
            }
        })
        .collect();

    // Spectral variable: per-sample flux over 8 energy bins, falling off
    // towards higher energies.
    let bins: Vec<f64> = (0..8).map(|b| 10.0 * 3.0_f64.powi(b)).collect();
    let mut flux_builder = ListBuilder::new(Float64Builder::new());
    for i in 0..n {
        let values = flux_builder.values();
        for (b, _) in bins.iter().enumerate() {
            let level = 1000.0 / (b + 1) as f64;
            values.append_value(level + rng.gauss(0.0, level * 0.05) + i as f64);
        }
        flux_builder.append(true);
    }
    let flux_array = flux_builder.finish();

    let time_array = Float64Array::from(time_offsets);
    let density_array = Float64Array::from(density);

    let bins_spec = bins
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(";");
    let schema = Arc::new(Schema::new(vec![
        Field::new("time", DataType::Float64, false).with_metadata(HashMap::from([(
            "units".to_string(),
            TIME_UNITS.to_string(),
        )])),
        Field::new("proton_density", DataType::Float64, false).with_metadata(HashMap::from([(
            "missing_value".to_string(),
            FILL_VALUE.to_string(),
        )])),
        Field::new(
            "electron_flux",
            DataType::List(Arc::new(Field::new("item", DataType::Float64, true))),
            false,
        )
        .with_metadata(HashMap::from([("bins".to_string(), bins_spec)])),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(time_array),
            Arc::new(density_array),
            Arc::new(flux_array),
        ],
    )
    .expect("Failed to create RecordBatch");

    let output_path = "sample_data.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!("Wrote {n} samples to {output_path}");

    // Load it straight back through the registry as a smoke check.
    let raw = load_file(Path::new(output_path)).expect("Failed to re-read sample file");
    let mut store = TimeSeriesStore::new();
    let stored = ingest_dataset(&mut store, raw, &IngestOptions::default())
        .expect("Failed to ingest sample file");
    for name in &stored {
        let var = store.get(name).expect("stored variable");
        log::info!(
            "'{}': {} samples, {} column(s), t0={}",
            name,
            var.len(),
            var.data.cols(),
            var.time.first().copied().unwrap_or_default()
        );
    }
}
