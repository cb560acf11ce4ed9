use crate::data::model::DataArray;
use crate::data::store::TimeSeriesStore;
use crate::error::TplotResult;
use crate::time;

// ---------------------------------------------------------------------------
// Single-variable ingestion
// ---------------------------------------------------------------------------

/// Write `(time, data)` under `name`, accumulating when asked to.
///
/// With `merge == false`, or when `name` is not yet stored, this is a
/// wholesale [`TimeSeriesStore::put`]. With `merge == true` over an
/// existing name the new samples are appended after the stored ones,
/// sequential-file-append style: no time-based interleaving and no
/// deduplication, so repeated single-file calls over non-overlapping,
/// chronologically ordered files accumulate into one logical series.
pub fn ingest(
    store: &mut TimeSeriesStore,
    name: &str,
    time: Vec<i64>,
    data: DataArray,
    spec_bins: Option<Vec<f64>>,
    merge: bool,
) -> TplotResult<()> {
    if merge && store.contains(name) {
        store.merge_append(name, time, data, spec_bins)
    } else {
        store.put(name, time, data, spec_bins)
    }
}

// ---------------------------------------------------------------------------
// Dataset-level ingestion
// ---------------------------------------------------------------------------

/// Naming and accumulation switches forwarded from the embedding
/// application (simple parameters, no CLI surface of their own).
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Prepended to every stored variable name.
    pub prefix: String,
    /// Appended to every stored variable name.
    pub suffix: String,
    /// Accumulate onto variables already stored under the same name.
    pub merge: bool,
}

impl IngestOptions {
    /// The stored name for a raw variable.
    pub fn variable_name(&self, base: &str) -> String {
        format!("{}{}{}", self.prefix, base, self.suffix)
    }
}

/// The time axis of a raw dataset, as materialized by a format reader.
#[derive(Debug, Clone)]
pub struct RawTimeAxis {
    /// Raw offsets in file order; must be finite and non-decreasing.
    pub values: Vec<f64>,
    /// `<unit> since <reference>` specification; `None` means the offsets
    /// already are unix seconds.
    pub units: Option<String>,
}

/// One raw variable resolved from a file, not yet in the store.
#[derive(Debug, Clone)]
pub struct RawVariable {
    pub name: String,
    pub data: DataArray,
    /// Declared missing-value sentinel, when the file has one. An explicit
    /// field: absence means the values pass through untouched, never that
    /// a lookup failed somewhere.
    pub fill_value: Option<f64>,
    pub spec_bins: Option<Vec<f64>>,
}

/// Everything a format reader hands over for one file.
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub time: RawTimeAxis,
    pub variables: Vec<RawVariable>,
}

/// Ingest a materialized dataset: convert the time axis once, normalize
/// declared fill values to NaN, and store every variable under
/// `prefix + name + suffix`. Returns the stored names in order, the list
/// a renderer is handed afterwards.
pub fn ingest_dataset(
    store: &mut TimeSeriesStore,
    raw: RawDataset,
    opts: &IngestOptions,
) -> TplotResult<Vec<String>> {
    let unix_time: Vec<i64> = match &raw.time.units {
        Some(units) => time::to_unix_seconds(&raw.time.values, units)?,
        None => raw.time.values.iter().map(|v| v.floor() as i64).collect(),
    };

    let mut stored = Vec::with_capacity(raw.variables.len());
    for mut var in raw.variables {
        if let Some(fill) = var.fill_value {
            normalize_fill(&mut var.data, fill);
        }
        let name = opts.variable_name(&var.name);
        ingest(
            store,
            &name,
            unix_time.clone(),
            var.data,
            var.spec_bins,
            opts.merge,
        )?;
        log::info!("ingested tplot variable '{name}'");
        stored.push(name);
    }
    Ok(stored)
}

/// Force samples matching the declared sentinel to NaN so downstream
/// consumers never see a sentinel numeric value. A NaN sentinel means the
/// file already stores missing samples as NaN.
fn normalize_fill(data: &mut DataArray, fill: f64) {
    if fill.is_nan() {
        return;
    }
    for v in data.values_mut() {
        if *v == fill {
            *v = f64::NAN;
        }
    }
}
