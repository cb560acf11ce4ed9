use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array, LargeListArray,
    ListArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use crate::data::model::DataArray;
use crate::ingest::merge::{RawDataset, RawTimeAxis, RawVariable};

/// Conventional name of the time coordinate column.
pub const DEFAULT_TIME_COLUMN: &str = "time";

/// Reader knobs resolved before the file is opened.
///
/// When a file names its time axis unconventionally, whoever resolves that
/// (never this crate; there is no prompting here) passes the resolved
/// column name along.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Column holding the time coordinate; `"time"` when unset. Ignored by
    /// the JSON format, whose schema names the axis explicitly.
    pub time_column: Option<String>,
}

impl ReadOptions {
    fn time_column(&self) -> &str {
        self.time_column.as_deref().unwrap_or(DEFAULT_TIME_COLUMN)
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Materialize a raw dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat table, one row per sample; the time column carries a
///   `units` field-metadata entry, variables may carry `missing_value` and
///   (for List columns) `bins`
/// * `.json`    – `{"time": {"units", "values"}, "variables": {...}}`
/// * `.csv`     – header `time,<var>,...`; the time header may embed units
///   in parentheses
pub fn load_file(path: &Path) -> Result<RawDataset> {
    load_file_with(path, &ReadOptions::default())
}

/// [`load_file`] with an externally-resolved time column.
pub fn load_file_with(path: &Path, opts: &ReadOptions) -> Result<RawDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path, opts),
        "json" => load_json(path),
        "csv" => load_csv(path, opts),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema:
///
/// ```json
/// {
///   "time": { "units": "seconds since 2000-01-01 12:00:00", "values": [0.0, 60.0] },
///   "variables": {
///     "density": { "values": [1.2, 1.4], "fill_value": -9999.0 },
///     "flux":    { "values": [[1, 2], [3, 4]], "bins": [10.0, 20.0] }
///   }
/// }
/// ```
#[derive(Deserialize)]
struct JsonDataset {
    time: JsonTimeAxis,
    #[serde(default)]
    variables: BTreeMap<String, JsonVariable>,
}

#[derive(Deserialize)]
struct JsonTimeAxis {
    #[serde(default)]
    units: Option<String>,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct JsonVariable {
    values: JsonValues,
    #[serde(default)]
    fill_value: Option<f64>,
    #[serde(default)]
    bins: Option<Vec<f64>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonValues {
    Scalar(Vec<f64>),
    Spectral(Vec<Vec<f64>>),
}

fn load_json(path: &Path) -> Result<RawDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    from_json_str(&text)
}

/// Parse the JSON dataset format from a string.
pub fn from_json_str(text: &str) -> Result<RawDataset> {
    let parsed: JsonDataset = serde_json::from_str(text).context("parsing JSON dataset")?;

    let mut variables = Vec::with_capacity(parsed.variables.len());
    for (name, var) in parsed.variables {
        let data = match var.values {
            JsonValues::Scalar(values) => DataArray::scalar(values),
            JsonValues::Spectral(rows) => spectral_rows(rows, &name)?,
        };
        variables.push(RawVariable {
            name,
            data,
            fill_value: var.fill_value,
            spec_bins: var.bins,
        });
    }

    Ok(RawDataset {
        time: RawTimeAxis {
            values: parsed.time.values,
            units: parsed.time.units,
        },
        variables,
    })
}

/// Flatten nested sample rows into a row-major block, rejecting ragged input.
fn spectral_rows(rows: Vec<Vec<f64>>, name: &str) -> Result<DataArray> {
    let cols = match rows.first() {
        Some(first) => first.len(),
        None => return Ok(DataArray::scalar(Vec::new())),
    };
    let mut values = Vec::with_capacity(rows.len() * cols);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != cols {
            bail!("'{name}': row {i} has {} values, expected {cols}", row.len());
        }
        values.extend_from_slice(row);
    }
    Ok(DataArray::with_cols(values, cols)?)
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one sample per record. The
/// time column may carry a units specification in parentheses:
/// `time (hours since 2024-01-01),density,t_air`. Otherwise its values
/// are taken as unix seconds. Empty cells read as NaN.
fn load_csv(path: &Path, opts: &ReadOptions) -> Result<RawDataset> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file, opts)
}

fn read_csv<R: Read>(input: R, opts: &ReadOptions) -> Result<RawDataset> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let time_name = opts.time_column();
    let (time_idx, units) = find_time_column(&headers, time_name)
        .with_context(|| format!("CSV missing '{time_name}' column"))?;

    let mut time_values: Vec<f64> = Vec::new();
    let mut columns: Vec<(usize, String, Vec<f64>)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_idx)
        .map(|(i, name)| (i, name.clone(), Vec::new()))
        .collect();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        time_values.push(parse_float(record.get(time_idx).unwrap_or(""), row_no, time_name)?);
        for (idx, name, values) in &mut columns {
            values.push(parse_float(record.get(*idx).unwrap_or(""), row_no, name)?);
        }
    }

    Ok(RawDataset {
        time: RawTimeAxis {
            values: time_values,
            units,
        },
        variables: columns
            .into_iter()
            .map(|(_, name, values)| RawVariable {
                name,
                data: DataArray::scalar(values),
                fill_value: None,
                spec_bins: None,
            })
            .collect(),
    })
}

/// Locate the time column, either by exact name or as `name (units...)`.
fn find_time_column(headers: &[String], name: &str) -> Option<(usize, Option<String>)> {
    for (i, header) in headers.iter().enumerate() {
        if header == name {
            return Some((i, None));
        }
        if let Some(rest) = header.strip_prefix(name) {
            if let Some(units) = rest
                .trim_start()
                .strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
            {
                return Some((i, Some(units.trim().to_string())));
            }
        }
    }
    None
}

fn parse_float(token: &str, row: usize, col: &str) -> Result<f64> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(f64::NAN);
    }
    token
        .parse::<f64>()
        .with_context(|| format!("row {row}, column '{col}': '{token}' is not a number"))
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

enum VarKind {
    Scalar,
    Spectral,
}

struct VarAccumulator {
    index: usize,
    name: String,
    kind: VarKind,
    fill_value: Option<f64>,
    bins: Option<Vec<f64>>,
    values: Vec<f64>,
    cols: Option<usize>,
}

/// Load a Parquet file containing time-series data.
///
/// Expected schema, one row per sample:
/// - the time column: Float64/Float32/Int64/Int32, with an optional `units`
///   entry in its field metadata
/// - plain variables: Float64/Float32/Int64/Int32 columns, optional
///   `missing_value` field metadata
/// - spectral variables: List<Float64> or LargeList<Float64> columns,
///   optional `bins` field metadata (semicolon-separated floats)
/// - anything else (strings, descriptor columns) is skipped
fn load_parquet(path: &Path, opts: &ReadOptions) -> Result<RawDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let time_name = opts.time_column();
    let time_idx = schema
        .index_of(time_name)
        .map_err(|_| anyhow!("Parquet file missing '{time_name}' column"))?;
    let units = schema.field(time_idx).metadata().get("units").cloned();

    let mut vars: Vec<VarAccumulator> = Vec::new();
    for (i, field) in schema.fields().iter().enumerate() {
        if i == time_idx {
            continue;
        }
        let kind = match field.data_type() {
            DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32 => {
                VarKind::Scalar
            }
            DataType::List(_) | DataType::LargeList(_) => VarKind::Spectral,
            other => {
                log::debug!("skipping non-numeric column '{}' ({other:?})", field.name());
                continue;
            }
        };
        let fill_value = match field.metadata().get("missing_value") {
            Some(s) => Some(s.trim().parse::<f64>().with_context(|| {
                format!("column '{}': bad missing_value '{s}'", field.name())
            })?),
            None => None,
        };
        let bins = match field.metadata().get("bins") {
            Some(s) => Some(parse_semicolon_floats(s, field.name())?),
            None => None,
        };
        vars.push(VarAccumulator {
            index: i,
            name: field.name().clone(),
            kind,
            fill_value,
            bins,
            values: Vec::new(),
            cols: None,
        });
    }

    let mut time_values: Vec<f64> = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        time_values.extend(column_to_f64(batch.column(time_idx), time_name)?);

        for var in &mut vars {
            let col = batch.column(var.index);
            match var.kind {
                VarKind::Scalar => var.values.extend(column_to_f64(col, &var.name)?),
                VarKind::Spectral => {
                    for row in 0..batch.num_rows() {
                        let row_values = extract_f64_list(col, row)
                            .with_context(|| format!("column '{}', row {row}", var.name))?;
                        match var.cols {
                            None => var.cols = Some(row_values.len()),
                            Some(cols) if cols != row_values.len() => bail!(
                                "column '{}': row {row} has {} values, expected {cols}",
                                var.name,
                                row_values.len()
                            ),
                            Some(_) => {}
                        }
                        var.values.extend(row_values);
                    }
                }
            }
        }
    }

    Ok(RawDataset {
        time: RawTimeAxis {
            values: time_values,
            units,
        },
        variables: vars
            .into_iter()
            .map(|var| {
                let data = match var.kind {
                    VarKind::Scalar => DataArray::scalar(var.values),
                    VarKind::Spectral => DataArray::with_cols(var.values, var.cols.unwrap_or(1))?,
                };
                Ok(RawVariable {
                    name: var.name,
                    data,
                    fill_value: var.fill_value,
                    spec_bins: var.bins,
                })
            })
            .collect::<Result<Vec<_>>>()?,
    })
}

// -- Parquet / Arrow helpers --

/// Read a whole numeric column as `f64`, nulls becoming NaN.
fn column_to_f64(col: &ArrayRef, name: &str) -> Result<Vec<f64>> {
    match col.data_type() {
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            Ok(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            Ok(arr.iter().map(|v| v.map(f64::from).unwrap_or(f64::NAN)).collect())
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            Ok(arr.iter().map(|v| v.map(|x| x as f64).unwrap_or(f64::NAN)).collect())
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            Ok(arr.iter().map(|v| v.map(f64::from).unwrap_or(f64::NAN)).collect())
        }
        other => bail!("column '{name}': unsupported numeric type {other:?}"),
    }
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &ArrayRef, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

fn parse_semicolon_floats(s: &str, col: &str) -> Result<Vec<f64>> {
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("column '{col}', bins[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_scalar_and_spectral_variables() {
        let text = r#"{
            "time": { "units": "seconds since 1970-01-01", "values": [0.0, 1.0] },
            "variables": {
                "density": { "values": [1.5, -9999.0], "fill_value": -9999.0 },
                "flux": { "values": [[1.0, 2.0], [3.0, 4.0]], "bins": [10.0, 20.0] }
            }
        }"#;

        let raw = from_json_str(text).unwrap();
        assert_eq!(raw.time.values, vec![0.0, 1.0]);
        assert_eq!(raw.time.units.as_deref(), Some("seconds since 1970-01-01"));

        // BTreeMap ordering: density before flux.
        assert_eq!(raw.variables.len(), 2);
        let density = &raw.variables[0];
        assert_eq!(density.name, "density");
        assert_eq!(density.fill_value, Some(-9999.0));
        assert!(density.data.is_scalar());

        let flux = &raw.variables[1];
        assert_eq!(flux.data.cols(), 2);
        assert_eq!(flux.data.row(1), &[3.0, 4.0]);
        assert_eq!(flux.spec_bins, Some(vec![10.0, 20.0]));
    }

    #[test]
    fn json_without_units_or_variables() {
        let raw = from_json_str(r#"{ "time": { "values": [0.0] } }"#).unwrap();
        assert!(raw.time.units.is_none());
        assert!(raw.variables.is_empty());
    }

    #[test]
    fn json_ragged_spectral_rows_rejected() {
        let text = r#"{
            "time": { "values": [0.0, 1.0] },
            "variables": { "flux": { "values": [[1.0, 2.0], [3.0]] } }
        }"#;
        assert!(from_json_str(text).is_err());
    }

    #[test]
    fn json_missing_time_rejected() {
        assert!(from_json_str(r#"{ "variables": {} }"#).is_err());
    }

    #[test]
    fn csv_with_units_in_header() {
        let text = "time (hours since 2024-01-01),t_air\n0.0,270.5\n1.0,\n2.0,271.0\n";
        let raw = read_csv(text.as_bytes(), &ReadOptions::default()).unwrap();

        assert_eq!(raw.time.values, vec![0.0, 1.0, 2.0]);
        assert_eq!(raw.time.units.as_deref(), Some("hours since 2024-01-01"));
        assert_eq!(raw.variables.len(), 1);
        let t_air = &raw.variables[0];
        assert_eq!(t_air.name, "t_air");
        assert_eq!(t_air.data.value(0, 0), 270.5);
        assert!(t_air.data.value(1, 0).is_nan());
    }

    #[test]
    fn csv_plain_time_column_means_unix_seconds() {
        let text = "time,v\n100,1.0\n200,2.0\n";
        let raw = read_csv(text.as_bytes(), &ReadOptions::default()).unwrap();
        assert!(raw.time.units.is_none());
        assert_eq!(raw.time.values, vec![100.0, 200.0]);
    }

    #[test]
    fn csv_resolved_time_column_name() {
        let text = "epoch,v\n0,1.0\n";
        let opts = ReadOptions {
            time_column: Some("epoch".into()),
        };
        let raw = read_csv(text.as_bytes(), &opts).unwrap();
        assert_eq!(raw.time.values, vec![0.0]);

        // And the conventional name no longer matches.
        assert!(read_csv(text.as_bytes(), &ReadOptions::default()).is_err());
    }

    #[test]
    fn semicolon_floats() {
        assert_eq!(
            parse_semicolon_floats("10.0; 20.0;30", "bins").unwrap(),
            vec![10.0, 20.0, 30.0]
        );
        assert!(parse_semicolon_floats("10.0;x", "bins").is_err());
    }
}
