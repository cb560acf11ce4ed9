use std::collections::BTreeMap;
use std::fmt;

use crate::error::{TplotError, TplotResult};

// ---------------------------------------------------------------------------
// MetadataValue – a single display-option value
// ---------------------------------------------------------------------------

/// A dynamically-typed display value for the open half of [`PlotOptions`].
///
/// Instrument files carry arbitrary per-variable attributes; anything the
/// core does not recognize lands here untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.4}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Date(d) => write!(f, "{d}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl MetadataValue {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// PlotOptions – per-variable display options
// ---------------------------------------------------------------------------

/// Display options attached to a stored variable.
///
/// Recognized keys are plain fields; everything else goes into `extras`.
/// The renderer reads these, the core only copies them around: `Clone` is a
/// deep copy, so editing a derived variable's options never touches the
/// source variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlotOptions {
    /// Label for the value axis.
    pub axis_label: Option<String>,
    /// Character size for axis/legend text.
    pub char_size: Option<f64>,
    /// Draw on a transparent background.
    pub transparent_background: bool,
    /// Unrecognized display-only fields: option name → value.
    pub extras: BTreeMap<String, MetadataValue>,
}

// ---------------------------------------------------------------------------
// DataArray – the value block of one variable
// ---------------------------------------------------------------------------

/// Sample values of one variable, row-major with one row per timestamp.
///
/// A plain series has one column; a spectrogram-style variable has one
/// column per spectral bin. NaN marks missing samples throughout.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    values: Vec<f64>,
    cols: usize,
}

impl DataArray {
    /// A rank-1 series: one value per timestamp.
    pub fn scalar(values: Vec<f64>) -> Self {
        DataArray { values, cols: 1 }
    }

    /// A rank-2 block from a flat row-major buffer.
    pub fn with_cols(values: Vec<f64>, cols: usize) -> TplotResult<Self> {
        if cols == 0 || values.len() % cols != 0 {
            return Err(TplotError::ShapeMismatch(format!(
                "{} values cannot fill rows of {} columns",
                values.len(),
                cols
            )));
        }
        Ok(DataArray { values, cols })
    }

    /// Number of rows (timestamps covered).
    pub fn rows(&self) -> usize {
        self.values.len() / self.cols
    }

    /// Number of columns (1 for a plain series).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether this is a rank-1 series.
    pub fn is_scalar(&self) -> bool {
        self.cols == 1
    }

    /// One row of samples.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.cols..(i + 1) * self.cols]
    }

    /// Value at (row, column).
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    /// The flat row-major buffer.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable access to the flat buffer (e.g. fill-value normalization).
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Append the rows of `other`; column counts must already agree.
    pub(crate) fn extend_rows(&mut self, other: &DataArray) {
        debug_assert_eq!(self.cols, other.cols);
        self.values.extend_from_slice(&other.values);
    }
}

// ---------------------------------------------------------------------------
// TimeSeriesVariable – one named series in the registry
// ---------------------------------------------------------------------------

/// A named, time-indexed array with optional spectral bins and display
/// options: the registry's unit of storage.
///
/// Invariants (enforced on every store write):
/// * `time.len() == data.rows()`
/// * `time` ascends; duplicate stamps appear only as a transient merge
///   artifact and must be resolved before the variable is considered stable
/// * `spec_bins.len() == data.cols()` whenever bins are present
#[derive(Debug, Clone)]
pub struct TimeSeriesVariable {
    /// Unique key within the store.
    pub name: String,
    /// Unix seconds, one per row.
    pub time: Vec<i64>,
    /// Sample values, one row per timestamp.
    pub data: DataArray,
    /// The non-time axis of a rank-2 variable (e.g. energy bins).
    /// Immutable once set unless explicitly replaced.
    pub spec_bins: Option<Vec<f64>>,
    /// Display options; deep-copied, never aliased, between variables.
    pub options: PlotOptions,
}

impl TimeSeriesVariable {
    /// Build a variable with default options and no spectral bins.
    pub fn new(name: impl Into<String>, time: Vec<i64>, data: DataArray) -> Self {
        TimeSeriesVariable {
            name: name.into(),
            time,
            data,
            spec_bins: None,
            options: PlotOptions::default(),
        }
    }

    /// Attach spectral bins.
    pub fn with_spec_bins(mut self, bins: Vec<f64>) -> Self {
        self.spec_bins = Some(bins);
        self
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the variable holds no samples.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}
