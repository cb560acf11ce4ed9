use std::collections::HashMap;

use crate::data::model::{DataArray, PlotOptions, TimeSeriesVariable};
use crate::error::{TplotError, TplotResult};

// ---------------------------------------------------------------------------
// TimeSeriesStore – the shared catalog of named variables
// ---------------------------------------------------------------------------

/// The registry of [`TimeSeriesVariable`]s, keyed by name.
///
/// One store is constructed per process (or per test) and handed to every
/// operator explicitly; there is no ambient global. Variables live until
/// overwritten; the store never evicts. Enumeration order is insertion
/// order; rewriting an existing name keeps its original position.
///
/// All operations are synchronous and run on the caller's thread. Borrows
/// handed out by [`get`](Self::get) last until the next mutation of the
/// store.
#[derive(Debug, Default)]
pub struct TimeSeriesStore {
    vars: HashMap<String, TimeSeriesVariable>,
    order: Vec<String>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a variable under `name`, replacing any previous one wholesale.
    ///
    /// The inputs are moved in, so the caller keeps no alias to the stored
    /// buffers. Display options start fresh. Fails with
    /// [`TplotError::ShapeMismatch`], leaving the store untouched, when
    /// the time axis and value rows disagree.
    pub fn put(
        &mut self,
        name: &str,
        time: Vec<i64>,
        data: DataArray,
        spec_bins: Option<Vec<f64>>,
    ) -> TplotResult<()> {
        let mut var = TimeSeriesVariable::new(name, time, data);
        var.spec_bins = spec_bins;
        self.put_variable(var)
    }

    /// [`put`](Self::put) for a fully-formed variable, keeping its options
    /// and bins. Operators use this to rewrite a variable in place.
    pub fn put_variable(&mut self, var: TimeSeriesVariable) -> TplotResult<()> {
        check_shape(&var)?;
        if !self.vars.contains_key(&var.name) {
            self.order.push(var.name.clone());
        }
        log::debug!("store: put '{}' ({} samples)", var.name, var.len());
        self.vars.insert(var.name.clone(), var);
        Ok(())
    }

    /// Look up a variable, failing with [`TplotError::NotFound`].
    pub fn get(&self, name: &str) -> TplotResult<&TimeSeriesVariable> {
        self.vars
            .get(name)
            .ok_or_else(|| TplotError::NotFound(name.to_string()))
    }

    /// Mutable access to a variable's display options.
    pub fn options_mut(&mut self, name: &str) -> TplotResult<&mut PlotOptions> {
        self.vars
            .get_mut(name)
            .map(|v| &mut v.options)
            .ok_or_else(|| TplotError::NotFound(name.to_string()))
    }

    /// Append `(time, data)` after the samples already stored under `name`;
    /// an absent name behaves as [`put`](Self::put).
    ///
    /// Nothing is re-sorted or deduplicated: the caller must supply data
    /// chronologically after what is already stored. Existing spectral bins
    /// are retained. Column counts must agree with the stored variable.
    pub fn merge_append(
        &mut self,
        name: &str,
        time: Vec<i64>,
        data: DataArray,
        spec_bins: Option<Vec<f64>>,
    ) -> TplotResult<()> {
        if !self.vars.contains_key(name) {
            return self.put(name, time, data, spec_bins);
        }

        if time.len() != data.rows() {
            return Err(TplotError::ShapeMismatch(format!(
                "'{name}': appended time axis has {} samples but data has {} rows",
                time.len(),
                data.rows()
            )));
        }
        let existing = self.vars.get_mut(name).expect("presence checked above");
        if existing.data.cols() != data.cols() {
            return Err(TplotError::ShapeMismatch(format!(
                "'{name}': cannot append {} columns onto {}",
                data.cols(),
                existing.data.cols()
            )));
        }

        log::debug!(
            "store: append {} samples onto '{name}' ({} held)",
            time.len(),
            existing.len()
        );
        existing.time.extend_from_slice(&time);
        existing.data.extend_rows(&data);
        Ok(())
    }

    /// Insertion-ordered enumeration of all live variable names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Number of live variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

fn check_shape(var: &TimeSeriesVariable) -> TplotResult<()> {
    if var.time.len() != var.data.rows() {
        return Err(TplotError::ShapeMismatch(format!(
            "'{}': time axis has {} samples but data has {} rows",
            var.name,
            var.time.len(),
            var.data.rows()
        )));
    }
    if let Some(bins) = &var.spec_bins {
        if bins.len() != var.data.cols() {
            return Err(TplotError::ShapeMismatch(format!(
                "'{}': {} spectral bins for {} data columns",
                var.name,
                bins.len(),
                var.data.cols()
            )));
        }
    }
    Ok(())
}
