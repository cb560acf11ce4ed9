use crate::data::model::{DataArray, TimeSeriesVariable};
use crate::data::store::TimeSeriesStore;
use crate::error::TplotResult;

// ---------------------------------------------------------------------------
// Gap filling
// ---------------------------------------------------------------------------

/// What to write at synthesized timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolicy {
    /// Insert NaN rows.
    Nan,
    /// Repeat the nearest preceding original row.
    Forward,
}

/// Fill sampling gaps in the variable `name`.
///
/// Successive timestamps further apart than `expected_step + margin`
/// (both in seconds) form a gap. Each gap is bridged with timestamps at
/// `expected_step` spacing starting from its left edge, and the variable
/// is reindexed onto the sorted, deduplicated union of original and
/// synthesized stamps. Original samples keep their values; synthesized
/// ones are filled per `fill`. Neither policy interpolates.
///
/// With `target == None` the variable is rewritten in place, keeping its
/// name, position, and a copy of its display options; with a target name
/// the result is stored fresh there, preserving spectral bins.
///
/// A `margin` of zero makes any deviation from the exact cadence a gap.
/// Timestamps are expected strictly increasing; duplicate stamps are a
/// transient merge artifact the caller resolves first.
///
/// # Panics
///
/// Panics when `expected_step` is not positive or `margin` is negative.
pub fn degap(
    store: &mut TimeSeriesStore,
    name: &str,
    expected_step: i64,
    margin: i64,
    fill: FillPolicy,
    target: Option<&str>,
) -> TplotResult<()> {
    assert!(expected_step > 0, "expected_step must be positive");
    assert!(margin >= 0, "margin must be non-negative");
    let var = store.get(name)?.clone();

    let mut synthesized: Vec<i64> = Vec::new();
    for pair in var.time.windows(2) {
        if pair[1] - pair[0] > expected_step + margin {
            let mut t = pair[0];
            while t < pair[1] {
                synthesized.push(t);
                t += expected_step;
            }
        }
    }

    if synthesized.is_empty() && target.is_none() {
        return Ok(());
    }

    let mut new_time: Vec<i64> = var.time.iter().copied().chain(synthesized).collect();
    new_time.sort_unstable();
    new_time.dedup();

    let cols = var.data.cols();
    let mut values: Vec<f64> = Vec::with_capacity(new_time.len() * cols);
    let mut next_original = 0usize;
    let mut last_original: Option<usize> = None;
    for &t in &new_time {
        if next_original < var.time.len() && var.time[next_original] == t {
            values.extend_from_slice(var.data.row(next_original));
            last_original = Some(next_original);
            next_original += 1;
        } else {
            match (fill, last_original) {
                (FillPolicy::Forward, Some(row)) => values.extend_from_slice(var.data.row(row)),
                _ => values.extend(std::iter::repeat(f64::NAN).take(cols)),
            }
        }
    }

    log::debug!(
        "degap '{name}': {} samples synthesized (step {expected_step}, margin {margin})",
        new_time.len() - var.time.len()
    );

    let data = DataArray::with_cols(values, cols)?;
    match target {
        None => {
            let mut out = TimeSeriesVariable::new(name, new_time, data);
            out.spec_bins = var.spec_bins.clone();
            out.options = var.options.clone();
            store.put_variable(out)
        }
        Some(target) => store.put(target, new_time, data, var.spec_bins.clone()),
    }
}
