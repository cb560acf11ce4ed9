use crate::data::model::{DataArray, TimeSeriesVariable};
use crate::data::store::TimeSeriesStore;
use crate::error::{TplotError, TplotResult};

// ---------------------------------------------------------------------------
// Time derivative
// ---------------------------------------------------------------------------

/// Differentiate the variable `name` with respect to time.
///
/// Forward difference per column: output row `i` is
/// `(values[i+1] - values[i]) / (time[i+1] - time[i])`, aligned to the
/// input grid with the last sample dropped, so the result is one row
/// shorter. Spectral bins carry through unchanged.
///
/// With `target == None` the variable is rewritten in place with a copy of
/// its display options; with a target name the result is stored fresh
/// there. Fails with [`TplotError::InsufficientData`], leaving the store
/// unchanged, when the variable has fewer than two samples.
pub fn derive(store: &mut TimeSeriesStore, name: &str, target: Option<&str>) -> TplotResult<()> {
    let var = store.get(name)?;
    let n = var.len();
    if n < 2 {
        return Err(TplotError::InsufficientData(format!(
            "cannot differentiate '{name}' with {n} sample(s)"
        )));
    }
    let var = var.clone();

    let cols = var.data.cols();
    let mut values: Vec<f64> = Vec::with_capacity((n - 1) * cols);
    for i in 0..n - 1 {
        let dt = (var.time[i + 1] - var.time[i]) as f64;
        let row = var.data.row(i);
        let next = var.data.row(i + 1);
        for c in 0..cols {
            values.push((next[c] - row[c]) / dt);
        }
    }
    let time = var.time[..n - 1].to_vec();
    let data = DataArray::with_cols(values, cols)?;

    log::debug!("derive '{name}': {n} samples -> {}", n - 1);

    match target {
        None => {
            let mut out = TimeSeriesVariable::new(name, time, data);
            out.spec_bins = var.spec_bins.clone();
            out.options = var.options.clone();
            store.put_variable(out)
        }
        Some(target) => store.put(target, time, data, var.spec_bins.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_difference_drops_last_sample() {
        let mut store = TimeSeriesStore::new();
        store
            .put(
                "a",
                vec![0, 1, 2, 3],
                DataArray::scalar(vec![0.0, 1.0, 4.0, 9.0]),
                None,
            )
            .unwrap();

        derive(&mut store, "a", None).unwrap();
        let var = store.get("a").unwrap();
        assert_eq!(var.time, vec![0, 1, 2]);
        assert_eq!(var.data.values(), &[1.0, 3.0, 5.0]);
    }

    #[test]
    fn uneven_cadence_divides_by_actual_interval() {
        let mut store = TimeSeriesStore::new();
        store
            .put(
                "a",
                vec![0, 2, 10],
                DataArray::scalar(vec![0.0, 4.0, 8.0]),
                None,
            )
            .unwrap();

        derive(&mut store, "a", Some("a_dot")).unwrap();
        let var = store.get("a_dot").unwrap();
        assert_eq!(var.time, vec![0, 2]);
        assert_eq!(var.data.values(), &[2.0, 0.5]);
        // Source untouched when a target is given.
        assert_eq!(store.get("a").unwrap().len(), 3);
    }

    #[test]
    fn one_sample_is_insufficient_and_store_unchanged() {
        let mut store = TimeSeriesStore::new();
        store
            .put("a", vec![5], DataArray::scalar(vec![1.0]), None)
            .unwrap();

        let err = derive(&mut store, "a", None);
        assert!(matches!(err, Err(TplotError::InsufficientData(_))));

        let var = store.get("a").unwrap();
        assert_eq!(var.time, vec![5]);
        assert_eq!(var.data.values(), &[1.0]);
    }

    #[test]
    fn missing_variable_is_not_found() {
        let mut store = TimeSeriesStore::new();
        assert!(matches!(
            derive(&mut store, "ghost", None),
            Err(TplotError::NotFound(_))
        ));
    }

    #[test]
    fn spectral_bins_carry_through() {
        let mut store = TimeSeriesStore::new();
        let data = DataArray::with_cols(vec![0.0, 0.0, 2.0, 4.0, 6.0, 12.0], 2).unwrap();
        store
            .put("s", vec![0, 2, 4], data, Some(vec![10.0, 20.0]))
            .unwrap();

        derive(&mut store, "s", None).unwrap();
        let var = store.get("s").unwrap();
        assert_eq!(var.time, vec![0, 2]);
        assert_eq!(var.data.cols(), 2);
        assert_eq!(var.data.values(), &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(var.spec_bins, Some(vec![10.0, 20.0]));
    }

    #[test]
    fn derived_options_are_a_copy() {
        let mut store = TimeSeriesStore::new();
        store
            .put("a", vec![0, 1], DataArray::scalar(vec![0.0, 2.0]), None)
            .unwrap();
        store.options_mut("a").unwrap().axis_label = Some("v".into());

        derive(&mut store, "a", None).unwrap();
        assert_eq!(
            store.get("a").unwrap().options.axis_label.as_deref(),
            Some("v")
        );

        // Editing the rewritten variable's options is a local change.
        store.options_mut("a").unwrap().axis_label = Some("dv/dt".into());
        assert_eq!(
            store.get("a").unwrap().options.axis_label.as_deref(),
            Some("dv/dt")
        );
    }
}
