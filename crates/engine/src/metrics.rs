//! Columnar projection of history rows
//!
//! History is stored row by row, one mapping per logged step. Plotting wants
//! columns: for every metric key, one value per row, all index-aligned.
//! [`MetricsProjector`] does that transposition, filling gaps with null so
//! that no row is ever dropped.

use std::collections::{BTreeMap, BTreeSet};

use runscope_core::{HistoryRow, Value};
use serde::Serialize;

/// Step column, always present in a projection
pub const STEP_KEY: &str = "_step";

/// Columns conventionally used as the x axis
pub const AXIS_KEYS: [&str; 6] = ["_step", "iter", "info/epochs", "step", "_timestamp", "_runtime"];

/// Internal keys still listed by [`MetricsProjector::list_available_metrics`]
pub const LISTED_INTERNAL_KEYS: [&str; 3] = ["_step", "_timestamp", "_runtime"];

/// Prefix marking producer-internal keys
pub const INTERNAL_PREFIX: char = '_';

/// Rows sampled to pick metric keys when none are requested
pub const PROJECTION_SAMPLE_ROWS: usize = 10;

/// Rows sampled by `list_available_metrics`
pub const AVAILABLE_SAMPLE_ROWS: usize = 100;

/// Below this many keys, `list_available_metrics` rescans every row
pub const AVAILABLE_WIDEN_THRESHOLD: usize = 3;

/// Metric key → one value per history row (numeric or null)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricSeries(BTreeMap<String, Vec<Value>>);

impl MetricSeries {
    /// Column for `key`
    pub fn get(&self, key: &str) -> Option<&[Value]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Whether `key` has a column
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Column keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(key, column)` pairs, sorted by key
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No columns at all (empty history)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of rows; every column has this length
    pub fn row_count(&self) -> usize {
        self.0.values().next().map(Vec::len).unwrap_or(0)
    }

    /// Unwrap into the underlying map
    pub fn into_inner(self) -> BTreeMap<String, Vec<Value>> {
        self.0
    }
}

fn is_internal(key: &str) -> bool {
    key.starts_with(INTERNAL_PREFIX)
}

fn numeric_or_null(value: Option<&Value>) -> Value {
    match value {
        Some(v) if v.is_numeric() => v.clone(),
        _ => Value::Null,
    }
}

/// History → columns
pub struct MetricsProjector;

impl MetricsProjector {
    /// Project `history` into columns
    ///
    /// With `requested` set, exactly those keys are projected. Otherwise the
    /// first [`PROJECTION_SAMPLE_ROWS`] rows pick every non-internal key that
    /// holds a number in some sampled row. Axis columns are added on top and
    /// dropped again if entirely null; `_step` always stays and falls back to
    /// the row's position when a row has no `_step`. Non-numeric values
    /// (booleans included) project as null.
    ///
    /// Unlike the producer's own tooling, which counts `true`/`false` as
    /// integers, booleans are not numbers here: a key that only ever holds
    /// booleans is never auto-selected.
    pub fn project(history: &[HistoryRow], requested: Option<&[String]>) -> MetricSeries {
        if history.is_empty() {
            return MetricSeries::default();
        }

        let metric_keys: BTreeSet<String> = match requested {
            Some(keys) => keys.iter().cloned().collect(),
            None => history
                .iter()
                .take(PROJECTION_SAMPLE_ROWS)
                .flat_map(|row| row.iter())
                .filter(|(key, value)| value.is_numeric() && !is_internal(key))
                .map(|(key, _)| key.clone())
                .collect(),
        };

        let mut columns: BTreeMap<String, Vec<Value>> = metric_keys
            .into_iter()
            .chain(AXIS_KEYS.iter().map(|k| k.to_string()))
            .map(|key| (key, Vec::with_capacity(history.len())))
            .collect();

        for (position, row) in history.iter().enumerate() {
            for (key, column) in columns.iter_mut() {
                let value = if key == STEP_KEY {
                    match row.get(STEP_KEY) {
                        None => Value::Int(position as i64),
                        step => numeric_or_null(step),
                    }
                } else {
                    numeric_or_null(row.get(key))
                };
                column.push(value);
            }
        }

        for axis in AXIS_KEYS.iter().filter(|k| **k != STEP_KEY) {
            let all_null = columns
                .get(*axis)
                .map(|column| column.iter().all(Value::is_null))
                .unwrap_or(false);
            if all_null {
                columns.remove(*axis);
            }
        }

        MetricSeries(columns)
    }

    /// Numeric keys worth offering for plotting, sorted
    ///
    /// Samples the first [`AVAILABLE_SAMPLE_ROWS`] rows, keeping non-internal
    /// keys plus [`LISTED_INTERNAL_KEYS`]. If that finds fewer than
    /// [`AVAILABLE_WIDEN_THRESHOLD`] keys and the history is longer than the
    /// sample, every row is scanned for non-internal numeric keys as well.
    /// Boolean-valued keys are never listed.
    pub fn list_available_metrics(history: &[HistoryRow]) -> Vec<String> {
        let sample = history.len().min(AVAILABLE_SAMPLE_ROWS);
        let mut keys: BTreeSet<String> = history[..sample]
            .iter()
            .flat_map(|row| row.iter())
            .filter(|(key, value)| {
                value.is_numeric()
                    && (!is_internal(key) || LISTED_INTERNAL_KEYS.contains(&key.as_str()))
            })
            .map(|(key, _)| key.clone())
            .collect();

        if keys.len() < AVAILABLE_WIDEN_THRESHOLD && history.len() > sample {
            keys.extend(
                history
                    .iter()
                    .flat_map(|row| row.iter())
                    .filter(|(key, value)| value.is_numeric() && !is_internal(key))
                    .map(|(key, _)| key.clone()),
            );
        }

        keys.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(json: &str) -> Vec<HistoryRow> {
        serde_json::from_str::<Vec<Value>>(json)
            .unwrap()
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                other => panic!("not an object: {:?}", other),
            })
            .collect()
    }

    fn column(values: &[Option<f64>]) -> Vec<Value> {
        values
            .iter()
            .map(|v| v.map(Value::Float).unwrap_or(Value::Null))
            .collect()
    }

    #[test]
    fn test_projection_fills_gaps_with_null() {
        let history = rows(r#"[{"_step": 0, "loss": 1.0}, {"_step": 1, "loss": 0.5, "acc": 0.9}]"#);
        let series = MetricsProjector::project(&history, None);

        let keys: Vec<_> = series.keys().collect();
        assert_eq!(keys, vec!["_step", "acc", "loss"]);
        assert_eq!(series.get("_step").unwrap(), &[Value::Int(0), Value::Int(1)]);
        assert_eq!(series.get("loss").unwrap(), column(&[Some(1.0), Some(0.5)]).as_slice());
        assert_eq!(series.get("acc").unwrap(), column(&[None, Some(0.9)]).as_slice());
        assert_eq!(series.row_count(), 2);
    }

    #[test]
    fn test_step_defaults_to_position() {
        let history = rows(r#"[{"loss": 1.0}, {"loss": 2.0, "_step": 10}, {"loss": 3.0}]"#);
        let series = MetricsProjector::project(&history, None);
        assert_eq!(
            series.get("_step").unwrap(),
            &[Value::Int(0), Value::Int(10), Value::Int(2)]
        );
    }

    #[test]
    fn test_axis_columns_kept_only_when_present() {
        let history = rows(
            r#"[{"_step": 0, "_runtime": 1.5, "loss": 1.0},
                {"_step": 1, "_runtime": 2.5, "loss": 0.5}]"#,
        );
        let series = MetricsProjector::project(&history, None);
        assert!(series.contains_key("_runtime"));
        assert!(!series.contains_key("_timestamp"));
        assert!(!series.contains_key("iter"));
        assert!(!series.contains_key("info/epochs"));
    }

    #[test]
    fn test_non_numeric_values_project_as_null() {
        let history = rows(
            r#"[{"loss": 1.0, "phase": "warmup", "done": false},
                {"loss": "nan-string", "phase": 2, "done": true}]"#,
        );
        let series = MetricsProjector::project(&history, None);
        // phase is numeric in row 2, so it is selected; done never is
        assert!(!series.contains_key("done"));
        assert_eq!(series.get("phase").unwrap(), &[Value::Null, Value::Int(2)]);
        assert_eq!(series.get("loss").unwrap(), &[Value::Float(1.0), Value::Null]);
    }

    #[test]
    fn test_requested_keys_only() {
        let history = rows(r#"[{"_step": 0, "loss": 1.0, "acc": 0.1, "lr": 0.01}]"#);
        let requested = vec!["acc".to_string(), "missing".to_string()];
        let series = MetricsProjector::project(&history, Some(&requested));
        let keys: Vec<_> = series.keys().collect();
        assert_eq!(keys, vec!["_step", "acc", "missing"]);
        assert_eq!(series.get("missing").unwrap(), &[Value::Null]);
    }

    #[test]
    fn test_auto_selection_samples_first_rows() {
        let mut json = String::from("[");
        for i in 0..12 {
            if i > 0 {
                json.push(',');
            }
            if i == 11 {
                json.push_str(r#"{"late": 1}"#);
            } else {
                json.push_str(&format!(r#"{{"loss": {}}}"#, i));
            }
        }
        json.push(']');
        let series = MetricsProjector::project(&rows(&json), None);
        assert!(series.contains_key("loss"));
        assert!(!series.contains_key("late"));
        assert_eq!(series.row_count(), 12);
    }

    #[test]
    fn test_empty_history() {
        assert!(MetricsProjector::project(&[], None).is_empty());
        assert!(MetricsProjector::list_available_metrics(&[]).is_empty());
    }

    #[test]
    fn test_available_metrics_includes_known_internal_keys() {
        let history = rows(
            r#"[{"_step": 0, "_timestamp": 1.0, "_runtime": 0.1, "_internal": 5,
                 "loss": 1.0, "name": "x", "flag": true}]"#,
        );
        assert_eq!(
            MetricsProjector::list_available_metrics(&history),
            vec!["_runtime", "_step", "_timestamp", "loss"]
        );
    }

    #[test]
    fn test_available_metrics_widens_past_sample() {
        let mut history = rows(r#"[{"_step": 0}]"#);
        let filler = history[0].clone();
        history.extend(std::iter::repeat(filler).take(AVAILABLE_SAMPLE_ROWS));
        history.extend(rows(r#"[{"late_metric": 1.0, "_late_internal": 2.0}]"#));

        let keys = MetricsProjector::list_available_metrics(&history);
        assert_eq!(keys, vec!["_step", "late_metric"]);
    }

    #[test]
    fn test_available_metrics_no_widening_with_enough_keys() {
        let mut history = rows(r#"[{"a": 1, "b": 2, "c": 3}]"#);
        let filler = history[0].clone();
        history.extend(std::iter::repeat(filler).take(AVAILABLE_SAMPLE_ROWS));
        history.extend(rows(r#"[{"late": 1.0}]"#));

        let keys = MetricsProjector::list_available_metrics(&history);
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_series_serializes_as_plain_map() {
        let history = rows(r#"[{"_step": 0, "loss": 1.5}]"#);
        let json = serde_json::to_string(&MetricsProjector::project(&history, None)).unwrap();
        assert_eq!(json, r#"{"_step":[0],"loss":[1.5]}"#);
    }
}
