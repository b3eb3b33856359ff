//! Statistics Calculator Module
//! Descriptive statistics, min-max scaling and growth rates.

use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics of one numeric column (pandas `describe()` layout).
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

/// Handles the numeric helpers shared by the metrics engine.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Summarize the non-missing values of a column.
    pub fn summarize(column: &str, values: &[Option<f64>]) -> ColumnSummary {
        let present: Vec<f64> = values.iter().flatten().copied().collect();

        let mut sorted = present.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        ColumnSummary {
            column: column.to_string(),
            count: present.len(),
            mean: present.iter().mean(),
            std: present.iter().std_dev(),
            min: Statistics::min(present.iter()),
            p25: Self::percentile(&sorted, 25.0),
            p50: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: Statistics::max(present.iter()),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Mean of the present values, `None` when nothing is present.
    pub fn mean_present<I>(values: I) -> Option<f64>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let present: Vec<f64> = values.into_iter().flatten().collect();
        if present.is_empty() {
            None
        } else {
            Some(present.iter().mean())
        }
    }

    /// Rescale present values to [0, 1]. A constant series maps to 0.0.
    pub fn min_max_scale(values: &[Option<f64>]) -> Vec<Option<f64>> {
        let present = values.iter().flatten();
        let (lo, hi) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
        let span = hi - lo;

        values
            .iter()
            .map(|v| {
                v.map(|x| {
                    if span > 0.0 {
                        (x - lo) / span
                    } else {
                        0.0
                    }
                })
            })
            .collect()
    }

    /// Percentage growth `(end / start - 1) * 100`. `None` when the start value
    /// is zero or either side is not finite.
    pub fn percent_increase(start: f64, end: f64) -> Option<f64> {
        if start == 0.0 || !start.is_finite() || !end.is_finite() {
            return None;
        }
        Some((end / start - 1.0) * 100.0)
    }
}
