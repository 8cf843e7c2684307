use serde::{Deserialize, Serialize};

use crate::StatsError;

/// `p`-th quantile with linear interpolation between closest ranks
/// (`(n - 1) * p` positioning).
pub fn quantile(values: &[f64], p: f64) -> Result<f64, StatsError> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, p)
}

/// Same as [`quantile`] for input already sorted ascending.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Result<f64, StatsError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(StatsError::InvalidProbability { p });
    }
    let n = sorted.len();
    match n {
        0 => Err(StatsError::NotEnoughValues {
            op: "quantile",
            required: 1,
            actual: 0,
        }),
        1 => Ok(sorted[0]),
        _ => {
            let h = (n - 1) as f64 * p;
            let lo = h.floor() as usize;
            let frac = h - h.floor();
            if lo + 1 >= n {
                Ok(sorted[n - 1])
            } else {
                Ok(sorted[lo] + frac * (sorted[lo + 1] - sorted[lo]))
            }
        }
    }
}

/// Box-plot statistics: quartiles, whiskers at the most extreme
/// observations within 1.5 IQR of the box, and the points beyond them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSummary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxSummary {
    pub fn from_values(values: &[f64]) -> Result<Self, StatsError> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile_sorted(&sorted, 0.25)?;
        let median = quantile_sorted(&sorted, 0.5)?;
        let q3 = quantile_sorted(&sorted, 0.75)?;
        let reach = 1.5 * (q3 - q1);
        let (low_fence, high_fence) = (q1 - reach, q3 + reach);

        let inside = sorted
            .iter()
            .copied()
            .filter(|value| (low_fence..=high_fence).contains(value));
        let lower_whisker = inside.clone().next().unwrap_or(q1);
        let upper_whisker = inside.last().unwrap_or(q3);
        let outliers = values
            .iter()
            .copied()
            .filter(|value| !(low_fence..=high_fence).contains(value))
            .collect();

        Ok(Self {
            count: sorted.len(),
            min: sorted[0],
            q1,
            median,
            q3,
            max: sorted[sorted.len() - 1],
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}
