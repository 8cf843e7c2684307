#![forbid(unsafe_code)]

//! Numeric kernels shared by the summary engine and the pipelines.
//!
//! Kernels that are undefined on empty input return `Option`; callers
//! decide whether an empty input is an error in their domain. NaN inputs
//! are the caller's responsibility: columns hand over missing-free slices.

mod fit;
mod order;

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fit::{LinearFit, linear_fit, pearson};
pub use order::{BoxSummary, quantile, quantile_sorted};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("{op} requires at least {required} values, got {actual}")]
    NotEnoughValues {
        op: &'static str,
        required: usize,
        actual: usize,
    },
    #[error("quantile probability {p} is outside [0, 1]")]
    InvalidProbability { p: f64 },
    #[error("inputs have different lengths: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("cannot fit a line when every x value is identical")]
    ConstantInput,
}

/// Reducers available to per-group and per-axis aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggFunc {
    Count,
    Sum,
    Mean,
    Min,
    Max,
    Var,
    Std,
}

impl AggFunc {
    /// Count and Sum are defined on empty input (0); the rest are not.
    #[must_use]
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        match self {
            Self::Count => Some(values.len() as f64),
            Self::Sum => Some(sum(values)),
            Self::Mean => mean(values),
            Self::Min => min(values),
            Self::Max => max(values),
            Self::Var => population_variance(values),
            Self::Std => population_std(values),
        }
    }
}

/// Neumaier compensated summation.
#[must_use]
pub fn sum(values: &[f64]) -> f64 {
    let mut total = 0.0_f64;
    let mut compensation = 0.0_f64;
    for &value in values {
        let next = total + value;
        if total.abs() >= value.abs() {
            compensation += (total - next) + value;
        } else {
            compensation += (value - next) + total;
        }
        total = next;
    }
    total + compensation
}

#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(sum(values) / values.len() as f64)
}

/// Variance with divisor `N`.
#[must_use]
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let center = mean(values)?;
    let squares = values
        .iter()
        .map(|value| (value - center).powi(2))
        .collect::<Vec<_>>();
    Some(sum(&squares) / values.len() as f64)
}

#[must_use]
pub fn population_std(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

#[must_use]
pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

#[must_use]
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// `100 * numerator / denominator`, or `None` when the denominator is zero.
#[must_use]
pub fn percentage(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator != 0).then(|| numerator as f64 / denominator as f64 * 100.0)
}

/// Rounds to `decimals` places, decided on the exact binary value of
/// `value`: `38.45` (stored slightly above the half) goes up, `0.35`
/// (stored slightly below) goes down, and only exact halves such as `0.25`
/// go to the even neighbour.
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10_f64.powi(decimals as i32);
    let scaled = value * scale;
    if !scaled.is_finite() || scaled.abs() >= MAX_EXACT_INTEGER {
        return value;
    }
    // Exact error of the product; `scale` is exact for the decimals used here.
    let residual = value.mul_add(scale, -scaled);
    let floor = scaled.floor();
    let rounded = if scaled - floor != 0.5 {
        scaled.round()
    } else if residual > 0.0 {
        floor + 1.0
    } else if residual < 0.0 {
        floor
    } else {
        scaled.round_ties_even()
    };
    rounded / scale
}

/// Beyond 2^52 every f64 is an integer.
const MAX_EXACT_INTEGER: f64 = 4_503_599_627_370_496.0;

/// Most frequent item. Among items tied for the highest count the one that
/// occurs first in iteration order wins.
pub fn mode<T, I>(items: I) -> Option<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut first_seen = Vec::<T>::new();
    let mut counts = HashMap::<T, usize>::new();
    for item in items {
        let count = counts.entry(item.clone()).or_insert_with(|| {
            first_seen.push(item);
            0
        });
        *count += 1;
    }

    let mut best: Option<(T, usize)> = None;
    for item in first_seen {
        let count = counts.get(&item).copied().unwrap_or_default();
        if best.as_ref().is_none_or(|(_, top)| count > *top) {
            best = Some((item, count));
        }
    }
    best.map(|(item, _)| item)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{
        AggFunc, max, mean, min, mode, percentage, population_std, population_variance, round_to,
        sum,
    };

    #[test]
    fn population_moments_use_divisor_n() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        assert_eq!(mean(&values), Some(4.0));
        let var = population_variance(&values).expect("variance");
        assert!((var - 60.0 / 9.0).abs() < 1e-12);
        let std = population_std(&values).expect("std");
        assert!((std - (60.0_f64 / 9.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn empty_input_has_no_mean_or_extrema() {
        assert_eq!(mean(&[]), None);
        assert_eq!(min(&[]), None);
        assert_eq!(max(&[]), None);
        assert_eq!(AggFunc::Count.apply(&[]), Some(0.0));
        assert_eq!(AggFunc::Sum.apply(&[]), Some(0.0));
    }

    #[test]
    fn compensated_sum_survives_cancellation() {
        assert_eq!(sum(&[1.0, 1e100, 1.0, -1e100]), 2.0);
    }

    #[test]
    fn percentage_is_undefined_for_empty_denominator() {
        assert_eq!(percentage(0, 0), None);
        assert_eq!(percentage(1, 4), Some(25.0));
    }

    #[test]
    fn rounding_keeps_one_decimal() {
        assert_eq!(round_to(35.04, 1), 35.0);
        assert_eq!(round_to(66.666_666, 1), 66.7);
        assert_eq!(round_to(0.25, 1), 0.2);
        assert!(round_to(f64::NAN, 1).is_nan());
    }

    #[test]
    fn rounding_follows_the_stored_binary_value() {
        // 769 / 20 is stored just above 38.45; 0.35 just below.
        assert_eq!(round_to(769.0 / 20.0, 1), 38.5);
        assert_eq!(round_to(38.45, 1), 38.5);
        assert_eq!(round_to(0.35, 1), 0.3);
        assert_eq!(round_to(-0.35, 1), -0.3);
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(0.75, 1), 0.8);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert_eq!(round_to(f64::INFINITY, 1), f64::INFINITY);
    }

    #[test]
    fn mode_breaks_ties_by_first_occurrence() {
        let items = ["Adm", "Prof", "Prof", "Adm", "Exec"];
        assert_eq!(mode(items), Some("Adm"));
        assert_eq!(mode(["b", "a", "a"]), Some("a"));
        assert_eq!(mode(Vec::<&str>::new()), None);
    }

    proptest! {
        #[test]
        fn variance_is_never_negative(values in prop::collection::vec(-1e6_f64..1e6, 1..64)) {
            let var = population_variance(&values).expect("non-empty");
            prop_assert!(var >= 0.0);
        }

        #[test]
        fn mean_lies_between_extrema(values in prop::collection::vec(-1e6_f64..1e6, 1..64)) {
            let m = mean(&values).expect("non-empty");
            prop_assert!(m >= min(&values).expect("min") - 1e-6);
            prop_assert!(m <= max(&values).expect("max") + 1e-6);
        }
    }
}
