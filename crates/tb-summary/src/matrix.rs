use tb_stats::{max, mean, min, population_std, population_variance, round_to, sum};

use crate::engine::DEFAULT_DECIMALS;
use crate::error::SummaryError;
use crate::value::{SummaryResult, SummaryValue};

/// Side length of the square matrix the profile reads.
pub const MATRIX_SIDE: usize = 3;

const CELLS: usize = MATRIX_SIDE * MATRIX_SIDE;

/// One statistic along both axes and over the whole matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisStats<T = f64> {
    /// Per column, left to right.
    pub columns: [T; MATRIX_SIDE],
    /// Per row, top to bottom.
    pub rows: [T; MATRIX_SIDE],
    pub overall: T,
}

impl<T> AxisStats<T> {
    fn compute<C: Copy>(cells: &[C; CELLS], reduce: impl Fn(&[C]) -> T) -> Self {
        let column = |c: usize| -> Vec<C> {
            (0..MATRIX_SIDE)
                .map(|r| cells[r * MATRIX_SIDE + c])
                .collect()
        };
        let row = |r: usize| &cells[r * MATRIX_SIDE..(r + 1) * MATRIX_SIDE];
        Self {
            columns: std::array::from_fn(|c| reduce(column(c).as_slice())),
            rows: std::array::from_fn(|r| reduce(row(r))),
            overall: reduce(cells.as_slice()),
        }
    }
}

impl<T> AxisStats<Option<T>> {
    fn transpose(self) -> Option<AxisStats<T>> {
        let [c0, c1, c2] = self.columns;
        let [r0, r1, r2] = self.rows;
        Some(AxisStats {
            columns: [c0?, c1?, c2?],
            rows: [r0?, r1?, r2?],
            overall: self.overall?,
        })
    }
}

impl AxisStats {
    fn rounded(&self, decimals: u32) -> Self {
        Self {
            columns: self.columns.map(|v| round_to(v, decimals)),
            rows: self.rows.map(|v| round_to(v, decimals)),
            overall: round_to(self.overall, decimals),
        }
    }
}

/// Declaration order is the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixMetric {
    Mean,
    Variance,
    StandardDeviation,
    Max,
    Min,
    Sum,
}

impl MatrixMetric {
    /// Output order.
    pub const ALL: [Self; 6] = [
        Self::Mean,
        Self::Variance,
        Self::StandardDeviation,
        Self::Max,
        Self::Min,
        Self::Sum,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Variance => "variance",
            Self::StandardDeviation => "standard deviation",
            Self::Max => "max",
            Self::Min => "min",
            Self::Sum => "sum",
        }
    }

    #[must_use]
    pub fn is_rounded(self) -> bool {
        matches!(self, Self::Mean | Self::Variance | Self::StandardDeviation)
    }

    fn reducer(self) -> fn(&[f64]) -> Option<f64> {
        match self {
            Self::Mean => mean,
            Self::Variance => population_variance,
            Self::StandardDeviation => population_std,
            Self::Max => max,
            Self::Min => min,
            Self::Sum => total,
        }
    }

    /// Reducers that stay exact on integer cells.
    fn integer_reducer(self) -> Option<fn(&[i64]) -> Option<i64>> {
        match self {
            Self::Max => Some(integer_max),
            Self::Min => Some(integer_min),
            Self::Sum => Some(integer_sum),
            Self::Mean | Self::Variance | Self::StandardDeviation => None,
        }
    }
}

fn total(values: &[f64]) -> Option<f64> {
    Some(sum(values))
}

fn integer_max(values: &[i64]) -> Option<i64> {
    values.iter().copied().max()
}

fn integer_min(values: &[i64]) -> Option<i64> {
    values.iter().copied().min()
}

/// `None` on overflow.
fn integer_sum(values: &[i64]) -> Option<i64> {
    values.iter().try_fold(0_i64, |acc, &v| acc.checked_add(v))
}

/// Unrounded 3x3 matrix statistics. Rounding happens in
/// [`MatrixStatistics::to_summary`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixStatistics {
    stats: [AxisStats; 6],
    /// Exact max/min/sum when the input was integers.
    integers: [Option<AxisStats<i64>>; 6],
}

impl MatrixStatistics {
    #[must_use]
    pub fn get(&self, metric: MatrixMetric) -> &AxisStats {
        &self.stats[metric as usize]
    }

    /// Integer max/min/sum for integer input, `None` otherwise or when the
    /// sum overflows `i64`.
    #[must_use]
    pub fn get_integer(&self, metric: MatrixMetric) -> Option<&AxisStats<i64>> {
        self.integers[metric as usize].as_ref()
    }

    #[must_use]
    pub fn mean(&self) -> &AxisStats {
        self.get(MatrixMetric::Mean)
    }

    #[must_use]
    pub fn variance(&self) -> &AxisStats {
        self.get(MatrixMetric::Variance)
    }

    #[must_use]
    pub fn standard_deviation(&self) -> &AxisStats {
        self.get(MatrixMetric::StandardDeviation)
    }

    #[must_use]
    pub fn max(&self) -> &AxisStats {
        self.get(MatrixMetric::Max)
    }

    #[must_use]
    pub fn min(&self) -> &AxisStats {
        self.get(MatrixMetric::Min)
    }

    #[must_use]
    pub fn sum(&self) -> &AxisStats {
        self.get(MatrixMetric::Sum)
    }

    /// Labelled output; mean, variance and standard deviation rounded to
    /// one decimal place, max/min/sum kept as integers for integer input.
    #[must_use]
    pub fn to_summary(&self) -> SummaryResult {
        let mut out = SummaryResult::new();
        for metric in MatrixMetric::ALL {
            let value = match self.get_integer(metric) {
                Some(integers) => SummaryValue::IntegerAxes(*integers),
                None if metric.is_rounded() => {
                    SummaryValue::Axes(self.get(metric).rounded(DEFAULT_DECIMALS))
                }
                None => SummaryValue::Axes(*self.get(metric)),
            };
            out.insert(metric.label(), value);
        }
        out
    }
}

fn cells<T>(values: &[T]) -> Result<&[T; CELLS], SummaryError> {
    values
        .try_into()
        .map_err(|_| SummaryError::InvalidInputSize {
            expected: CELLS,
            actual: values.len(),
        })
}

fn float_stats(cells: &[f64; CELLS]) -> [AxisStats; 6] {
    // Every slice reduced here is non-empty.
    MatrixMetric::ALL.map(|metric| {
        let reduce = metric.reducer();
        AxisStats::compute(cells, |values| reduce(values).unwrap_or(f64::NAN))
    })
}

/// Statistics of nine values read row-major into a 3x3 matrix. Variance
/// and standard deviation use divisor `N`.
pub fn matrix_statistics(values: &[f64]) -> Result<MatrixStatistics, SummaryError> {
    Ok(MatrixStatistics {
        stats: float_stats(cells(values)?),
        integers: [None; 6],
    })
}

pub fn matrix_statistics_i64(values: &[i64]) -> Result<MatrixStatistics, SummaryError> {
    let integers = cells(values)?;
    let floats = integers.map(|v| v as f64);
    Ok(MatrixStatistics {
        stats: float_stats(&floats),
        integers: MatrixMetric::ALL.map(|metric| {
            metric
                .integer_reducer()
                .and_then(|reduce| AxisStats::compute(integers, reduce).transpose())
        }),
    })
}
