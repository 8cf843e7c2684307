use serde::Serialize;
use tb_columnar::{ArithmeticOp, Column, ColumnError, CompareOp};
use tb_frame::{DataFrame, Predicate};
use tb_groupby::{GroupByOptions, groupby_size};
use tb_stats::{pearson, quantile};
use tb_types::Scalar;

use crate::PipelineError;

/// Columns a medical examination frame must carry.
pub const MEDICAL_COLUMNS: [&str; 10] = [
    "height",
    "weight",
    "cholesterol",
    "gluc",
    "smoke",
    "alco",
    "active",
    "cardio",
    "ap_lo",
    "ap_hi",
];

/// Variables melted by [`MedicalPipeline::categorical_counts`], in melt order.
pub const CATEGORICAL_VARIABLES: [&str; 6] =
    ["cholesterol", "gluc", "smoke", "alco", "active", "overweight"];

const OVERWEIGHT_BMI: f64 = 25.0;
const LOWER_QUANTILE: f64 = 0.025;
const UPPER_QUANTILE: f64 = 0.975;

/// Medical examination data with the derived `overweight` flag and
/// `cholesterol`/`gluc` normalized to 0 (normal) / 1 (above normal).
#[derive(Debug, Clone)]
pub struct MedicalPipeline {
    frame: DataFrame,
}

impl MedicalPipeline {
    pub fn prepare(frame: &DataFrame) -> Result<Self, PipelineError> {
        frame.require_all(&MEDICAL_COLUMNS)?;

        let height_m = frame
            .require("height")?
            .scalar_numeric(100.0, ArithmeticOp::Div)?;
        let bmi = frame.require("weight")?.binary_numeric(
            &height_m.scalar_numeric(2.0, ArithmeticOp::Pow)?,
            ArithmeticOp::Div,
        )?;
        let overweight = Column::from_i64(
            bmi.compare_scalar(CompareOp::Gt, &Scalar::Float64(OVERWEIGHT_BMI))
                .into_iter()
                .map(i64::from),
        );

        let frame = frame
            .with_column("overweight", overweight)?
            .with_column("cholesterol", normalize(frame.require("cholesterol")?)?)?
            .with_column("gluc", normalize(frame.require("gluc")?)?)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(rows = frame.num_rows(), "medical pipeline prepared");

        Ok(Self { frame })
    }

    #[must_use]
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Long-format counts of every categorical variable split by `cardio`:
    /// one row per `(cardio, variable, value)`, sorted by those keys.
    pub fn categorical_counts(&self) -> Result<DataFrame, PipelineError> {
        let rows = self.frame.num_rows();
        let cardio = self.frame.require("cardio")?;

        let capacity = rows * CATEGORICAL_VARIABLES.len();
        let mut cardio_keys = Vec::with_capacity(capacity);
        let mut variables = Vec::with_capacity(capacity);
        let mut values = Vec::with_capacity(capacity);
        for variable in CATEGORICAL_VARIABLES {
            cardio_keys.extend_from_slice(cardio.values());
            variables.extend(std::iter::repeat_n(Scalar::Utf8(variable.to_owned()), rows));
            values.extend_from_slice(self.frame.require(variable)?.values());
        }

        let keys = [
            Column::from_values(cardio_keys)?,
            Column::from_values(variables)?,
            Column::from_values(values)?,
        ];
        let table = groupby_size(
            &[&keys[0], &keys[1], &keys[2]],
            GroupByOptions {
                dropna: true,
                sort: true,
            },
        )?;

        let mut out: [Vec<Scalar>; 3] = Default::default();
        for tuple in &table.keys {
            for (slot, key) in out.iter_mut().zip(tuple) {
                slot.push(key.clone());
            }
        }
        let [cardio, variable, value] = out;
        let totals = Column::from_i64(
            table
                .values
                .iter()
                .map(|count| count.unwrap_or_default() as i64),
        );

        Ok(DataFrame::from_columns(vec![
            ("cardio", Column::from_values(cardio)?),
            ("variable", Column::from_values(variable)?),
            ("value", Column::from_values(value)?),
            ("total", totals),
        ])?)
    }

    /// Rows with consistent blood pressure (`ap_lo <= ap_hi`) and height and
    /// weight inside their 2.5th..97.5th percentile range.
    pub fn cleaned(&self) -> Result<DataFrame, PipelineError> {
        let keep = Predicate::column_compare("ap_lo", CompareOp::Le, "ap_hi")
            .and(self.within_percentiles("height")?)
            .and(self.within_percentiles("weight")?);
        Ok(self.frame.filter(&keep)?)
    }

    fn within_percentiles(&self, name: &str) -> Result<Predicate, PipelineError> {
        let values = self.frame.numeric(name)?;
        let low = quantile(&values, LOWER_QUANTILE)?;
        let high = quantile(&values, UPPER_QUANTILE)?;
        Ok(Predicate::ge(name, low).and(Predicate::le(name, high)))
    }

    /// Pearson correlation between every pair of numeric columns of the
    /// cleaned frame, in frame column order.
    pub fn correlation_matrix(&self) -> Result<CorrelationMatrix, PipelineError> {
        let clean = self.cleaned()?;
        let columns = clean
            .numeric_column_names()
            .into_iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let data = columns
            .iter()
            .map(|name| clean.require(name))
            .collect::<Result<Vec<_>, _>>()?;

        let values = data
            .iter()
            .map(|left| {
                data.iter()
                    .map(|right| pairwise_pearson(left, right))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CorrelationMatrix { columns, values })
    }
}

/// 1 → 0, anything else (missing included) → 1.
fn normalize(column: &Column) -> Result<Column, ColumnError> {
    let normal = Scalar::Int64(1);
    column.map(|value| Scalar::Int64(i64::from(!value.matches(&normal))))
}

/// Correlation over rows where both cells are present; NaN with fewer than
/// two such rows.
fn pairwise_pearson(left: &Column, right: &Column) -> Result<f64, PipelineError> {
    let (x, y): (Vec<f64>, Vec<f64>) = left
        .values()
        .iter()
        .zip(right.values())
        .filter(|(a, b)| !a.is_missing() && !b.is_missing())
        .map(|(a, b)| Ok((a.to_f64()?, b.to_f64()?)))
        .collect::<Result<Vec<_>, ColumnError>>()?
        .into_iter()
        .unzip();
    if x.len() < 2 {
        return Ok(f64::NAN);
    }
    Ok(pearson(&x, &y)?)
}

/// Square correlation table. `values[i][j]` correlates `columns[i]` with
/// `columns[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    #[must_use]
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.columns.iter().position(|name| name == row)?;
        let j = self.columns.iter().position(|name| name == column)?;
        Some(self.values[i][j])
    }

    /// Cells on and above the diagonal, the redundant half hidden when the
    /// matrix is drawn as a heat map.
    #[must_use]
    pub fn upper_triangle_mask(&self) -> Vec<Vec<bool>> {
        let n = self.columns.len();
        (0..n).map(|i| (0..n).map(|j| j >= i).collect()).collect()
    }
}
