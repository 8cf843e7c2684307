#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use tb_types::{ColumnKind, DType, NullKind, Scalar, TypeError, cast_scalar, common_dtype, infer_dtype};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityMask {
    bits: Vec<bool>,
}

impl ValidityMask {
    #[must_use]
    pub fn from_values(values: &[Scalar]) -> Self {
        let bits = values.iter().map(|value| !value.is_missing()).collect();
        Self { bits }
    }

    #[must_use]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    #[must_use]
    pub fn count_valid(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    dtype: DType,
    values: Vec<Scalar>,
    validity: ValidityMask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl ArithmeticOp {
    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
            Self::Pow => lhs.powf(rhs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Missing operands never satisfy a comparison, `Ne` included.
    #[must_use]
    pub fn holds(self, left: &Scalar, right: &Scalar) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};

        if left.is_missing() || right.is_missing() {
            return false;
        }
        match self {
            Self::Eq => left.matches(right),
            Self::Ne => !left.matches(right),
            Self::Lt => matches!(left.partial_cmp_value(right), Some(Less)),
            Self::Le => matches!(left.partial_cmp_value(right), Some(Less | Equal)),
            Self::Gt => matches!(left.partial_cmp_value(right), Some(Greater)),
            Self::Ge => matches!(left.partial_cmp_value(right), Some(Greater | Equal)),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColumnError {
    #[error("column length mismatch: left={left}, right={right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("row position {position} is out of bounds for column of length {len}")]
    PositionOutOfBounds { position: usize, len: usize },
    #[error("column of dtype {dtype:?} is not numeric")]
    NonNumeric { dtype: DType },
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl Column {
    /// Construct a column, coercing values to the target dtype. Missing
    /// values are normalized to the dtype-specific missing marker.
    pub fn new(dtype: DType, values: Vec<Scalar>) -> Result<Self, ColumnError> {
        let values = values
            .into_iter()
            .map(|value| cast_scalar(value, dtype))
            .collect::<Result<Vec<_>, _>>()?;
        let validity = ValidityMask::from_values(&values);

        Ok(Self {
            dtype,
            values,
            validity,
        })
    }

    pub fn from_values(values: Vec<Scalar>) -> Result<Self, ColumnError> {
        let dtype = infer_dtype(&values)?;
        Self::new(dtype, values)
    }

    #[must_use]
    pub fn from_f64(values: impl IntoIterator<Item = f64>) -> Self {
        let values = values.into_iter().map(Scalar::Float64).collect::<Vec<_>>();
        let validity = ValidityMask::from_values(&values);
        Self {
            dtype: DType::Float64,
            values,
            validity,
        }
    }

    #[must_use]
    pub fn from_i64(values: impl IntoIterator<Item = i64>) -> Self {
        let values = values.into_iter().map(Scalar::Int64).collect::<Vec<_>>();
        let validity = ValidityMask::from_values(&values);
        Self {
            dtype: DType::Int64,
            values,
            validity,
        }
    }

    #[must_use]
    pub fn from_strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        let values = values
            .into_iter()
            .map(|value| Scalar::Utf8(value.into()))
            .collect::<Vec<_>>();
        let validity = ValidityMask::from_values(&values);
        Self {
            dtype: DType::Utf8,
            values,
            validity,
        }
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        self.dtype.kind()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    #[must_use]
    pub fn value(&self, idx: usize) -> Option<&Scalar> {
        self.values.get(idx)
    }

    #[must_use]
    pub fn validity(&self) -> &ValidityMask {
        &self.validity
    }

    /// Gathers the rows at `positions` into a new column of the same dtype.
    pub fn take(&self, positions: &[usize]) -> Result<Self, ColumnError> {
        let values = positions
            .iter()
            .map(|&position| {
                self.values
                    .get(position)
                    .cloned()
                    .ok_or(ColumnError::PositionOutOfBounds {
                        position,
                        len: self.len(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let validity = ValidityMask::from_values(&values);

        Ok(Self {
            dtype: self.dtype,
            values,
            validity,
        })
    }

    /// Keeps the rows whose mask bit is set.
    pub fn filter(&self, mask: &[bool]) -> Result<Self, ColumnError> {
        if mask.len() != self.len() {
            return Err(ColumnError::LengthMismatch {
                left: self.len(),
                right: mask.len(),
            });
        }
        let positions = mask
            .iter()
            .enumerate()
            .filter_map(|(idx, keep)| keep.then_some(idx))
            .collect::<Vec<_>>();
        self.take(&positions)
    }

    /// Non-missing values as `f64`, in row order. Fails for categorical
    /// columns.
    pub fn numeric_values(&self) -> Result<Vec<f64>, ColumnError> {
        if self.kind() != ColumnKind::Numeric {
            return Err(ColumnError::NonNumeric { dtype: self.dtype });
        }
        self.values
            .iter()
            .filter(|value| !value.is_missing())
            .map(|value| value.to_f64().map_err(ColumnError::from))
            .collect()
    }

    pub fn compare_scalar(&self, op: CompareOp, rhs: &Scalar) -> Vec<bool> {
        self.values.iter().map(|value| op.holds(value, rhs)).collect()
    }

    pub fn compare_column(&self, op: CompareOp, rhs: &Self) -> Result<Vec<bool>, ColumnError> {
        if self.len() != rhs.len() {
            return Err(ColumnError::LengthMismatch {
                left: self.len(),
                right: rhs.len(),
            });
        }
        Ok(self
            .values
            .iter()
            .zip(&rhs.values)
            .map(|(left, right)| op.holds(left, right))
            .collect())
    }

    #[must_use]
    pub fn is_in(&self, set: &[Scalar]) -> Vec<bool> {
        self.values
            .iter()
            .map(|value| set.iter().any(|candidate| value.matches(candidate)))
            .collect()
    }

    /// Applies `f` to every value and re-infers the dtype of the result.
    pub fn map<F>(&self, f: F) -> Result<Self, ColumnError>
    where
        F: Fn(&Scalar) -> Scalar,
    {
        Self::from_values(self.values.iter().map(f).collect())
    }

    pub fn binary_numeric(&self, right: &Self, op: ArithmeticOp) -> Result<Self, ColumnError> {
        if self.len() != right.len() {
            return Err(ColumnError::LengthMismatch {
                left: self.len(),
                right: right.len(),
            });
        }

        let out_dtype = numeric_out_dtype(common_dtype(self.dtype, right.dtype)?, op);
        let values = self
            .values
            .iter()
            .zip(&right.values)
            .map(|(left, right)| numeric_cell(left, right, op, out_dtype))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(out_dtype, values)
    }

    pub fn scalar_numeric(&self, rhs: f64, op: ArithmeticOp) -> Result<Self, ColumnError> {
        let rhs = Scalar::Float64(rhs);
        let out_dtype = numeric_out_dtype(common_dtype(self.dtype, DType::Float64)?, op);
        let values = self
            .values
            .iter()
            .map(|left| numeric_cell(left, &rhs, op, out_dtype))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(out_dtype, values)
    }
}

fn numeric_out_dtype(common: DType, op: ArithmeticOp) -> DType {
    match (common, op) {
        (_, ArithmeticOp::Div | ArithmeticOp::Pow) => DType::Float64,
        (DType::Bool | DType::Null, _) => DType::Int64,
        (dtype, _) => dtype,
    }
}

fn numeric_cell(
    left: &Scalar,
    right: &Scalar,
    op: ArithmeticOp,
    out_dtype: DType,
) -> Result<Scalar, ColumnError> {
    if left.is_missing() || right.is_missing() {
        return Ok(Scalar::missing_for_dtype(out_dtype));
    }
    if out_dtype == DType::Utf8 {
        return Err(ColumnError::NonNumeric { dtype: out_dtype });
    }

    let result = op.apply(left.to_f64()?, right.to_f64()?);
    if out_dtype == DType::Int64 && result.is_finite() && result == result.trunc() {
        Ok(Scalar::Int64(result as i64))
    } else if out_dtype == DType::Int64 {
        Ok(Scalar::missing_for_dtype(out_dtype))
    } else {
        Ok(Scalar::Float64(result))
    }
}

#[cfg(test)]
mod tests {
    use tb_types::{ColumnKind, DType, NullKind, Scalar};

    use super::{ArithmeticOp, Column, ColumnError, CompareOp};

    #[test]
    fn filter_keeps_masked_rows_in_order() {
        let column = Column::from_i64([10, 20, 30, 40]);
        let out = column.filter(&[true, false, true, false]).expect("filter");
        assert_eq!(out.values(), &[Scalar::Int64(10), Scalar::Int64(30)]);
    }

    #[test]
    fn filter_rejects_mask_of_wrong_length() {
        let column = Column::from_i64([1, 2]);
        let err = column.filter(&[true]).expect_err("must fail");
        assert_eq!(err, ColumnError::LengthMismatch { left: 2, right: 1 });
    }

    #[test]
    fn numeric_division_propagates_missing() {
        let left = Column::from_values(vec![
            Scalar::Int64(50),
            Scalar::Null(NullKind::Null),
            Scalar::Int64(90),
        ])
        .expect("left");
        let right = Column::from_i64([2, 5, 3]);

        let out = left
            .binary_numeric(&right, ArithmeticOp::Div)
            .expect("divide");

        assert_eq!(out.dtype(), DType::Float64);
        assert_eq!(out.values()[0], Scalar::Float64(25.0));
        assert_eq!(out.values()[1], Scalar::Null(NullKind::NaN));
        assert_eq!(out.values()[2], Scalar::Float64(30.0));
    }

    #[test]
    fn scalar_power_squares_values() {
        let column = Column::from_f64([1.5, 2.0]);
        let out = column.scalar_numeric(2.0, ArithmeticOp::Pow).expect("pow");
        assert_eq!(out.values(), &[Scalar::Float64(2.25), Scalar::Float64(4.0)]);
    }

    #[test]
    fn categorical_columns_refuse_numeric_extraction() {
        let column = Column::from_strings(["a", "b"]);
        assert_eq!(column.kind(), ColumnKind::Categorical);
        assert!(matches!(
            column.numeric_values(),
            Err(ColumnError::NonNumeric { dtype: DType::Utf8 })
        ));
    }

    #[test]
    fn numeric_values_skip_missing() {
        let column = Column::from_f64([1.0, f64::NAN, 3.0]);
        assert_eq!(column.numeric_values().expect("numeric"), vec![1.0, 3.0]);
    }

    #[test]
    fn comparisons_never_match_missing_cells() {
        let column = Column::from_values(vec![
            Scalar::Int64(1),
            Scalar::Null(NullKind::Null),
            Scalar::Int64(3),
        ])
        .expect("column");
        assert_eq!(
            column.compare_scalar(CompareOp::Ne, &Scalar::Int64(1)),
            vec![false, false, true]
        );
        assert_eq!(
            column.compare_scalar(CompareOp::Le, &Scalar::Int64(3)),
            vec![true, false, true]
        );
    }

    #[test]
    fn is_in_matches_any_member() {
        let column = Column::from_strings(["Bachelors", "HS-grad", "Doctorate"]);
        let set = [Scalar::from("Bachelors"), Scalar::from("Doctorate")];
        assert_eq!(column.is_in(&set), vec![true, false, true]);
    }

    #[test]
    fn map_reinfers_dtype() {
        let column = Column::from_i64([1, 2, 3]);
        let out = column
            .map(|value| Scalar::Int64(i64::from(!matches!(value, Scalar::Int64(1)))))
            .expect("map");
        assert_eq!(out.values(), &[Scalar::Int64(0), Scalar::Int64(1), Scalar::Int64(1)]);
    }
}
