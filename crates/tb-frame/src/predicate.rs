use serde::{Deserialize, Serialize};
use tb_columnar::CompareOp;
use tb_types::Scalar;

use crate::{DataFrame, FrameError};

/// Boolean row selector. Evaluates to one bit per row; missing cells never
/// satisfy a comparison, so `Not` is the only way to select them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    All,
    Compare {
        column: String,
        cmp: CompareOp,
        value: Scalar,
    },
    IsIn {
        column: String,
        values: Vec<Scalar>,
    },
    ColumnCompare {
        left: String,
        cmp: CompareOp,
        right: String,
    },
    And {
        terms: Vec<Predicate>,
    },
    Or {
        terms: Vec<Predicate>,
    },
    Not {
        term: Box<Predicate>,
    },
}

impl Predicate {
    pub fn compare(column: impl Into<String>, cmp: CompareOp, value: impl Into<Scalar>) -> Self {
        Self::Compare {
            column: column.into(),
            cmp,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn le(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(column, CompareOp::Le, value)
    }

    pub fn ge(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(column, CompareOp::Ge, value)
    }

    pub fn is_in<V: Into<Scalar>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::IsIn {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn column_compare(left: impl Into<String>, cmp: CompareOp, right: impl Into<String>) -> Self {
        Self::ColumnCompare {
            left: left.into(),
            cmp,
            right: right.into(),
        }
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And { mut terms } => {
                terms.push(other);
                Self::And { terms }
            }
            first => Self::And {
                terms: vec![first, other],
            },
        }
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Or { mut terms } => {
                terms.push(other);
                Self::Or { terms }
            }
            first => Self::Or {
                terms: vec![first, other],
            },
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not {
            term: Box::new(self),
        }
    }

    pub(crate) fn evaluate(&self, frame: &DataFrame) -> Result<Vec<bool>, FrameError> {
        let rows = frame.num_rows();
        match self {
            Self::All => Ok(vec![true; rows]),
            Self::Compare { column, cmp, value } => {
                Ok(frame.require(column)?.compare_scalar(*cmp, value))
            }
            Self::IsIn { column, values } => Ok(frame.require(column)?.is_in(values)),
            Self::ColumnCompare { left, cmp, right } => {
                let right = frame.require(right)?;
                Ok(frame.require(left)?.compare_column(*cmp, right)?)
            }
            Self::And { terms } => terms.iter().try_fold(vec![true; rows], |mut acc, term| {
                let bits = term.evaluate(frame)?;
                acc.iter_mut().zip(bits).for_each(|(a, b)| *a &= b);
                Ok(acc)
            }),
            Self::Or { terms } => terms.iter().try_fold(vec![false; rows], |mut acc, term| {
                let bits = term.evaluate(frame)?;
                acc.iter_mut().zip(bits).for_each(|(a, b)| *a |= b);
                Ok(acc)
            }),
            Self::Not { term } => Ok(term.evaluate(frame)?.into_iter().map(|bit| !bit).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use tb_columnar::{Column, CompareOp};
    use tb_types::{NullKind, Scalar};

    use crate::{DataFrame, FrameError};

    use super::Predicate;

    fn census() -> DataFrame {
        DataFrame::from_columns(vec![
            (
                "education",
                Column::from_values(vec![
                    Scalar::from("Bachelors"),
                    Scalar::from("HS-grad"),
                    Scalar::Null(NullKind::Null),
                    Scalar::from("Doctorate"),
                ])
                .expect("education"),
            ),
            (
                "salary",
                Column::from_strings(["<=50K", ">50K", ">50K", ">50K"]),
            ),
            ("ap_lo", Column::from_i64([80, 90, 70, 120])),
            ("ap_hi", Column::from_i64([120, 80, 110, 120])),
        ])
        .expect("frame")
    }

    #[test]
    fn is_in_and_its_negation_partition_every_row() {
        let frame = census();
        let advanced = Predicate::is_in("education", ["Bachelors", "Masters", "Doctorate"]);
        let inside = frame.mask(&advanced).expect("inside");
        let outside = frame.mask(&advanced.negate()).expect("outside");

        assert_eq!(inside, vec![true, false, false, true]);
        assert!(inside.iter().zip(&outside).all(|(a, b)| a ^ b));
    }

    #[test]
    fn conjunction_combines_terms() {
        let frame = census();
        let rich_advanced = Predicate::is_in("education", ["Bachelors", "Doctorate"])
            .and(Predicate::eq("salary", ">50K"));
        assert_eq!(
            frame.mask(&rich_advanced).expect("mask"),
            vec![false, false, false, true]
        );
    }

    #[test]
    fn column_compare_checks_pairs_of_cells() {
        let frame = census();
        let sane = Predicate::column_compare("ap_lo", CompareOp::Le, "ap_hi");
        assert_eq!(
            frame.mask(&sane).expect("mask"),
            vec![true, false, true, true]
        );
    }

    #[test]
    fn unknown_column_fails() {
        let err = census()
            .mask(&Predicate::eq("country", "India"))
            .expect_err("must fail");
        assert!(matches!(err, FrameError::MissingColumn { .. }));
    }

    #[test]
    fn predicates_round_trip_through_json_config() {
        let predicate = Predicate::eq("sex", "Male").or(Predicate::ge("age", 40_i64));
        let json = serde_json::to_string(&predicate).expect("serialize");
        let back: Predicate = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, predicate);
    }
}
