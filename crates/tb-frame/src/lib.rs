#![forbid(unsafe_code)]

mod predicate;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tb_columnar::{Column, ColumnError};
use tb_index::{Index, IndexError, IndexLabel};
use tb_types::{ColumnKind, DType, Scalar};
use thiserror::Error;

pub use predicate::Predicate;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("index length ({index_len}) does not match column length ({column_len})")]
    LengthMismatch { index_len: usize, column_len: usize },
    #[error("column {name:?} is not present in the dataset")]
    MissingColumn { name: String },
    #[error("column {name:?} appears more than once")]
    DuplicateColumn { name: String },
    #[error("column {name:?} has dtype {dtype:?} and cannot be aggregated numerically")]
    NonNumericColumn { name: String, dtype: DType },
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    name: String,
    index: Index,
    column: Column,
}

impl Series {
    pub fn new(name: impl Into<String>, index: Index, column: Column) -> Result<Self, FrameError> {
        if index.len() != column.len() {
            return Err(FrameError::LengthMismatch {
                index_len: index.len(),
                column_len: column.len(),
            });
        }

        Ok(Self {
            name: name.into(),
            index,
            column,
        })
    }

    pub fn from_values(
        name: impl Into<String>,
        index_labels: Vec<IndexLabel>,
        values: Vec<Scalar>,
    ) -> Result<Self, FrameError> {
        let index = Index::new(index_labels);
        let column = Column::from_values(values)?;
        Self::new(name, index, column)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[must_use]
    pub fn column(&self) -> &Column {
        &self.column
    }

    #[must_use]
    pub fn values(&self) -> &[Scalar] {
        self.column.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.column.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.column.is_empty()
    }

    /// `(label, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&IndexLabel, &Scalar)> {
        self.index.labels().iter().zip(self.column.values())
    }
}

/// Rectangular dataset: named columns of equal length over a shared row
/// index. Column order follows insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    index: Index,
    order: Vec<String>,
    columns: BTreeMap<String, Column>,
}

impl DataFrame {
    pub fn new(index: Index, columns: Vec<(String, Column)>) -> Result<Self, FrameError> {
        let mut order = Vec::with_capacity(columns.len());
        let mut by_name = BTreeMap::new();

        for (name, column) in columns {
            if column.len() != index.len() {
                return Err(FrameError::LengthMismatch {
                    index_len: index.len(),
                    column_len: column.len(),
                });
            }
            if by_name.contains_key(&name) {
                return Err(FrameError::DuplicateColumn { name });
            }
            order.push(name.clone());
            by_name.insert(name, column);
        }

        Ok(Self {
            index,
            order,
            columns: by_name,
        })
    }

    /// Builds a frame with a positional `0..n` index. An empty column list
    /// yields an empty frame.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Column)>) -> Result<Self, FrameError> {
        let len = columns.first().map_or(0, |(_, column)| column.len());
        let columns = columns
            .into_iter()
            .map(|(name, column)| (name.into(), column))
            .collect();
        Self::new(Index::range(len), columns)
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.order
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Like [`DataFrame::column`] but a missing column is an error.
    pub fn require(&self, name: &str) -> Result<&Column, FrameError> {
        self.column(name).ok_or_else(|| FrameError::MissingColumn {
            name: name.to_owned(),
        })
    }

    pub fn require_all(&self, names: &[&str]) -> Result<(), FrameError> {
        names.iter().try_for_each(|name| self.require(name).map(|_| ()))
    }

    /// Numeric column values with missing cells skipped.
    pub fn numeric(&self, name: &str) -> Result<Vec<f64>, FrameError> {
        let column = self.require(name)?;
        if column.kind() != ColumnKind::Numeric {
            return Err(FrameError::NonNumericColumn {
                name: name.to_owned(),
                dtype: column.dtype(),
            });
        }
        Ok(column.numeric_values()?)
    }

    /// Names of numeric columns in frame order.
    #[must_use]
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|name| {
                self.columns
                    .get(name.as_str())
                    .is_some_and(|column| column.kind() == ColumnKind::Numeric)
            })
            .map(String::as_str)
            .collect()
    }

    /// Returns a new frame with `column` added, or replacing an existing
    /// column of the same name in place.
    pub fn with_column(&self, name: impl Into<String>, column: Column) -> Result<Self, FrameError> {
        let name = name.into();
        if column.len() != self.num_rows() {
            return Err(FrameError::LengthMismatch {
                index_len: self.num_rows(),
                column_len: column.len(),
            });
        }

        let mut out = self.clone();
        if !out.columns.contains_key(&name) {
            out.order.push(name.clone());
        }
        out.columns.insert(name, column);
        Ok(out)
    }

    pub fn select(&self, names: &[&str]) -> Result<Self, FrameError> {
        let columns = names
            .iter()
            .map(|name| Ok(((*name).to_owned(), self.require(name)?.clone())))
            .collect::<Result<Vec<_>, FrameError>>()?;
        Self::new(self.index.clone(), columns)
    }

    pub fn mask(&self, predicate: &Predicate) -> Result<Vec<bool>, FrameError> {
        predicate.evaluate(self)
    }

    pub fn filter(&self, predicate: &Predicate) -> Result<Self, FrameError> {
        let mask = self.mask(predicate)?;
        self.filter_mask(&mask)
    }

    /// Keeps rows whose mask bit is set; the source frame is untouched and
    /// the surviving rows keep their original index labels.
    pub fn filter_mask(&self, mask: &[bool]) -> Result<Self, FrameError> {
        if mask.len() != self.num_rows() {
            return Err(FrameError::LengthMismatch {
                index_len: self.num_rows(),
                column_len: mask.len(),
            });
        }

        let positions = mask
            .iter()
            .enumerate()
            .filter_map(|(idx, keep)| keep.then_some(idx))
            .collect::<Vec<_>>();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rows_in = self.num_rows(),
            rows_out = positions.len(),
            "frame filter"
        );

        let index = self.index.take(&positions)?;
        let columns = self
            .order
            .iter()
            .map(|name| {
                let column = self.require(name)?.take(&positions)?;
                Ok((name.clone(), column))
            })
            .collect::<Result<Vec<_>, FrameError>>()?;

        Self::new(index, columns)
    }

    /// Row-major view of one row, in column order.
    #[must_use]
    pub fn row(&self, idx: usize) -> Option<Vec<&Scalar>> {
        if idx >= self.num_rows() {
            return None;
        }
        self.order
            .iter()
            .map(|name| self.columns.get(name).and_then(|column| column.value(idx)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use tb_columnar::Column;
    use tb_index::IndexLabel;
    use tb_types::Scalar;

    use super::{DataFrame, FrameError, Predicate, Series};

    fn people() -> DataFrame {
        DataFrame::from_columns(vec![
            ("sex", Column::from_strings(["Male", "Male", "Female"])),
            ("age", Column::from_i64([30, 40, 50])),
        ])
        .expect("frame")
    }

    #[test]
    fn column_order_follows_insertion() {
        let frame = people();
        assert_eq!(frame.column_names(), &["sex".to_owned(), "age".to_owned()]);
        assert_eq!(frame.numeric_column_names(), vec!["age"]);
    }

    #[test]
    fn filter_returns_new_frame_and_keeps_labels() {
        let frame = people();
        let men = frame
            .filter(&Predicate::eq("sex", "Male"))
            .expect("filter");

        assert_eq!(men.num_rows(), 2);
        assert_eq!(frame.num_rows(), 3);
        assert_eq!(
            men.index().labels(),
            &[IndexLabel::Int64(0), IndexLabel::Int64(1)]
        );
        assert_eq!(men.numeric("age").expect("age"), vec![30.0, 40.0]);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let err = people().require("salary").expect_err("must fail");
        assert!(matches!(err, FrameError::MissingColumn { name } if name == "salary"));
    }

    #[test]
    fn numeric_rejects_categorical_columns() {
        let err = people().numeric("sex").expect_err("must fail");
        assert!(matches!(err, FrameError::NonNumericColumn { .. }));
    }

    #[test]
    fn with_column_replaces_in_place() {
        let frame = people();
        let out = frame
            .with_column("age", Column::from_i64([1, 2, 3]))
            .expect("replace");
        assert_eq!(out.column_names(), frame.column_names());
        assert_eq!(out.numeric("age").expect("age"), vec![1.0, 2.0, 3.0]);
        assert_eq!(frame.numeric("age").expect("age"), vec![30.0, 40.0, 50.0]);
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let err = DataFrame::from_columns(vec![
            ("a", Column::from_i64([1])),
            ("a", Column::from_i64([2])),
        ])
        .expect_err("must fail");
        assert!(matches!(err, FrameError::DuplicateColumn { .. }));
    }

    #[test]
    fn series_iterates_label_value_pairs() {
        let series = Series::from_values(
            "count",
            vec!["White".into(), "Black".into()],
            vec![Scalar::Int64(3), Scalar::Int64(1)],
        )
        .expect("series");
        let pairs = series.iter().collect::<Vec<_>>();
        assert_eq!(pairs[1], (&IndexLabel::from("Black"), &Scalar::Int64(1)));
    }

    #[test]
    fn row_reads_across_columns() {
        let frame = people();
        assert_eq!(
            frame.row(2).expect("row"),
            vec![&Scalar::from("Female"), &Scalar::Int64(50)]
        );
        assert!(frame.row(3).is_none());
    }
}
