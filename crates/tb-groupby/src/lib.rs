#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tb_columnar::{Column, ColumnError};
use tb_frame::{FrameError, Series};
use tb_index::{Index, IndexLabel};
use tb_stats::AggFunc;
use tb_types::{ColumnKind, NullKind, Scalar};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupByOptions {
    /// Skip rows whose key (any key, for multi-key grouping) is missing.
    pub dropna: bool,
    /// Order groups by key ascending instead of first-seen order.
    pub sort: bool,
}

impl Default for GroupByOptions {
    fn default() -> Self {
        Self {
            dropna: true,
            sort: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum GroupByError {
    #[error("key column length ({keys}) does not match value length ({values})")]
    LengthMismatch { keys: usize, values: usize },
    #[error("group-by needs at least one key column")]
    NoKeys,
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Column(#[from] ColumnError),
}

/// Multi-key grouping result: one row per distinct key tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedTable {
    pub keys: Vec<Vec<Scalar>>,
    /// `None` where the reducer is undefined for the group (e.g. mean of a
    /// group whose values are all missing).
    pub values: Vec<Option<f64>>,
}

impl GroupedTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[Scalar], Option<f64>)> {
        self.keys.iter().map(Vec::as_slice).zip(self.values.iter().copied())
    }

    /// Value of the group whose key tuple matches `key`.
    #[must_use]
    pub fn get(&self, key: &[Scalar]) -> Option<Option<f64>> {
        self.iter()
            .find(|(candidate, _)| {
                candidate.len() == key.len()
                    && candidate.iter().zip(key).all(|(a, b)| a.matches(b))
            })
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum GroupKeyRef<'a> {
    Bool(bool),
    Int64(i64),
    FloatBits(u64),
    Utf8(&'a str),
    Null,
}

impl<'a> GroupKeyRef<'a> {
    fn from_scalar(key: &'a Scalar) -> Self {
        match key {
            Scalar::Bool(v) => Self::Bool(*v),
            // Integral floats share a group with the equal Int64.
            Scalar::Float64(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                Self::Int64(*v as i64)
            }
            Scalar::Int64(v) => Self::Int64(*v),
            Scalar::Float64(v) if v.is_nan() => Self::Null,
            Scalar::Float64(v) => Self::FloatBits(v.to_bits()),
            Scalar::Utf8(v) => Self::Utf8(v.as_str()),
            Scalar::Null(_) => Self::Null,
        }
    }
}

/// Row positions per group, groups in first-seen order.
fn partition<'a>(
    keys: &[&'a Column],
    dropna: bool,
) -> Result<Vec<(Vec<&'a Scalar>, Vec<usize>)>, GroupByError> {
    let first = keys.first().ok_or(GroupByError::NoKeys)?;
    let rows = first.len();
    if let Some(bad) = keys.iter().find(|column| column.len() != rows) {
        return Err(GroupByError::LengthMismatch {
            keys: rows,
            values: bad.len(),
        });
    }

    let mut groups = Vec::<(Vec<&'a Scalar>, Vec<usize>)>::new();
    let mut slot = HashMap::<Vec<GroupKeyRef<'a>>, usize>::new();

    for row in 0..rows {
        let tuple = keys
            .iter()
            .filter_map(|&column| column.value(row))
            .collect::<Vec<_>>();
        if dropna && tuple.iter().any(|key| key.is_missing()) {
            continue;
        }

        let id = tuple.iter().map(|&key| GroupKeyRef::from_scalar(key)).collect();
        let at = *slot.entry(id).or_insert_with(|| {
            groups.push((tuple, Vec::new()));
            groups.len() - 1
        });
        groups[at].1.push(row);
    }

    Ok(groups)
}

fn compare_tuples(left: &[Scalar], right: &[Scalar]) -> Ordering {
    left.iter()
        .zip(right)
        .map(|(a, b)| match (a.is_missing(), b.is_missing()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.partial_cmp_value(b).unwrap_or(Ordering::Equal),
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Reduces `values` per distinct key tuple. `AggFunc::Count` counts
/// non-missing values, mirroring the other reducers' missing handling.
pub fn groupby_agg(
    keys: &[&Column],
    values: &Column,
    func: AggFunc,
    options: GroupByOptions,
) -> Result<GroupedTable, GroupByError> {
    let groups = partition(keys, options.dropna)?;
    if values.len() != keys[0].len() {
        return Err(GroupByError::LengthMismatch {
            keys: keys[0].len(),
            values: values.len(),
        });
    }
    if func != AggFunc::Count && values.kind() != ColumnKind::Numeric {
        return Err(ColumnError::NonNumeric {
            dtype: values.dtype(),
        }
        .into());
    }

    let mut out = groups
        .into_iter()
        .map(|(tuple, rows)| {
            let bucket = rows
                .iter()
                .filter_map(|&row| values.value(row))
                .filter(|value| !value.is_missing())
                .map(|value| value.to_f64().map_err(ColumnError::from))
                .collect::<Result<Vec<_>, _>>();
            let key = tuple.into_iter().cloned().collect::<Vec<_>>();
            match (func, bucket) {
                (AggFunc::Count, _) => {
                    let present = rows
                        .iter()
                        .filter(|&&row| values.value(row).is_some_and(|v| !v.is_missing()))
                        .count();
                    Ok((key, Some(present as f64)))
                }
                (_, Ok(bucket)) => Ok((key, func.apply(&bucket))),
                (_, Err(err)) => Err(err),
            }
        })
        .collect::<Result<Vec<_>, ColumnError>>()?;

    if options.sort {
        out.sort_by(|(a, _), (b, _)| compare_tuples(a, b));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(groups = out.len(), ?func, "groupby_agg");

    let (keys, values) = out.into_iter().unzip();
    Ok(GroupedTable { keys, values })
}

/// Number of rows per distinct key tuple (`size()` semantics: rows count
/// regardless of any value column).
pub fn groupby_size(keys: &[&Column], options: GroupByOptions) -> Result<GroupedTable, GroupByError> {
    let mut out = partition(keys, options.dropna)?
        .into_iter()
        .map(|(tuple, rows)| {
            (
                tuple.into_iter().cloned().collect::<Vec<_>>(),
                Some(rows.len() as f64),
            )
        })
        .collect::<Vec<_>>();

    if options.sort {
        out.sort_by(|(a, _), (b, _)| compare_tuples(a, b));
    }

    let (keys, values) = out.into_iter().unzip();
    Ok(GroupedTable { keys, values })
}

/// Single-key reduction as a `Series` indexed by the key values. Undefined
/// group results are NaN.
pub fn groupby_series(
    keys: &Column,
    values: &Column,
    func: AggFunc,
    options: GroupByOptions,
) -> Result<Series, GroupByError> {
    let table = groupby_agg(&[keys], values, func, options)?;
    let labels = table
        .keys
        .iter()
        .map(|tuple| label_for(&tuple[0]))
        .collect::<Vec<_>>();
    let column = Column::from_f64(table.values.iter().map(|value| value.unwrap_or(f64::NAN)));
    Ok(Series::new(func_name(func), Index::new(labels), column)?)
}

/// Occurrences of each distinct value, most frequent first. Groups with
/// equal counts keep first-seen order (stable sort).
pub fn value_counts(column: &Column, options: GroupByOptions) -> Result<Series, GroupByError> {
    let mut counts = partition(&[column], options.dropna)?
        .into_iter()
        .map(|(tuple, rows)| (label_for(tuple[0]), rows.len() as i64))
        .collect::<Vec<_>>();
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let (labels, counts): (Vec<_>, Vec<_>) = counts.into_iter().unzip();
    Ok(Series::new(
        "count",
        Index::new(labels),
        Column::from_i64(counts),
    )?)
}

fn label_for(key: &Scalar) -> IndexLabel {
    match key {
        Scalar::Int64(v) => IndexLabel::Int64(*v),
        Scalar::Utf8(v) => IndexLabel::Utf8(v.clone()),
        Scalar::Bool(v) => IndexLabel::Utf8(v.to_string()),
        Scalar::Null(NullKind::NaN | NullKind::Null) => IndexLabel::Utf8("<null>".to_owned()),
        Scalar::Float64(v) => IndexLabel::Utf8(v.to_string()),
    }
}

fn func_name(func: AggFunc) -> &'static str {
    match func {
        AggFunc::Count => "count",
        AggFunc::Sum => "sum",
        AggFunc::Mean => "mean",
        AggFunc::Min => "min",
        AggFunc::Max => "max",
        AggFunc::Var => "var",
        AggFunc::Std => "std",
    }
}
