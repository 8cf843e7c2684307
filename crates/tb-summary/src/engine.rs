use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tb_columnar::Column;
use tb_frame::{DataFrame, Predicate};
use tb_groupby::{GroupByOptions, groupby_agg, groupby_size, value_counts};
use tb_stats::{AggFunc, mode, percentage, round_to};
use tb_types::{ColumnKind, DType, Scalar};

use crate::error::SummaryError;
use crate::request::{AggregationRequest, Metric};
use crate::value::{SummaryResult, SummaryValue};

pub(crate) const DEFAULT_DECIMALS: u32 = 1;

/// Evaluates aggregation requests against a frame. Holds no state besides
/// the output rounding precision, so repeated runs over the same frame
/// produce identical results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularSummaryEngine {
    decimals: u32,
}

impl Default for TabularSummaryEngine {
    fn default() -> Self {
        Self {
            decimals: DEFAULT_DECIMALS,
        }
    }
}

impl TabularSummaryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_decimals(decimals: u32) -> Self {
        Self { decimals }
    }

    #[must_use]
    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Evaluates `requests` in order. The first failing request aborts the
    /// run.
    pub fn run(
        &self,
        frame: &DataFrame,
        requests: &[AggregationRequest],
    ) -> Result<SummaryResult, SummaryError> {
        let mut out = SummaryResult::new();
        for request in requests {
            let value = self.evaluate(frame, request)?;
            out.insert(request.label.clone(), value);
        }
        Ok(out)
    }

    pub fn evaluate(
        &self,
        frame: &DataFrame,
        request: &AggregationRequest,
    ) -> Result<SummaryValue, SummaryError> {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            label = %request.label,
            metric = ?request.metric,
            rows = frame.num_rows(),
            "evaluate summary request"
        );

        let base = match &request.filter {
            Some(predicate) => Cow::Owned(frame.filter(predicate)?),
            None => Cow::Borrowed(frame),
        };

        match &request.group_by {
            None => self.scalar(frame.num_rows(), &base, request),
            Some(key) => self.grouped(&base, key, request),
        }
    }

    fn round(&self, metric: Metric, value: f64) -> f64 {
        if metric.is_rounded() {
            round_to(value, self.decimals)
        } else {
            value
        }
    }

    fn target<'a>(
        &self,
        base: &'a DataFrame,
        request: &AggregationRequest,
    ) -> Result<&'a Column, SummaryError> {
        let name = request
            .column
            .as_deref()
            .ok_or_else(|| SummaryError::InvalidRequest {
                label: request.label.clone(),
                reason: "metric needs a target column",
            })?;
        let column = base.require(name)?;
        if request.metric.requires_numeric() && column.kind() != ColumnKind::Numeric {
            return Err(SummaryError::NonNumericColumn {
                name: name.to_owned(),
                dtype: column.dtype(),
                metric: request.label.clone(),
            });
        }
        Ok(column)
    }

    fn numerator<'a>(
        &self,
        request: &'a AggregationRequest,
    ) -> Result<&'a Predicate, SummaryError> {
        request
            .numerator
            .as_ref()
            .ok_or_else(|| SummaryError::InvalidRequest {
                label: request.label.clone(),
                reason: "percentage needs a numerator predicate",
            })
    }

    fn scalar(
        &self,
        dataset_rows: usize,
        base: &DataFrame,
        request: &AggregationRequest,
    ) -> Result<SummaryValue, SummaryError> {
        let empty = || SummaryError::empty(&request.label, dataset_rows);

        match request.metric {
            Metric::Count => match request.column {
                None => Ok(SummaryValue::Integer(base.num_rows() as i64)),
                Some(_) => {
                    let column = self.target(base, request)?;
                    Ok(SummaryValue::Integer(column.validity().count_valid() as i64))
                }
            },
            Metric::Percentage => {
                let hits = count_true(&base.mask(self.numerator(request)?)?);
                let share = percentage(hits, base.num_rows()).ok_or_else(empty)?;
                Ok(SummaryValue::Float(self.round(request.metric, share)))
            }
            Metric::Mode => {
                let column = self.target(base, request)?;
                let present = column
                    .values()
                    .iter()
                    .filter(|value| !value.is_missing())
                    .collect::<Vec<_>>();
                let winner = mode(present.iter().map(ToString::to_string)).ok_or_else(empty)?;
                let scalar = present
                    .into_iter()
                    .find(|value| value.to_string() == winner)
                    .ok_or_else(empty)?;
                Ok(scalar_value(scalar))
            }
            metric => {
                let func = metric.reducer().ok_or_else(|| SummaryError::InvalidRequest {
                    label: request.label.clone(),
                    reason: "metric has no numeric reducer",
                })?;
                let column = self.target(base, request)?;
                let raw = func.apply(&column.numeric_values()?).ok_or_else(empty)?;
                Ok(match (metric, column.dtype()) {
                    (Metric::Min | Metric::Max | Metric::Sum, DType::Int64 | DType::Bool) => {
                        SummaryValue::Integer(raw as i64)
                    }
                    _ => SummaryValue::Float(self.round(metric, raw)),
                })
            }
        }
    }

    fn grouped(
        &self,
        base: &DataFrame,
        key: &str,
        request: &AggregationRequest,
    ) -> Result<SummaryValue, SummaryError> {
        let keys = base.require(key)?;
        let options = GroupByOptions::default();

        match request.metric {
            Metric::Count if request.column.is_none() => {
                let counts = value_counts(keys, options)?;
                let pairs = counts
                    .iter()
                    .map(|(label, count)| {
                        (label.to_string(), count.to_f64().map_or(0, |v| v as i64))
                    })
                    .collect();
                Ok(SummaryValue::Counts(pairs))
            }
            Metric::Count => {
                let column = self.target(base, request)?;
                let table = groupby_agg(&[keys], column, AggFunc::Count, options)?;
                let pairs = table
                    .iter()
                    .map(|(tuple, count)| (tuple[0].to_string(), count.unwrap_or_default() as i64))
                    .collect();
                Ok(SummaryValue::Counts(pairs))
            }
            Metric::Percentage => {
                let hits = base.filter(self.numerator(request)?)?;
                let totals = groupby_size(&[keys], options)?;
                let matched = groupby_size(&[hits.require(key)?], options)?;

                // Groups without a single matching row are 0%, not missing.
                let mut shares = totals
                    .iter()
                    .map(|(tuple, total)| {
                        let total = total.unwrap_or_default() as usize;
                        let hit = matched.get(tuple).flatten().unwrap_or_default() as usize;
                        (tuple[0].to_string(), percentage(hit, total).unwrap_or(0.0))
                    })
                    .collect::<Vec<_>>();
                shares.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

                Ok(SummaryValue::Breakdown(
                    shares
                        .into_iter()
                        .map(|(label, share)| (label, self.round(request.metric, share)))
                        .collect(),
                ))
            }
            Metric::Mode => {
                let column = self.target(base, request)?;
                let mut order = Vec::<String>::new();
                let mut buckets = HashMap::<String, Vec<String>>::new();
                for (group, value) in keys.values().iter().zip(column.values()) {
                    if group.is_missing() || value.is_missing() {
                        continue;
                    }
                    let group = group.to_string();
                    buckets
                        .entry(group.clone())
                        .or_insert_with(|| {
                            order.push(group);
                            Vec::new()
                        })
                        .push(value.to_string());
                }

                let pairs = order
                    .into_iter()
                    .filter_map(|group| {
                        let winner = mode(buckets.remove(&group)?)?;
                        Some((group, winner))
                    })
                    .collect();
                Ok(SummaryValue::Categories(pairs))
            }
            metric => {
                let func = metric.reducer().ok_or_else(|| SummaryError::InvalidRequest {
                    label: request.label.clone(),
                    reason: "metric has no numeric reducer",
                })?;
                let column = self.target(base, request)?;
                let table = groupby_agg(&[keys], column, func, options)?;
                let pairs = table
                    .iter()
                    .map(|(tuple, value)| {
                        let value = value.map_or(f64::NAN, |v| self.round(metric, v));
                        (tuple[0].to_string(), value)
                    })
                    .collect();
                Ok(SummaryValue::Breakdown(pairs))
            }
        }
    }
}

fn count_true(mask: &[bool]) -> usize {
    mask.iter().filter(|bit| **bit).count()
}

fn scalar_value(scalar: &Scalar) -> SummaryValue {
    match scalar {
        Scalar::Int64(v) => SummaryValue::Integer(*v),
        Scalar::Bool(v) => SummaryValue::Integer(i64::from(*v)),
        Scalar::Float64(v) => SummaryValue::Float(*v),
        Scalar::Utf8(_) | Scalar::Null(_) => SummaryValue::Text(scalar.to_string()),
    }
}
