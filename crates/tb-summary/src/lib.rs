#![forbid(unsafe_code)]

//! Summary statistics over an immutable [`DataFrame`](tb_frame::DataFrame).
//!
//! [`TabularSummaryEngine`] evaluates [`AggregationRequest`]s into an
//! ordered [`SummaryResult`]. The two fixed profiles are built on top of
//! it: [`demographic_summary`] (categorical/demographic table) and
//! [`matrix_statistics`] (3x3 matrix statistics).
//!
//! Floating-point means, percentages, variances and standard deviations
//! are rounded only when they are written into a `SummaryResult`; every
//! intermediate computation works on unrounded values.

mod demographic;
mod engine;
mod error;
mod matrix;
mod request;
mod value;

pub use demographic::{DemographicColumns, DemographicConfig, demographic_summary};
pub use engine::TabularSummaryEngine;
pub use error::SummaryError;
pub use matrix::{AxisStats, MATRIX_SIDE, MatrixMetric, MatrixStatistics, matrix_statistics, matrix_statistics_i64};
pub use request::{AggregationRequest, Metric};
pub use value::{SummaryResult, SummaryValue};
