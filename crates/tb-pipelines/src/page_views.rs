use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tb_columnar::{Column, ColumnError};
use tb_frame::{DataFrame, Predicate};
use tb_groupby::{GroupByOptions, groupby_agg};
use tb_stats::{AggFunc, BoxSummary, quantile};
use tb_types::Scalar;

use crate::PipelineError;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const DATE_FORMAT: &str = "%Y-%m-%d";
const LOWER_QUANTILE: f64 = 0.025;
const UPPER_QUANTILE: f64 = 0.975;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyViews {
    pub date: NaiveDate,
    pub value: f64,
}

/// Mean daily views of one year, January through December. `None` for
/// months without observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearMonths {
    pub year: i32,
    pub months: [Option<f64>; 12],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMeans {
    /// Ascending by year.
    pub years: Vec<YearMonths>,
}

impl MonthlyMeans {
    /// `month` is 1-based.
    #[must_use]
    pub fn get(&self, year: i32, month: u32) -> Option<f64> {
        let slot = usize::try_from(month).ok()?.checked_sub(1)?;
        self.years
            .iter()
            .find(|row| row.year == year)
            .and_then(|row| row.months.get(slot).copied().flatten())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledBox {
    pub label: String,
    #[serde(flatten)]
    pub summary: BoxSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageViewBoxes {
    /// Ascending by year.
    pub by_year: Vec<LabelledBox>,
    /// January through December, months without data omitted.
    pub by_month: Vec<LabelledBox>,
}

/// Daily page views with the top and bottom 2.5% of days removed.
#[derive(Debug, Clone)]
pub struct PageViewPipeline {
    days: Vec<DailyViews>,
}

impl PageViewPipeline {
    /// Parses `date` as `YYYY-MM-DD` for every row, then keeps rows whose
    /// `value` lies within its 2.5th..97.5th percentile range. Rows with a
    /// missing value are dropped.
    pub fn prepare(frame: &DataFrame) -> Result<Self, PipelineError> {
        frame.require_all(&["date", "value"])?;

        let dates = frame
            .require("date")?
            .values()
            .iter()
            .enumerate()
            .map(|(row, cell)| parse_date(row, cell))
            .collect::<Result<Vec<_>, _>>()?;

        let observed = frame.numeric("value")?;
        let low = quantile(&observed, LOWER_QUANTILE)?;
        let high = quantile(&observed, UPPER_QUANTILE)?;
        let keep = frame.mask(&Predicate::ge("value", low).and(Predicate::le("value", high)))?;

        let values = frame.require("value")?;
        let days = dates
            .into_iter()
            .zip(values.values())
            .zip(keep)
            .filter(|(_, keep)| *keep)
            .map(|((date, value), _)| {
                let value = value.to_f64().map_err(ColumnError::from)?;
                Ok(DailyViews { date, value })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rows_in = frame.num_rows(),
            rows_out = days.len(),
            "page view pipeline prepared"
        );

        Ok(Self { days })
    }

    /// Surviving days in input order.
    #[must_use]
    pub fn daily_series(&self) -> &[DailyViews] {
        &self.days
    }

    pub fn monthly_means(&self) -> Result<MonthlyMeans, PipelineError> {
        let years = Column::from_i64(self.days.iter().map(|day| i64::from(day.date.year())));
        let months = Column::from_i64(self.days.iter().map(|day| i64::from(day.date.month())));
        let values = Column::from_f64(self.days.iter().map(|day| day.value));
        let table = groupby_agg(
            &[&years, &months],
            &values,
            AggFunc::Mean,
            GroupByOptions {
                dropna: true,
                sort: true,
            },
        )?;

        let mut out: Vec<YearMonths> = Vec::new();
        for (key, mean) in table.iter() {
            let (Scalar::Int64(year), Scalar::Int64(month)) = (&key[0], &key[1]) else {
                continue;
            };
            let year = i32::try_from(*year).unwrap_or_default();
            if out.last().is_none_or(|row| row.year != year) {
                out.push(YearMonths {
                    year,
                    months: [None; 12],
                });
            }
            if let (Some(row), Ok(slot)) = (out.last_mut(), usize::try_from(month - 1)) {
                row.months[slot] = mean;
            }
        }
        Ok(MonthlyMeans { years: out })
    }

    /// Five-number summaries grouped by year (trend) and by calendar month
    /// (seasonality).
    pub fn box_summaries(&self) -> Result<PageViewBoxes, PipelineError> {
        let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
        let mut by_month: [Vec<f64>; 12] = Default::default();
        for day in &self.days {
            by_year.entry(day.date.year()).or_default().push(day.value);
            by_month[day.date.month0() as usize].push(day.value);
        }

        let by_year = by_year
            .into_iter()
            .map(|(year, values)| {
                Ok(LabelledBox {
                    label: year.to_string(),
                    summary: BoxSummary::from_values(&values)?,
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;
        let by_month = MONTH_ABBREVIATIONS
            .iter()
            .zip(&by_month)
            .filter(|(_, values)| !values.is_empty())
            .map(|(label, values)| {
                Ok(LabelledBox {
                    label: (*label).to_owned(),
                    summary: BoxSummary::from_values(values)?,
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        Ok(PageViewBoxes { by_year, by_month })
    }
}

fn parse_date(row: usize, cell: &Scalar) -> Result<NaiveDate, PipelineError> {
    let invalid = || PipelineError::InvalidDate {
        row,
        value: cell.to_string(),
    };
    let text = cell.as_str().ok_or_else(invalid)?;
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|_| invalid())
}
