use serde::{Deserialize, Serialize};
use tb_frame::{DataFrame, Predicate};

use crate::engine::TabularSummaryEngine;
use crate::error::SummaryError;
use crate::request::{AggregationRequest, Metric};
use crate::value::{SummaryResult, SummaryValue};

/// Column names the demographic profile reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographicColumns {
    pub race: String,
    pub sex: String,
    pub age: String,
    pub education: String,
    pub salary: String,
    pub hours_per_week: String,
    pub native_country: String,
    pub occupation: String,
}

impl Default for DemographicColumns {
    fn default() -> Self {
        Self {
            race: "race".to_owned(),
            sex: "sex".to_owned(),
            age: "age".to_owned(),
            education: "education".to_owned(),
            salary: "salary".to_owned(),
            hours_per_week: "hours_per_week".to_owned(),
            native_country: "native_country".to_owned(),
            occupation: "occupation".to_owned(),
        }
    }
}

impl DemographicColumns {
    /// Header spelling of the census CSV (`hours-per-week`, `native-country`).
    #[must_use]
    pub fn hyphenated() -> Self {
        Self {
            hours_per_week: "hours-per-week".to_owned(),
            native_country: "native-country".to_owned(),
            ..Self::default()
        }
    }

    fn all(&self) -> [&str; 8] {
        [
            &self.race,
            &self.sex,
            &self.age,
            &self.education,
            &self.salary,
            &self.hours_per_week,
            &self.native_country,
            &self.occupation,
        ]
    }
}

/// Category values the demographic profile filters on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographicConfig {
    pub columns: DemographicColumns,
    pub male: String,
    pub bachelors: String,
    pub advanced_education: Vec<String>,
    pub rich_salary: String,
    pub focus_country: String,
}

impl Default for DemographicConfig {
    fn default() -> Self {
        Self {
            columns: DemographicColumns::default(),
            male: "Male".to_owned(),
            bachelors: "Bachelors".to_owned(),
            advanced_education: vec![
                "Bachelors".to_owned(),
                "Masters".to_owned(),
                "Doctorate".to_owned(),
            ],
            rich_salary: ">50K".to_owned(),
            focus_country: "India".to_owned(),
        }
    }
}

/// Demographic profile over a census-style frame.
///
/// Produces, in order: `race_count`, `average_age_men`,
/// `percentage_bachelors`, `higher_education_rich`, `lower_education_rich`,
/// `min_work_hours`, `rich_percentage`, `highest_earning_country`,
/// `highest_earning_country_percentage`, `top_occ_india`.
///
/// `highest_earning_country` is the first entry of the per-country
/// breakdown sorted by percentage descending then country name ascending.
/// `top_occ_india` resolves frequency ties in favour of the occupation that
/// occurs first in row order.
pub fn demographic_summary(
    frame: &DataFrame,
    config: &DemographicConfig,
) -> Result<SummaryResult, SummaryError> {
    let cols = &config.columns;
    frame.require_all(&cols.all())?;
    if frame.is_empty() {
        return Err(SummaryError::EmptyDataset {
            metric: "demographic_summary".to_owned(),
        });
    }

    let engine = TabularSummaryEngine::new();
    let rich = Predicate::eq(cols.salary.as_str(), config.rich_salary.as_str());
    let advanced = Predicate::is_in(
        cols.education.as_str(),
        config.advanced_education.iter().map(String::as_str),
    );

    let mut out = engine.run(
        frame,
        &[
            AggregationRequest::new("race_count", Metric::Count).group_by(cols.race.as_str()),
            AggregationRequest::new("average_age_men", Metric::Mean)
                .column(cols.age.as_str())
                .filter(Predicate::eq(cols.sex.as_str(), config.male.as_str())),
            AggregationRequest::new("percentage_bachelors", Metric::Percentage).numerator(
                Predicate::eq(cols.education.as_str(), config.bachelors.as_str()),
            ),
            AggregationRequest::new("higher_education_rich", Metric::Percentage)
                .filter(advanced.clone())
                .numerator(rich.clone()),
            AggregationRequest::new("lower_education_rich", Metric::Percentage)
                .filter(advanced.negate())
                .numerator(rich.clone()),
            AggregationRequest::new("min_work_hours", Metric::Min).column(cols.hours_per_week.as_str()),
        ],
    )?;

    let min_hours = out
        .get("min_work_hours")
        .and_then(SummaryValue::to_scalar)
        .ok_or_else(|| SummaryError::EmptySubset {
            metric: "min_work_hours".to_owned(),
        })?;

    let by_country = engine.evaluate(
        frame,
        &AggregationRequest::new("country_rich_percentage", Metric::Percentage)
            .group_by(cols.native_country.as_str())
            .numerator(rich.clone()),
    )?;
    let (country, share) = by_country
        .as_breakdown()
        .and_then(|shares| shares.first().cloned())
        .ok_or_else(|| SummaryError::EmptySubset {
            metric: "highest_earning_country".to_owned(),
        })?;

    out.extend(engine.run(
        frame,
        &[AggregationRequest::new("rich_percentage", Metric::Percentage)
            .filter(Predicate::eq(cols.hours_per_week.as_str(), min_hours))
            .numerator(rich.clone())],
    )?);
    out.insert("highest_earning_country", SummaryValue::Text(country));
    out.insert(
        "highest_earning_country_percentage",
        SummaryValue::Float(share),
    );
    out.extend(engine.run(
        frame,
        &[AggregationRequest::new("top_occ_india", Metric::Mode)
            .column(cols.occupation.as_str())
            .filter(
                Predicate::eq(cols.native_country.as_str(), config.focus_country.as_str()).and(rich),
            )],
    )?);

    #[cfg(feature = "tracing")]
    tracing::debug!(rows = frame.num_rows(), metrics = out.len(), "demographic summary");

    Ok(out)
}
