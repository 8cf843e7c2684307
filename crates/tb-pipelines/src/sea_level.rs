use serde::Serialize;
use tb_columnar::ColumnError;
use tb_frame::{DataFrame, FrameError};
use tb_stats::{LinearFit, linear_fit};
use tb_types::ColumnKind;

use crate::PipelineError;

pub const YEAR_COLUMN: &str = "Year";
pub const LEVEL_COLUMN: &str = "CSIRO Adjusted Sea Level";

const FULL_START: i64 = 1880;
const RECENT_START: i64 = 2000;
const PROJECTION_END: i64 = 2050;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i64,
    pub level: f64,
}

/// Fitted lines projected to the end of the forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLines {
    pub full_fit: LinearFit,
    pub full: Vec<TrendPoint>,
    pub recent_fit: LinearFit,
    pub recent: Vec<TrendPoint>,
}

/// Yearly sea level observations.
#[derive(Debug, Clone)]
pub struct SeaLevelPipeline {
    observations: Vec<(f64, f64)>,
}

impl SeaLevelPipeline {
    /// Rows missing either the year or the level are skipped.
    pub fn new(frame: &DataFrame) -> Result<Self, PipelineError> {
        frame.require_all(&[YEAR_COLUMN, LEVEL_COLUMN])?;
        for name in [YEAR_COLUMN, LEVEL_COLUMN] {
            let column = frame.require(name)?;
            if column.kind() != ColumnKind::Numeric {
                return Err(FrameError::NonNumericColumn {
                    name: name.to_owned(),
                    dtype: column.dtype(),
                }
                .into());
            }
        }
        let years = frame.require(YEAR_COLUMN)?;
        let levels = frame.require(LEVEL_COLUMN)?;

        let observations = years
            .values()
            .iter()
            .zip(levels.values())
            .filter(|(year, level)| !year.is_missing() && !level.is_missing())
            .map(|(year, level)| {
                Ok((
                    year.to_f64().map_err(ColumnError::from)?,
                    level.to_f64().map_err(ColumnError::from)?,
                ))
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        Ok(Self { observations })
    }

    /// `(year, level)` pairs in input order.
    #[must_use]
    pub fn observations(&self) -> &[(f64, f64)] {
        &self.observations
    }

    pub fn fit_all(&self) -> Result<LinearFit, PipelineError> {
        fit(self.observations.iter(), "sea level trend")
    }

    pub fn fit_since(&self, year: i64) -> Result<LinearFit, PipelineError> {
        let start = year as f64;
        fit(
            self.observations.iter().filter(|(x, _)| *x >= start),
            format!("sea level trend since {year}"),
        )
    }

    /// Full-history fit over 1880..=2050 and the fit since 2000 over
    /// 2000..=2050.
    pub fn trend_lines(&self) -> Result<TrendLines, PipelineError> {
        let full_fit = self.fit_all()?;
        let recent_fit = self.fit_since(RECENT_START)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            full_slope = full_fit.slope,
            recent_slope = recent_fit.slope,
            "sea level trend lines"
        );

        Ok(TrendLines {
            full: project(&full_fit, FULL_START),
            full_fit,
            recent: project(&recent_fit, RECENT_START),
            recent_fit,
        })
    }
}

fn fit<'a>(
    points: impl Iterator<Item = &'a (f64, f64)>,
    what: impl Into<String>,
) -> Result<LinearFit, PipelineError> {
    let (x, y): (Vec<f64>, Vec<f64>) = points.copied().unzip();
    linear_fit(&x, &y).map_err(|err| PipelineError::insufficient(what, err))
}

fn project(fit: &LinearFit, start: i64) -> Vec<TrendPoint> {
    (start..=PROJECTION_END)
        .map(|year| TrendPoint {
            year,
            level: fit.predict(year as f64),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use tb_columnar::Column;
    use tb_frame::DataFrame;

    use super::{LEVEL_COLUMN, SeaLevelPipeline, YEAR_COLUMN};
    use crate::PipelineError;

    fn levels(years: impl IntoIterator<Item = i64>, level: impl Fn(f64) -> f64) -> DataFrame {
        let years = years.into_iter().collect::<Vec<_>>();
        let values = years.iter().map(|&y| level(y as f64)).collect::<Vec<_>>();
        DataFrame::from_columns(vec![
            (YEAR_COLUMN, Column::from_i64(years)),
            (LEVEL_COLUMN, Column::from_f64(values)),
        ])
        .expect("frame")
    }

    #[test]
    fn collinear_history_projects_exactly() {
        let frame = levels(1880..=2013, |year| 0.05 * (year - 1880.0));
        let pipeline = SeaLevelPipeline::new(&frame).expect("pipeline");
        let lines = pipeline.trend_lines().expect("lines");

        assert_eq!(lines.full.len(), 171);
        assert_eq!(lines.full[0].year, 1880);
        assert_eq!(lines.recent.first().map(|p| p.year), Some(2000));
        assert_eq!(lines.recent.last().map(|p| p.year), Some(2050));
        assert!((lines.full_fit.slope - 0.05).abs() < 1e-9);
        assert!((lines.full.last().expect("point").level - 8.5).abs() < 1e-6);
        assert!((lines.recent_fit.rvalue - 1.0).abs() < 1e-9);
    }

    #[test]
    fn recent_fit_only_uses_later_years() {
        let frame = levels(1990..=2010, |year| if year < 2000.0 { 0.0 } else { year - 2000.0 });
        let pipeline = SeaLevelPipeline::new(&frame).expect("pipeline");
        let recent = pipeline.fit_since(2000).expect("fit");
        assert!((recent.slope - 1.0).abs() < 1e-9);
        assert!((recent.predict(2050.0) - 50.0).abs() < 1e-6);
    }

    #[test]
    fn too_few_points_is_insufficient_data() {
        let frame = levels([1999, 2000], |_| 1.0);
        let pipeline = SeaLevelPipeline::new(&frame).expect("pipeline");
        let err = pipeline.fit_since(2000).expect_err("one point");
        assert!(matches!(err, PipelineError::InsufficientData { .. }));
        assert!(matches!(
            pipeline.trend_lines(),
            Err(PipelineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn missing_level_column_is_reported() {
        let frame = DataFrame::from_columns(vec![(YEAR_COLUMN, Column::from_i64([2000]))])
            .expect("frame");
        assert!(matches!(
            SeaLevelPipeline::new(&frame),
            Err(PipelineError::Frame(_))
        ));
    }
}
