#![forbid(unsafe_code)]

//! Analysis pipelines built on tabstat frames.
//!
//! Each pipeline is an explicit value constructed from a
//! [`DataFrame`](tb_frame::DataFrame); every later step borrows it, so a
//! pipeline can be queried any number of times without re-reading input.

mod error;
mod medical;
mod page_views;
mod sea_level;

pub use error::PipelineError;
pub use medical::{
    CATEGORICAL_VARIABLES, CorrelationMatrix, MEDICAL_COLUMNS, MedicalPipeline,
};
pub use page_views::{
    DailyViews, LabelledBox, MONTH_ABBREVIATIONS, MONTH_NAMES, MonthlyMeans, PageViewBoxes,
    PageViewPipeline, YearMonths,
};
pub use sea_level::{LEVEL_COLUMN, SeaLevelPipeline, TrendLines, TrendPoint, YEAR_COLUMN};
