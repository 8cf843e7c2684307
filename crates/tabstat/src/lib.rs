#![forbid(unsafe_code)]

//! Summary statistics over tabular data.
//!
//! ```no_run
//! use tabstat::prelude::*;
//!
//! let frame = read_csv_path("adult.data.csv")?;
//! let config = DemographicConfig {
//!     columns: DemographicColumns::hyphenated(),
//!     ..DemographicConfig::default()
//! };
//! let summary = demographic_summary(&frame, &config)?;
//! println!("{:?}", summary.get("highest_earning_country"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use tb_columnar as columnar;
pub use tb_frame as frame;
pub use tb_groupby as groupby;
pub use tb_index as index;
pub use tb_io as io;
pub use tb_pipelines as pipelines;
pub use tb_stats as stats;
pub use tb_summary as summary;
pub use tb_types as types;

pub mod prelude {
    pub use tb_columnar::{Column, CompareOp};
    pub use tb_frame::{DataFrame, FrameError, Predicate, Series};
    pub use tb_io::{IoError, read_csv_path, read_csv_str, write_csv_string};
    pub use tb_pipelines::{MedicalPipeline, PageViewPipeline, PipelineError, SeaLevelPipeline};
    pub use tb_summary::{
        AggregationRequest, DemographicColumns, DemographicConfig, Metric, SummaryError,
        SummaryResult, SummaryValue, TabularSummaryEngine, demographic_summary,
        matrix_statistics, matrix_statistics_i64,
    };
    pub use tb_types::{DType, Scalar};
}
