use tb_columnar::ColumnError;
use tb_frame::FrameError;
use tb_groupby::GroupByError;
use tb_stats::StatsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("row {row}: {value:?} is not a YYYY-MM-DD date")]
    InvalidDate { row: usize, value: String },
    #[error("{what}: {reason}")]
    InsufficientData { what: String, reason: String },
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error(transparent)]
    GroupBy(#[from] GroupByError),
    #[error(transparent)]
    Stats(#[from] StatsError),
}

impl PipelineError {
    pub(crate) fn insufficient(what: impl Into<String>, err: StatsError) -> Self {
        match err {
            StatsError::NotEnoughValues { .. } | StatsError::ConstantInput => {
                Self::InsufficientData {
                    what: what.into(),
                    reason: err.to_string(),
                }
            }
            other => Self::Stats(other),
        }
    }
}
