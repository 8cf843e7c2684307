use tb_columnar::ColumnError;
use tb_frame::FrameError;
use tb_groupby::GroupByError;
use tb_types::DType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("expected exactly {expected} values, got {actual}")]
    InvalidInputSize { expected: usize, actual: usize },
    #[error("required column {name:?} is missing")]
    MissingColumn { name: String },
    #[error("{metric} needs at least one row but the dataset is empty")]
    EmptyDataset { metric: String },
    #[error("{metric} needs at least one row but its subset is empty")]
    EmptySubset { metric: String },
    #[error("column {name:?} has dtype {dtype:?}; {metric} requires a numeric column")]
    NonNumericColumn {
        name: String,
        dtype: DType,
        metric: String,
    },
    #[error("request {label:?} is malformed: {reason}")]
    InvalidRequest { label: String, reason: &'static str },
    #[error(transparent)]
    Frame(FrameError),
    #[error(transparent)]
    GroupBy(#[from] GroupByError),
    #[error(transparent)]
    Column(#[from] ColumnError),
}

impl From<FrameError> for SummaryError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::MissingColumn { name } => Self::MissingColumn { name },
            other => Self::Frame(other),
        }
    }
}

impl SummaryError {
    /// Empty input error for `metric`: `EmptyDataset` when the whole frame
    /// has no rows, `EmptySubset` when only the filtered base is empty.
    pub(crate) fn empty(metric: &str, dataset_rows: usize) -> Self {
        let metric = metric.to_owned();
        if dataset_rows == 0 {
            Self::EmptyDataset { metric }
        } else {
            Self::EmptySubset { metric }
        }
    }
}
