use serde::{Deserialize, Serialize};
use tb_frame::Predicate;
use tb_stats::AggFunc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Count,
    Mean,
    Percentage,
    Min,
    Max,
    Mode,
    Sum,
    Variance,
    StdDev,
}

impl Metric {
    /// Metrics whose floating-point output is rounded at the final step.
    #[must_use]
    pub fn is_rounded(self) -> bool {
        matches!(
            self,
            Self::Mean | Self::Percentage | Self::Variance | Self::StdDev
        )
    }

    /// Metrics that only make sense on numeric columns.
    #[must_use]
    pub fn requires_numeric(self) -> bool {
        matches!(
            self,
            Self::Mean | Self::Min | Self::Max | Self::Sum | Self::Variance | Self::StdDev
        )
    }

    pub(crate) fn reducer(self) -> Option<AggFunc> {
        match self {
            Self::Mean => Some(AggFunc::Mean),
            Self::Min => Some(AggFunc::Min),
            Self::Max => Some(AggFunc::Max),
            Self::Sum => Some(AggFunc::Sum),
            Self::Variance => Some(AggFunc::Var),
            Self::StdDev => Some(AggFunc::Std),
            Self::Count | Self::Percentage | Self::Mode => None,
        }
    }
}

/// One metric to compute. `filter` selects the rows the metric is computed
/// over; for `Percentage` those rows are the denominator and `numerator`
/// selects the counted rows within them. `group_by` turns the scalar into a
/// per-category breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRequest {
    pub label: String,
    pub metric: Metric,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub filter: Option<Predicate>,
    #[serde(default)]
    pub numerator: Option<Predicate>,
    #[serde(default)]
    pub group_by: Option<String>,
}

impl AggregationRequest {
    pub fn new(label: impl Into<String>, metric: Metric) -> Self {
        Self {
            label: label.into(),
            metric,
            column: None,
            filter: None,
            numerator: None,
            group_by: None,
        }
    }

    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(predicate);
        self
    }

    #[must_use]
    pub fn numerator(mut self, predicate: Predicate) -> Self {
        self.numerator = Some(predicate);
        self
    }

    #[must_use]
    pub fn group_by(mut self, key: impl Into<String>) -> Self {
        self.group_by = Some(key.into());
        self
    }
}
