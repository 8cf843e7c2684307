use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tb_types::Scalar;

use crate::matrix::AxisStats;

/// One computed metric.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryValue {
    Integer(i64),
    Float(f64),
    Text(String),
    /// Category → row count, in the order the metric defines.
    Counts(Vec<(String, i64)>),
    /// Category → numeric result (percentage, mean, ...).
    Breakdown(Vec<(String, f64)>),
    /// Category → categorical result (per-group mode).
    Categories(Vec<(String, String)>),
    /// `[column_vector, row_vector, overall]` of a 3x3 matrix.
    Axes(AxisStats),
    /// [`SummaryValue::Axes`] of an exact integer statistic.
    IntegerAxes(AxisStats<i64>),
}

impl SummaryValue {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_counts(&self) -> Option<&[(String, i64)]> {
        match self {
            Self::Counts(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_breakdown(&self) -> Option<&[(String, f64)]> {
        match self {
            Self::Breakdown(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_axes(&self) -> Option<&AxisStats> {
        match self {
            Self::Axes(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_integer_axes(&self) -> Option<&AxisStats<i64>> {
        match self {
            Self::IntegerAxes(v) => Some(v),
            _ => None,
        }
    }

    /// Scalar form of a scalar-valued result, for feeding one result into
    /// a later request's predicate.
    #[must_use]
    pub fn to_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Integer(v) => Some(Scalar::Int64(*v)),
            Self::Float(v) => Some(Scalar::Float64(*v)),
            Self::Text(v) => Some(Scalar::Utf8(v.clone())),
            _ => None,
        }
    }
}

fn serialize_pairs<S, V>(serializer: S, pairs: &[(String, V)]) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (key, value) in pairs {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

impl Serialize for SummaryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::Counts(pairs) => serialize_pairs(serializer, pairs),
            Self::Breakdown(pairs) => serialize_pairs(serializer, pairs),
            Self::Categories(pairs) => serialize_pairs(serializer, pairs),
            Self::Axes(axes) => (axes.columns, axes.rows, axes.overall).serialize(serializer),
            Self::IntegerAxes(axes) => {
                (axes.columns, axes.rows, axes.overall).serialize(serializer)
            }
        }
    }
}

/// Ordered label → value mapping produced by the engine and the profiles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryResult {
    entries: Vec<(String, SummaryValue)>,
}

impl SummaryResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value`, replacing an earlier entry with the same label.
    pub fn insert(&mut self, label: impl Into<String>, value: SummaryValue) {
        let label = label.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == label) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((label, value)),
        }
    }

    pub fn extend(&mut self, other: Self) {
        for (label, value) in other.entries {
            self.insert(label, value);
        }
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&SummaryValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(label, _)| label.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SummaryValue)> {
        self.entries.iter().map(|(label, value)| (label.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SummaryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(serializer, &self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::{SummaryResult, SummaryValue};

    #[test]
    fn insert_replaces_existing_label_in_place() {
        let mut result = SummaryResult::new();
        result.insert("a", SummaryValue::Integer(1));
        result.insert("b", SummaryValue::Integer(2));
        result.insert("a", SummaryValue::Integer(3));

        assert_eq!(result.labels(), vec!["a", "b"]);
        assert_eq!(result.get("a").and_then(SummaryValue::as_i64), Some(3));
    }

    #[test]
    fn serializes_as_ordered_json_object() {
        let mut result = SummaryResult::new();
        result.insert(
            "race_count",
            SummaryValue::Counts(vec![("White".to_owned(), 2), ("Black".to_owned(), 1)]),
        );
        result.insert("top_occ_india", SummaryValue::Text("Prof-specialty".to_owned()));

        let json = serde_json::to_string(&result).expect("serialize");
        assert_eq!(
            json,
            r#"{"race_count":{"White":2,"Black":1},"top_occ_india":"Prof-specialty"}"#
        );
    }
}
