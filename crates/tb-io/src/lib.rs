#![forbid(unsafe_code)]

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tb_columnar::{Column, ColumnError};
use tb_frame::{DataFrame, FrameError};
use tb_types::{NullKind, Scalar, infer_dtype};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("csv input has no headers")]
    MissingHeaders,
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

pub fn read_csv_str(input: &str) -> Result<DataFrame, IoError> {
    read_csv_reader(input.as_bytes())
}

pub fn read_csv_path(path: impl AsRef<Path>) -> Result<DataFrame, IoError> {
    read_csv_reader(File::open(path)?)
}

/// Reads a header row followed by records. Columns keep header order and
/// get a `0..n` index. Each field is parsed as integer, float, bool, then
/// text; empty fields are missing. A column whose fields disagree on a
/// numeric/text type is read entirely as text.
pub fn read_csv_reader<R: Read>(input: R) -> Result<DataFrame, IoError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(input);

    let headers = reader.headers().cloned().map_err(IoError::from)?;
    if headers.is_empty() {
        return Err(IoError::MissingHeaders);
    }

    let mut fields = vec![Vec::<String>::new(); headers.len()];
    for row in reader.records() {
        let record = row?;
        for (idx, values) in fields.iter_mut().enumerate() {
            values.push(record.get(idx).unwrap_or_default().trim().to_owned());
        }
    }

    let columns = headers
        .iter()
        .zip(fields)
        .map(|(name, values)| Ok((name.trim().to_owned(), column_from_fields(values)?)))
        .collect::<Result<Vec<_>, IoError>>()?;

    #[cfg(feature = "tracing")]
    tracing::debug!(columns = columns.len(), "read csv");

    Ok(DataFrame::from_columns(columns)?)
}

fn column_from_fields(fields: Vec<String>) -> Result<Column, ColumnError> {
    let parsed = fields.iter().map(|field| parse_scalar(field)).collect::<Vec<_>>();
    if infer_dtype(&parsed).is_ok() {
        return Column::from_values(parsed);
    }
    let text = fields
        .into_iter()
        .map(|field| {
            if field.is_empty() {
                Scalar::Null(NullKind::Null)
            } else {
                Scalar::Utf8(field)
            }
        })
        .collect();
    Column::from_values(text)
}

pub fn write_csv_string(frame: &DataFrame) -> Result<String, IoError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let headers = frame.column_names();
    writer.write_record(headers)?;

    for row_idx in 0..frame.num_rows() {
        let row = headers
            .iter()
            .map(|name| {
                frame
                    .column(name)
                    .and_then(|column| column.value(row_idx))
                    .map_or_else(String::new, scalar_to_csv)
            })
            .collect::<Vec<_>>();
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn parse_scalar(field: &str) -> Scalar {
    if field.is_empty() {
        return Scalar::Null(NullKind::Null);
    }

    if let Ok(value) = field.parse::<i64>() {
        return Scalar::Int64(value);
    }
    if let Ok(value) = field.parse::<f64>() {
        return Scalar::Float64(value);
    }
    if let Ok(value) = field.parse::<bool>() {
        return Scalar::Bool(value);
    }

    Scalar::Utf8(field.to_owned())
}

fn scalar_to_csv(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null(_) => String::new(),
        Scalar::Float64(v) if v.is_nan() => String::new(),
        other => other.to_string(),
    }
}
