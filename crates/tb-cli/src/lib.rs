#![forbid(unsafe_code)]

//! Argument parsing and command execution behind the `tabstat` binary.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tb_frame::DataFrame;
use tb_io::{IoError, read_csv_path};
use tb_pipelines::{MedicalPipeline, PageViewPipeline, PipelineError, SeaLevelPipeline};
use tb_summary::{
    DemographicColumns, DemographicConfig, SummaryError, demographic_summary, matrix_statistics,
    matrix_statistics_i64,
};
use tb_types::Scalar;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("cannot read config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Demographic {
        csv: PathBuf,
        hyphenated_headers: bool,
        config: Option<PathBuf>,
    },
    Matrix(Vec<String>),
    Medical(PathBuf),
    PageViews(PathBuf),
    SeaLevel(PathBuf),
    Help,
}

fn usage(message: impl Into<String>) -> CliError {
    CliError::Usage(message.into())
}

pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(subcommand) = args.next() else {
        return Ok(Command::Help);
    };

    let mut positional = Vec::new();
    let mut hyphenated_headers = false;
    let mut config = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--hyphenated-headers" if subcommand == "demographic" => hyphenated_headers = true,
            "--config" if subcommand == "demographic" => {
                let value = args
                    .next()
                    .ok_or_else(|| usage("--config requires a path to a JSON file"))?;
                config = Some(PathBuf::from(value));
            }
            // Single-dash arguments stay positional so negative matrix values parse.
            other if other.starts_with("--") => {
                return Err(usage(format!("unknown argument: {other}")));
            }
            _ => positional.push(arg),
        }
    }

    let single_csv = |positional: Vec<String>| -> Result<PathBuf, CliError> {
        match <[String; 1]>::try_from(positional) {
            Ok([path]) => Ok(PathBuf::from(path)),
            Err(rest) => Err(usage(format!(
                "{subcommand} expects exactly one CSV path, got {}",
                rest.len()
            ))),
        }
    };

    match subcommand.as_str() {
        "--help" | "-h" | "help" => Ok(Command::Help),
        "demographic" => Ok(Command::Demographic {
            csv: single_csv(positional)?,
            hyphenated_headers,
            config,
        }),
        "matrix" => Ok(Command::Matrix(positional)),
        "medical" => Ok(Command::Medical(single_csv(positional)?)),
        "page-views" => Ok(Command::PageViews(single_csv(positional)?)),
        "sea-level" => Ok(Command::SeaLevel(single_csv(positional)?)),
        other => Err(usage(format!("unknown command: {other}"))),
    }
}

/// Runs `command` and returns its JSON report. `Command::Help` yields
/// `Value::Null`.
pub fn execute(command: &Command) -> Result<Value, CliError> {
    match command {
        Command::Help => Ok(Value::Null),
        Command::Demographic {
            csv,
            hyphenated_headers,
            config,
        } => {
            let mut settings = match config {
                Some(path) => load_config(path)?,
                None => DemographicConfig::default(),
            };
            if *hyphenated_headers {
                settings.columns = DemographicColumns::hyphenated();
            }
            let frame = read_csv_path(csv)?;
            Ok(serde_json::to_value(demographic_summary(&frame, &settings)?)?)
        }
        Command::Matrix(values) => {
            let stats = match values.iter().map(|v| v.parse::<i64>()).collect::<Result<Vec<_>, _>>() {
                Ok(ints) => matrix_statistics_i64(&ints)?,
                Err(_) => {
                    let floats = values
                        .iter()
                        .map(|v| {
                            v.parse::<f64>()
                                .map_err(|_| usage(format!("matrix value {v:?} is not a number")))
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    matrix_statistics(&floats)?
                }
            };
            Ok(serde_json::to_value(stats.to_summary())?)
        }
        Command::Medical(csv) => {
            let pipeline = MedicalPipeline::prepare(&read_csv_path(csv)?)?;
            let correlation = pipeline.correlation_matrix()?;
            Ok(json!({
                "categorical_counts": frame_records(&pipeline.categorical_counts()?),
                "upper_triangle_mask": correlation.upper_triangle_mask(),
                "correlation": correlation,
            }))
        }
        Command::PageViews(csv) => {
            let pipeline = PageViewPipeline::prepare(&read_csv_path(csv)?)?;
            Ok(json!({
                "daily_series": pipeline.daily_series(),
                "monthly_means": pipeline.monthly_means()?,
                "box_summaries": pipeline.box_summaries()?,
            }))
        }
        Command::SeaLevel(csv) => {
            let pipeline = SeaLevelPipeline::new(&read_csv_path(csv)?)?;
            Ok(serde_json::to_value(pipeline.trend_lines()?)?)
        }
    }
}

fn load_config(path: &Path) -> Result<DemographicConfig, CliError> {
    let read = || -> Result<DemographicConfig, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    };
    read().map_err(|source| CliError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// One JSON object per row, keyed by column name in frame order.
fn frame_records(frame: &DataFrame) -> Vec<Map<String, Value>> {
    (0..frame.num_rows())
        .filter_map(|idx| frame.row(idx))
        .map(|row| {
            frame
                .column_names()
                .iter()
                .zip(row)
                .map(|(name, cell)| (name.clone(), scalar_json(cell)))
                .collect()
        })
        .collect()
}

fn scalar_json(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Null(_) => Value::Null,
        Scalar::Bool(v) => Value::Bool(*v),
        Scalar::Int64(v) => Value::from(*v),
        Scalar::Float64(v) => Value::from(*v),
        Scalar::Utf8(v) => Value::String(v.clone()),
    }
}

pub fn help_text() -> &'static str {
    "tabstat\n\
     Usage:\n\
     \ttabstat demographic <csv> [--hyphenated-headers] [--config <json>]\n\
     \ttabstat matrix <v1> ... <v9>\n\
     \ttabstat medical <csv>\n\
     \ttabstat page-views <csv>\n\
     \ttabstat sea-level <csv>\n\
     Options:\n\
     \t--hyphenated-headers  Read hours-per-week / native-country column names\n\
     \t--config <json>       Demographic column names and category values\n\
     \t-h, --help            Show this help"
}
