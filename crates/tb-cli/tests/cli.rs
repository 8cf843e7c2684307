use std::fs;
use std::path::Path;

use serde_json::json;
use tb_cli::{CliError, Command, execute, parse_args};

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

fn write(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write csv");
    path.to_string_lossy().into_owned()
}

const CENSUS: &str = "\
age,race,sex,education,salary,hours-per-week,native-country,occupation
39,White,Male,Bachelors,<=50K,40,United-States,Adm-clerical
50,White,Male,Bachelors,>50K,13,India,Prof-specialty
38,Black,Female,HS-grad,<=50K,40,United-States,Handlers-cleaners
31,Asian,Female,Masters,>50K,50,India,Prof-specialty
";

#[test]
fn no_arguments_or_help_flag_show_help() {
    assert_eq!(parse_args(Vec::new()).expect("parse"), Command::Help);
    assert_eq!(parse_args(args(&["medical", "--help"])).expect("parse"), Command::Help);
}

#[test]
fn unknown_command_and_flag_are_usage_errors() {
    assert!(matches!(parse_args(args(&["plot"])), Err(CliError::Usage(_))));
    assert!(matches!(
        parse_args(args(&["medical", "a.csv", "--verbose"])),
        Err(CliError::Usage(_))
    ));
    assert!(matches!(
        parse_args(args(&["sea-level"])),
        Err(CliError::Usage(_))
    ));
}

#[test]
fn matrix_command_reports_every_metric() {
    let command = parse_args(args(&["matrix", "0", "1", "2", "3", "4", "5", "6", "7", "8"]))
        .expect("parse");
    let report = execute(&command).expect("run");
    assert_eq!(report["mean"], json!([[3.0, 4.0, 5.0], [1.0, 4.0, 7.0], 4.0]));
    assert_eq!(report["sum"][2], json!(36));
    assert_eq!(report["max"], json!([[6, 7, 8], [2, 5, 8], 8]));
}

#[test]
fn matrix_command_accepts_negative_floats_and_rejects_bad_sizes() {
    let command = parse_args(args(&[
        "matrix", "-1.5", "0", "1.5", "0", "0", "0", "0", "0", "0",
    ]))
    .expect("parse");
    let report = execute(&command).expect("run");
    assert_eq!(report["sum"][2], json!(0.0));

    let short = parse_args(args(&["matrix", "1", "2"])).expect("parse");
    assert!(matches!(
        execute(&short),
        Err(CliError::Summary(tb_summary::SummaryError::InvalidInputSize {
            expected: 9,
            actual: 2
        }))
    ));
}

#[test]
fn demographic_command_reads_hyphenated_headers() {
    let dir = tempfile::tempdir().expect("dir");
    let csv = write(dir.path(), "adult.csv", CENSUS);

    let command = parse_args(args(&["demographic", &csv, "--hyphenated-headers"])).expect("parse");
    let report = execute(&command).expect("run");
    assert_eq!(report["average_age_men"], json!(44.5));
    assert_eq!(report["percentage_bachelors"], json!(50.0));
    assert_eq!(report["highest_earning_country"], json!("India"));
    assert_eq!(report["top_occ_india"], json!("Prof-specialty"));
    assert_eq!(report["race_count"], json!({"White": 2, "Black": 1, "Asian": 1}));

    let plain = parse_args(args(&["demographic", &csv])).expect("parse");
    assert!(matches!(
        execute(&plain),
        Err(CliError::Summary(tb_summary::SummaryError::MissingColumn { .. }))
    ));
}

#[test]
fn demographic_config_overrides_category_values() {
    let dir = tempfile::tempdir().expect("dir");
    let csv = write(dir.path(), "adult.csv", CENSUS);
    let config = write(
        dir.path(),
        "config.json",
        r#"{"focus_country": "United-States", "rich_salary": "<=50K"}"#,
    );

    let command = parse_args(args(&[
        "demographic",
        &csv,
        "--config",
        &config,
        "--hyphenated-headers",
    ]))
    .expect("parse");
    let report = execute(&command).expect("run");
    assert_eq!(report["top_occ_india"], json!("Adm-clerical"));

    let broken = write(dir.path(), "broken.json", "{");
    let command = parse_args(args(&["demographic", &csv, "--config", &broken])).expect("parse");
    assert!(matches!(execute(&command), Err(CliError::Config { .. })));
}

#[test]
fn sea_level_command_emits_trend_lines() {
    let dir = tempfile::tempdir().expect("dir");
    let mut contents = String::from("Year,CSIRO Adjusted Sea Level\n");
    for year in 1990..=2010 {
        contents.push_str(&format!("{year},{}\n", f64::from(year - 1990) * 0.1));
    }
    let csv = write(dir.path(), "sea.csv", &contents);

    let report = execute(&parse_args(args(&["sea-level", &csv])).expect("parse")).expect("run");
    assert_eq!(report["full"].as_array().map(Vec::len), Some(171));
    assert_eq!(report["recent"][0]["year"], json!(2000));
}
