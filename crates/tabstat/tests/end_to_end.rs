use serde_json::json;
use tabstat::prelude::*;

const CENSUS: &str = "\
age,workclass,education,marital-status,occupation,race,sex,hours-per-week,native-country,salary
39,State-gov,Bachelors,Never-married,Adm-clerical,White,Male,40,United-States,<=50K
50,Self-emp-not-inc,Bachelors,Married-civ-spouse,Exec-managerial,White,Male,13,United-States,<=50K
38,Private,HS-grad,Divorced,Handlers-cleaners,White,Male,40,United-States,<=50K
53,Private,11th,Married-civ-spouse,Handlers-cleaners,Black,Male,40,United-States,<=50K
28,Private,Bachelors,Married-civ-spouse,Prof-specialty,Black,Female,40,Cuba,<=50K
37,Private,Masters,Married-civ-spouse,Exec-managerial,White,Female,40,United-States,<=50K
49,Private,9th,Married-spouse-absent,Other-service,Black,Female,16,Jamaica,<=50K
52,Self-emp-not-inc,HS-grad,Married-civ-spouse,Exec-managerial,White,Male,45,United-States,>50K
31,Private,Masters,Never-married,Prof-specialty,White,Female,50,United-States,>50K
42,Private,Bachelors,Married-civ-spouse,Exec-managerial,White,Male,40,United-States,>50K
37,Private,Some-college,Married-civ-spouse,Exec-managerial,Black,Male,80,United-States,>50K
30,State-gov,Bachelors,Married-civ-spouse,Prof-specialty,Asian-Pac-Islander,Male,40,India,>50K
";

fn census_summary() -> SummaryResult {
    let frame = read_csv_str(CENSUS).expect("csv");
    let config = DemographicConfig {
        columns: DemographicColumns::hyphenated(),
        ..DemographicConfig::default()
    };
    demographic_summary(&frame, &config).expect("summary")
}

#[test]
fn census_sample_produces_the_full_report() {
    let summary = census_summary();
    let report = serde_json::to_value(&summary).expect("json");

    assert_eq!(
        report,
        json!({
            "race_count": {"White": 7, "Black": 4, "Asian-Pac-Islander": 1},
            "average_age_men": 42.6,
            "percentage_bachelors": 41.7,
            "higher_education_rich": 42.9,
            "lower_education_rich": 40.0,
            "min_work_hours": 13,
            "rich_percentage": 0.0,
            "highest_earning_country": "India",
            "highest_earning_country_percentage": 100.0,
            "top_occ_india": "Prof-specialty",
        })
    );
}

#[test]
fn report_keys_follow_the_fixed_order() {
    let summary = census_summary();
    let report = serde_json::to_string(&summary).expect("json");
    let positions = summary
        .labels()
        .iter()
        .map(|label| report.find(&format!("\"{label}\"")).expect("label"))
        .collect::<Vec<_>>();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(summary.labels().first(), Some(&"race_count"));
    assert_eq!(summary.labels().last(), Some(&"top_occ_india"));
}

#[test]
fn engine_requests_compose_with_the_reader() {
    let frame = read_csv_str(CENSUS).expect("csv");
    let engine = TabularSummaryEngine::new();
    let out = engine
        .run(
            &frame,
            &[
                AggregationRequest::new("mean_hours", Metric::Mean).column("hours-per-week"),
                AggregationRequest::new("hours_by_sex", Metric::Max)
                    .column("hours-per-week")
                    .group_by("sex"),
                AggregationRequest::new("young_rich", Metric::Percentage)
                    .filter(Predicate::compare("age", CompareOp::Lt, 40_i64))
                    .numerator(Predicate::eq("salary", ">50K")),
            ],
        )
        .expect("run");

    assert_eq!(out.get("mean_hours"), Some(&SummaryValue::Float(40.3)));
    assert_eq!(
        out.get("hours_by_sex"),
        Some(&SummaryValue::Breakdown(vec![
            ("Male".to_owned(), 80.0),
            ("Female".to_owned(), 50.0),
        ]))
    );
    assert_eq!(out.get("young_rich"), Some(&SummaryValue::Float(42.9)));
}
