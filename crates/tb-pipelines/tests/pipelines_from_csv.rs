use proptest::prelude::*;
use tb_io::read_csv_str;
use tb_pipelines::{
    CATEGORICAL_VARIABLES, MedicalPipeline, PageViewPipeline, PipelineError, SeaLevelPipeline,
};

fn medical_csv(rows: usize) -> String {
    let mut out = String::from(
        "id,age,gender,height,weight,ap_hi,ap_lo,cholesterol,gluc,smoke,alco,active,cardio\n",
    );
    for i in 0..rows {
        let height = 150 + (i * 7) % 40;
        let weight = 50.0 + ((i * 13) % 50) as f64;
        let (ap_hi, ap_lo) = if i % 9 == 0 { (70, 110) } else { (120, 80) };
        out.push_str(&format!(
            "{i},{},{},{height},{weight},{ap_hi},{ap_lo},{},{},{},{},{},{}\n",
            18_000 + i * 17,
            1 + i % 2,
            1 + i % 3,
            1 + (i / 2) % 3,
            i % 4 / 3,
            i % 5 / 4,
            usize::from(i % 3 != 0),
            i % 2,
        ));
    }
    out
}

#[test]
fn medical_pipeline_end_to_end() {
    let frame = read_csv_str(&medical_csv(60)).expect("csv");
    let pipeline = MedicalPipeline::prepare(&frame).expect("prepare");

    let counts = pipeline.categorical_counts().expect("counts");
    let total = counts.numeric("total").expect("total").iter().sum::<f64>();
    assert_eq!(total, (60 * CATEGORICAL_VARIABLES.len()) as f64);

    let clean = pipeline.cleaned().expect("clean");
    assert!(clean.num_rows() < frame.num_rows());
    let lo = clean.numeric("ap_lo").expect("ap_lo");
    let hi = clean.numeric("ap_hi").expect("ap_hi");
    assert!(lo.iter().zip(&hi).all(|(lo, hi)| lo <= hi));

    let corr = pipeline.correlation_matrix().expect("corr");
    assert_eq!(corr.columns.first().map(String::as_str), Some("id"));
    assert!(corr.columns.iter().any(|name| name == "overweight"));
    for (i, row) in corr.values.iter().enumerate() {
        assert_eq!(row.len(), corr.columns.len());
        if !row[i].is_nan() {
            assert!((row[i] - 1.0).abs() < 1e-9);
        }
        for (j, value) in row.iter().enumerate() {
            let mirrored = corr.values[j][i];
            assert!(value.is_nan() && mirrored.is_nan() || (value - mirrored).abs() < 1e-12);
        }
    }
}

#[test]
fn page_views_reject_bad_dates_before_trimming() {
    let frame = read_csv_str("date,value\n2016-05-09,1201\n2016-13-01,2000\n").expect("csv");
    assert!(matches!(
        PageViewPipeline::prepare(&frame),
        Err(PipelineError::InvalidDate { row: 1, .. })
    ));
}

#[test]
fn page_views_monthly_pivot_spans_every_year() {
    let mut csv = String::from("date,value\n");
    for (year, month) in [(2016, 5), (2016, 6), (2017, 1), (2017, 12), (2018, 7)] {
        for day in 1..=20 {
            csv.push_str(&format!("{year}-{month:02}-{day:02},{}\n", 100 * month + day));
        }
    }
    let frame = read_csv_str(&csv).expect("csv");
    let pipeline = PageViewPipeline::prepare(&frame).expect("prepare");
    let means = pipeline.monthly_means().expect("means");

    let years = means.years.iter().map(|row| row.year).collect::<Vec<_>>();
    assert_eq!(years, vec![2016, 2017, 2018]);
    assert!(means.get(2016, 1).is_none());
    assert!(means.get(2017, 12).is_some());
    assert!(means.get(2018, 7).is_some());

    let boxes = pipeline.box_summaries().expect("boxes");
    let months = boxes
        .by_month
        .iter()
        .map(|b| b.label.as_str())
        .collect::<Vec<_>>();
    assert_eq!(months, vec!["Jan", "May", "Jun", "Jul", "Dec"]);
}

proptest! {
    #[test]
    fn sea_level_fit_recovers_a_straight_line(
        slope in -0.5_f64..0.5,
        intercept in -100.0_f64..100.0,
        start in 1880_i64..1990,
    ) {
        let mut csv = String::from("Year,CSIRO Adjusted Sea Level\n");
        for year in start..=2013 {
            csv.push_str(&format!("{year},{}\n", intercept + slope * (year - 1880) as f64));
        }
        let frame = read_csv_str(&csv).expect("csv");
        let pipeline = SeaLevelPipeline::new(&frame).expect("pipeline");
        let fit = pipeline.fit_all().expect("fit");

        prop_assert!((fit.slope - slope).abs() < 1e-6);
        prop_assert!((fit.predict(1880.0) - intercept).abs() < 1e-3);
        let lines = pipeline.trend_lines().expect("lines");
        prop_assert_eq!(lines.recent.len(), 51);
    }
}
