#![allow(clippy::pedantic)]
mod common;

use insta::assert_json_snapshot;
use interlace::decode::{ColumnPlan, ColumnType, StandardGuesser};
use interlace::dispatch::{self, CompareOp, format_dataset};
use interlace::{Channeled, MissingTokens, Reason, Scalar, ScalarType, probe};

use common::{load_survey, summarize};

#[test]
fn survey_splits_values_and_reasons() {
    let loaded = load_survey();
    let age = loaded.dataset.channeled("age").expect("age is channeled");
    assert_eq!(
        age.data().as_slice(),
        &[
            Channeled::Present(Scalar::Int(20)),
            Channeled::Absent(Reason::from("REFUSED")),
            Channeled::Absent(Reason::ParseFailure),
            Channeled::Present(Scalar::Int(21)),
        ]
    );

    let income = loaded.dataset.channeled("income").expect("income is channeled");
    assert_eq!(income.types().value, ScalarType::Float);
    assert_eq!(
        income.matches_probe(&probe(Reason::from("don't know"))),
        vec![false, false, false, true]
    );

    let id = loaded.dataset.column("id").expect("id exists");
    assert!(id.as_plain().is_some(), "id opted out of channels");
}

#[test]
fn survey_report_lists_unparsable_cells() {
    let loaded = load_survey();
    assert_json_snapshot!(loaded.report, @r#"
    [
      {
        "row": 2,
        "column": "age",
        "raw": "twenty"
      }
    ]
    "#);
}

#[test]
fn survey_channel_summary() {
    let loaded = load_survey();
    assert_json_snapshot!(summarize(&loaded), @r#"
    [
      {
        "name": "id",
        "value_type": "int",
        "reason_type": null,
        "present": 4,
        "absent": 0
      },
      {
        "name": "age",
        "value_type": "int",
        "reason_type": "text",
        "present": 2,
        "absent": 2
      },
      {
        "name": "income",
        "value_type": "float",
        "reason_type": "text",
        "present": 2,
        "absent": 2
      },
      {
        "name": "smoker",
        "value_type": "bool",
        "reason_type": "text",
        "present": 3,
        "absent": 1
      },
      {
        "name": "visit",
        "value_type": "date",
        "reason_type": "text",
        "present": 3,
        "absent": 1
      }
    ]
    "#);
}

#[test]
fn survey_table_marks_absent_reasons() {
    let loaded = load_survey();
    let expected = "\
id              age        income  smoker  visit
 1               20       52000.5    true  2024-01-05
 2        <REFUSED>     <refused>   false  2024-02-11
 3  <parse failure>         48000    <NA>  <>
 4               21  <don't know>    true  2024-03-30
";
    assert_eq!(format_dataset(&loaded.dataset, None), expected);

    let truncated = format_dataset(&loaded.dataset, Some(1));
    assert!(truncated.ends_with("... 3 more rows\n"), "{truncated}");
}

#[test]
fn refused_age_scenario() {
    let tokens = MissingTokens::from_texts(["REFUSED"]);
    let plan = ColumnPlan {
        name: "age",
        tokens: Some(&tokens),
        column_type: &ColumnType::Infer,
        guesser: &StandardGuesser,
        chunk_rows: None,
    };
    let output = plan.decode(&["20", "REFUSED", "21"]).expect("decode succeeds");
    let column = output.column.as_channeled().expect("channeled column");

    assert_eq!(
        column.data().as_slice(),
        &[
            Channeled::Present(Scalar::Int(20)),
            Channeled::Absent(Reason::from("REFUSED")),
            Channeled::Present(Scalar::Int(21)),
        ]
    );
    assert_eq!(dispatch::mean(column).expect("numeric"), Some(20.5));
    assert_eq!(dispatch::count_absent(column), 1);
    assert_eq!(
        column.matches_probe(&probe(Reason::from("REFUSED"))),
        vec![false, true, false]
    );
    assert_eq!(
        dispatch::eq_value(column, &Scalar::Int(21)),
        vec![false, false, true]
    );

    let older = dispatch::compare_value(column, CompareOp::Ge, &Scalar::Int(21))
        .expect("ints compare");
    assert_eq!(older.to_mask(), vec![false, false, true]);
    assert!(older.at(1).expect("in range").is_absent());
}

#[test]
fn unparsable_cell_scenario() {
    let tokens = MissingTokens::from_texts(["REFUSED"]);
    let plan = ColumnPlan {
        name: "age",
        tokens: Some(&tokens),
        column_type: &ColumnType::Int,
        guesser: &StandardGuesser,
        chunk_rows: None,
    };
    let output = plan.decode(&["20", "twenty"]).expect("decode succeeds");
    let column = output.column.as_channeled().expect("channeled column");
    assert_eq!(
        column.at(1).expect("in range"),
        &Channeled::Absent(Reason::ParseFailure)
    );
    assert_eq!(output.report.len(), 1);
    assert_eq!(output.report.problems()[0].raw, "twenty");
}
