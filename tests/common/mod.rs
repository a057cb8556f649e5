use std::path::Path;

use interlace::{DecodedColumn, Loaded, LoadConfig, LoadOptions, read_csv};
use serde::Serialize;

pub const SURVEY_CSV: &str = "fixtures/survey.csv";
pub const SURVEY_CONFIG: &str = "fixtures/survey.json";

pub fn survey_options() -> LoadOptions {
    LoadConfig::from_path(Path::new(SURVEY_CONFIG))
        .expect("survey config parses")
        .into_options()
        .expect("survey config is valid")
}

pub fn load_survey() -> Loaded {
    read_csv(SURVEY_CSV, &survey_options()).expect("survey fixture loads")
}

#[allow(dead_code)]
#[derive(Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub value_type: String,
    pub reason_type: Option<String>,
    pub present: usize,
    pub absent: usize,
}

#[allow(dead_code)]
pub fn summarize(loaded: &Loaded) -> Vec<ColumnSummary> {
    loaded
        .dataset
        .columns()
        .iter()
        .map(|named| match &named.column {
            DecodedColumn::Channeled(column) => ColumnSummary {
                name: named.name.clone(),
                value_type: column.types().value.to_string(),
                reason_type: Some(column.types().reason.to_string()),
                present: column.data().count_present(),
                absent: column.data().count_absent(),
            },
            DecodedColumn::Plain(column) => {
                let absent = column.values().iter().filter(|v| v.is_none()).count();
                ColumnSummary {
                    name: named.name.clone(),
                    value_type: column.value_type().to_string(),
                    reason_type: None,
                    present: column.len() - absent,
                    absent,
                }
            }
        })
        .collect()
}
