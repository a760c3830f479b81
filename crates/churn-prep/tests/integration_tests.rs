//! Integration tests for the churn data-preparation pipeline.
//!
//! These tests run complete cleaning plans against a small churn CSV fixture.

use churn_prep::{Pipeline, PrepError, StepDescriptor};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde_json::json;
use std::path::PathBuf;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    let path = fixtures_path().join(filename);
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn cleaning_plan() -> Pipeline {
    Pipeline::new(vec![
        StepDescriptor::new("drop_cols").with_kwarg("subset", json!(["Emite boletos.1", "ID"])),
        StepDescriptor::new("rename_cols"),
        StepDescriptor::new("clear_numeric_strings")
            .with_kwarg("subset", json!(["receita_mensal", "receita_total"])),
        StepDescriptor::new("convert_to_numeric")
            .with_kwarg("subset", json!(["receita_mensal", "receita_total"])),
    ])
}

#[test]
fn full_cleaning_plan_on_churn_subset() {
    let raw = load_csv("churn_subset.csv");
    assert_eq!(raw.shape(), (5, 7));

    let cleaned = cleaning_plan().run(raw).expect("pipeline should succeed");

    assert_eq!(
        cleaned.get_column_names_str(),
        vec![
            "customer_name",
            "receita_mensal",
            "receita_total",
            "internet",
            "telefone"
        ]
    );

    let mensal = cleaned.column("receita_mensal").unwrap();
    assert_eq!(mensal.dtype(), &DataType::Float64);
    assert_eq!(mensal.f64().unwrap().get(0), Some(76.86));

    let total = cleaned.column("receita_total").unwrap();
    assert_eq!(total.f64().unwrap().get(2), Some(3450.0));
}

#[test]
fn cleaning_plan_loaded_from_json_document() {
    let plan = r#"[
        { "function": "drop_cols", "kwargs": { "subset": ["Emite boletos.1", "ID"] } },
        { "function": "rename_cols" },
        { "function": "clear_numeric_strings",
          "kwargs": { "subset": ["receita_mensal", "receita_total"] } },
        { "function": "convert_to_numeric",
          "kwargs": { "subset": ["receita_mensal", "receita_total"] } }
    ]"#;

    let pipeline = Pipeline::from_json(plan).expect("plan should parse");
    pipeline.validate().expect("all transforms registered");

    let cleaned = pipeline.run(load_csv("churn_subset.csv")).unwrap();
    assert_eq!(cleaned.width(), 5);
    assert_eq!(
        cleaned.column("receita_mensal").unwrap().dtype(),
        &DataType::Float64
    );
}

#[test]
fn feature_derivation_after_cleaning() {
    let cleaned = cleaning_plan().run(load_csv("churn_subset.csv")).unwrap();

    let features = Pipeline::new(vec![
        StepDescriptor::new("count_class_frequency")
            .with_kwarg("class_to_count", json!("Sim"))
            .with_kwarg("columns", json!(["internet", "telefone"])),
        StepDescriptor::new("create_eq_or_gt_feature")
            .with_kwarg("value", json!(76.86))
            .with_kwarg("columns", json!("receita_mensal"))
            .with_kwarg("feature_name", json!("high_revenue")),
        StepDescriptor::new("classify_col")
            .with_kwarg("col_to_clf", json!("receita_total"))
            .with_kwarg("new_col_name", json!("faixa_receita"))
            .with_kwarg("classes", json!({
                "entre 1000 e 2800": [1000.0, 2800.0],
                "maior que 3000": [3000.0, 4000.0]
            })),
    ]);

    let out = features.run(cleaned).expect("feature plan should succeed");

    let qty = out.column("qty_sim").unwrap();
    assert_eq!(qty.u32().unwrap().get(0), Some(2)); // ana: Sim + Sim
    assert_eq!(qty.u32().unwrap().get(3), Some(0)); // dani: Nao + Nao

    let high = out.column("high_revenue").unwrap();
    assert_eq!(high.i32().unwrap().get(0), Some(1));
    assert_eq!(high.i32().unwrap().get(1), Some(0));

    let faixa = out.column("faixa_receita").unwrap();
    assert_eq!(faixa.str().unwrap().get(0), Some("entre 1000 e 2800"));
    assert_eq!(faixa.str().unwrap().get(2), Some("maior que 3000"));
    assert_eq!(faixa.str().unwrap().get(3), None); // 120.99 falls outside every range
}

#[test]
fn dropping_missing_column_halts_the_run() {
    let pipeline = Pipeline::new(vec![
        StepDescriptor::new("drop_cols").with_kwarg("subset", json!(["nope"])),
        StepDescriptor::new("rename_cols"),
    ]);
    let err = pipeline.run(load_csv("churn_subset.csv")).unwrap_err();
    assert!(err.to_string().contains("nope"));
}

#[test]
fn malformed_plan_is_rejected_before_running() {
    let plan = r#"[ { "args": [1, 2] } ]"#;
    let err = Pipeline::from_json(plan).unwrap_err();
    assert!(matches!(err, PrepError::InvalidPlan(_)));
}

#[test]
fn combined_mismatch_passes_dataset_through() {
    let raw = load_csv("churn_subset.csv");
    let pipeline = Pipeline::new(vec![
        // Both argument groups present and mismatched: step is skipped.
        StepDescriptor::new("create_missing_indicator")
            .with_args(vec![json!("unexpected")])
            .with_kwarg("also", json!("unexpected")),
    ]);
    let out = pipeline.run(raw.clone()).unwrap();
    assert!(out.equals_missing(&raw));
}
