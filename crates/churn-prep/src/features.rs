//! Feature-derivation transforms.
//!
//! Derived columns for the churn model: range bucketing, missing-value
//! indicators, per-row class counts, and threshold flags.

use crate::cleaner::is_numeric_dtype;
use crate::error::{PrepError, Result};
use crate::pipeline::{Registry, StepArgs};
use polars::prelude::*;
use serde_json::Value;
use tracing::debug;

/// A named inclusive value range used by [`classify_col`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRange {
    pub label: String,
    pub min: f64,
    pub max: f64,
}

pub(crate) fn register(registry: &mut Registry) {
    registry.register("classify_col", |df, args| {
        args.reject_unknown(&["col_to_clf", "new_col_name", "classes"], 3)?;
        let col = args.string(0, "col_to_clf")?;
        let new_col = args.string(1, "new_col_name")?;
        let classes = parse_classes(args)?;
        classify_col(df, &col, &new_col, &classes)
    });
    registry.register("create_missing_indicator", |df, args| {
        args.reject_unknown(&[], 0)?;
        create_missing_indicator(df)
    });
    registry.register("count_class_frequency", |df, args| {
        args.reject_unknown(&["class_to_count", "columns"], 2)?;
        let class = args.string(0, "class_to_count")?;
        let columns = args.columns(1, "columns")?;
        count_class_frequency(df, &class, &columns)
    });
    registry.register("create_eq_or_gt_feature", |df, args| {
        args.reject_unknown(&["value", "columns", "feature_name"], 3)?;
        let value = args.number(0, "value")?;
        let columns = args.columns(1, "columns")?;
        let name = args.string(2, "feature_name")?;
        create_eq_or_gt_feature(df, value, &columns, &name)
    });
}

/// Parse the `classes` argument: a JSON object mapping labels to
/// `[min, max]` pairs.
fn parse_classes(args: &StepArgs) -> Result<Vec<ClassRange>> {
    let value = args.require(2, "classes")?;
    let Value::Object(entries) = value else {
        return Err(PrepError::mismatch(
            args.transform(),
            "argument 'classes' must be a mapping of label to [min, max]",
        ));
    };

    let mut classes = Vec::with_capacity(entries.len());
    for (label, bounds) in entries {
        let pair = bounds
            .as_array()
            .filter(|items| items.len() == 2)
            .and_then(|items| Some((items[0].as_f64()?, items[1].as_f64()?)));
        let Some((min, max)) = pair else {
            return Err(PrepError::mismatch(
                args.transform(),
                format!("class '{label}' must map to a [min, max] number pair"),
            ));
        };
        classes.push(ClassRange {
            label: label.clone(),
            min,
            max,
        });
    }
    Ok(classes)
}

/// Bucket a numeric column into named ranges, writing the labels to
/// `new_col_name`. Values outside every range become null. The first
/// matching range wins.
pub fn classify_col(
    mut df: DataFrame,
    col_to_clf: &str,
    new_col_name: &str,
    classes: &[ClassRange],
) -> Result<DataFrame> {
    let series = df
        .column(col_to_clf)
        .map_err(|_| PrepError::ColumnNotFound(col_to_clf.to_string()))?
        .as_materialized_series()
        .clone()
        .cast(&DataType::Float64)?;
    let values = series.f64()?;

    let labels: Vec<Option<String>> = values
        .into_iter()
        .map(|opt| {
            opt.and_then(|v| {
                classes
                    .iter()
                    .find(|class| v >= class.min && v <= class.max)
                    .map(|class| class.label.clone())
            })
        })
        .collect();

    debug!(
        "Classified '{}' into {} ranges as '{}'",
        col_to_clf,
        classes.len(),
        new_col_name
    );
    df.with_column(Series::new(new_col_name.into(), labels))?;
    Ok(df)
}

/// Add an `is_<column>_null` 0/1 indicator for every column that contains
/// nulls. Columns without nulls get no indicator.
pub fn create_missing_indicator(mut df: DataFrame) -> Result<DataFrame> {
    let cols_with_nulls: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|col| col.null_count() > 0)
        .map(|col| col.name().to_string())
        .collect();

    for col_name in cols_with_nulls {
        let series = df
            .column(&col_name)?
            .as_materialized_series()
            .clone();
        let mut indicator = series.is_null().into_series().cast(&DataType::Int32)?;
        indicator.rename(format!("is_{col_name}_null").into());
        df.with_column(indicator)?;
    }
    Ok(df)
}

/// Count occurrences of `class_to_count` across the listed columns, per row,
/// into a new `qty_<normalized-class>` column.
pub fn count_class_frequency(
    mut df: DataFrame,
    class_to_count: &str,
    columns: &[String],
) -> Result<DataFrame> {
    let mut counts = vec![0u32; df.height()];

    for col_name in columns {
        let series = df
            .column(col_name)
            .map_err(|_| PrepError::ColumnNotFound(col_name.clone()))?
            .as_materialized_series()
            .clone();
        let str_series = series.cast(&DataType::String)?;
        for (row, opt_val) in str_series.str()?.into_iter().enumerate() {
            if opt_val == Some(class_to_count) {
                counts[row] += 1;
            }
        }
    }

    let normalized = class_to_count.trim().to_lowercase().replace(' ', "");
    df.with_column(Series::new(format!("qty_{normalized}").into(), counts))?;
    Ok(df)
}

/// Add a 0/1 feature flagging rows where any of the listed numeric columns
/// meets or exceeds `value`.
pub fn create_eq_or_gt_feature(
    mut df: DataFrame,
    value: f64,
    columns: &[String],
    feature_name: &str,
) -> Result<DataFrame> {
    let mut flags = vec![0i32; df.height()];

    for col_name in columns {
        let series = df
            .column(col_name)
            .map_err(|_| PrepError::ColumnNotFound(col_name.clone()))?
            .as_materialized_series()
            .clone();
        if !is_numeric_dtype(series.dtype()) {
            return Err(PrepError::TypeConversionFailed {
                column: col_name.clone(),
                target_type: "Float64".to_string(),
                reason: format!("threshold feature requires a numeric column, got {}", series.dtype()),
            });
        }
        let values = series.cast(&DataType::Float64)?;
        for (row, opt_val) in values.f64()?.into_iter().enumerate() {
            if let Some(v) = opt_val
                && v >= value
            {
                flags[row] = 1;
            }
        }
    }

    df.with_column(Series::new(feature_name.into(), flags))?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_col() {
        let df = df!("receita_total" => [500.0f64, 1500.0, 3500.0]).unwrap();
        let classes = vec![
            ClassRange {
                label: "entre 1000 e 2800".to_string(),
                min: 1000.0,
                max: 2800.0,
            },
            ClassRange {
                label: "maior que 3000".to_string(),
                min: 3000.0,
                max: 4000.0,
            },
        ];
        let out = classify_col(df, "receita_total", "clf_receita", &classes).unwrap();
        let col = out.column("clf_receita").unwrap();
        let labels = col.str().unwrap();
        assert_eq!(labels.get(0), None);
        assert_eq!(labels.get(1), Some("entre 1000 e 2800"));
        assert_eq!(labels.get(2), Some("maior que 3000"));
    }

    #[test]
    fn test_create_missing_indicator() {
        let df = df!(
            "a" => [Some(1.0f64), None, Some(3.0)],
            "b" => ["x", "y", "z"],
        )
        .unwrap();
        let out = create_missing_indicator(df).unwrap();
        assert!(out.column("is_a_null").is_ok());
        assert!(out.column("is_b_null").is_err());
        let indicator = out.column("is_a_null").unwrap();
        assert_eq!(indicator.i32().unwrap().get(1), Some(1));
        assert_eq!(indicator.i32().unwrap().get(0), Some(0));
    }

    #[test]
    fn test_count_class_frequency() {
        let df = df!(
            "svc_a" => ["Sim", "Nao", "Sim"],
            "svc_b" => ["Sim", "Sim", "Nao"],
        )
        .unwrap();
        let out = count_class_frequency(
            df,
            "Sim",
            &["svc_a".to_string(), "svc_b".to_string()],
        )
        .unwrap();
        let counts = out.column("qty_sim").unwrap();
        assert_eq!(counts.u32().unwrap().get(0), Some(2));
        assert_eq!(counts.u32().unwrap().get(1), Some(1));
        assert_eq!(counts.u32().unwrap().get(2), Some(1));
    }

    #[test]
    fn test_create_eq_or_gt_feature() {
        let df = df!("receita_mensal" => [50.0f64, 76.86, 100.0]).unwrap();
        let out = create_eq_or_gt_feature(
            df,
            76.86,
            &["receita_mensal".to_string()],
            "high_revenue",
        )
        .unwrap();
        let flags = out.column("high_revenue").unwrap();
        assert_eq!(flags.i32().unwrap().get(0), Some(0));
        assert_eq!(flags.i32().unwrap().get(1), Some(1));
        assert_eq!(flags.i32().unwrap().get(2), Some(1));
    }

    #[test]
    fn test_eq_or_gt_rejects_string_column() {
        let df = df!("name" => ["a", "b"]).unwrap();
        let err = create_eq_or_gt_feature(df, 1.0, &["name".to_string()], "flag").unwrap_err();
        assert!(matches!(err, PrepError::TypeConversionFailed { .. }));
    }
}
