//! Cleaning transforms for raw churn exports.
//!
//! Every transform consumes the DataFrame by value and returns a new one:
//! - column dropping and name normalization
//! - currency-string cleanup for numeric parsing
//! - strict type conversion to float / categorical

use crate::error::{PrepError, Result};
use crate::pipeline::Registry;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::debug;

/// Currency markers and thousands separators stripped before numeric parsing.
static CURRENCY_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[R$.]").unwrap());

/// Punctuation removed from column names.
static NAME_PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[:.,]").unwrap());

/// Check if a DataType is numeric (integer or float).
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

pub(crate) fn register(registry: &mut Registry) {
    registry.register("drop_cols", |df, args| {
        args.reject_unknown(&["subset"], 1)?;
        drop_cols(df, &args.columns(0, "subset")?)
    });
    registry.register("rename_cols", |df, args| {
        args.reject_unknown(&[], 0)?;
        rename_cols(df)
    });
    registry.register("clear_numeric_strings", |df, args| {
        args.reject_unknown(&["subset"], 1)?;
        clear_numeric_strings(df, &args.columns(0, "subset")?)
    });
    registry.register("convert_to_numeric", |df, args| {
        args.reject_unknown(&["subset"], 1)?;
        convert_to_numeric(df, &args.columns(0, "subset")?)
    });
    registry.register("convert_to_categoric", |df, args| {
        args.reject_unknown(&["subset"], 1)?;
        convert_to_categoric(df, &args.columns(0, "subset")?)
    });
}

/// Remove the named columns. Fails with [`PrepError::ColumnNotFound`] if any
/// name is absent.
pub fn drop_cols(df: DataFrame, subset: &[String]) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    for col in subset {
        if !names.contains(col) {
            return Err(PrepError::ColumnNotFound(col.clone()));
        }
    }

    let to_drop: Vec<PlSmallStr> = subset.iter().map(|s| s.as_str().into()).collect();
    debug!("Dropping {} column(s): {:?}", subset.len(), subset);
    Ok(df.drop_many(to_drop))
}

/// Normalize every column name: trim, lowercase, spaces to underscores,
/// strip `:`, `.` and `,`. `"Customer: Name "` becomes `customer_name`.
pub fn rename_cols(mut df: DataFrame) -> Result<DataFrame> {
    let new_names: Vec<PlSmallStr> = df
        .get_column_names()
        .into_iter()
        .map(|name| normalize_col_name(name).into())
        .collect();
    df.set_column_names(new_names)?;
    Ok(df)
}

/// Name normalization applied by [`rename_cols`].
pub fn normalize_col_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace(' ', "_");
    NAME_PUNCTUATION.replace_all(&lowered, "").into_owned()
}

/// Strip currency markers and thousands separators from the named
/// string-typed columns and normalize the decimal separator, so the values
/// are ready for numeric parsing. `"R$ 76,86 "` becomes `"76.86"`.
pub fn clear_numeric_strings(mut df: DataFrame, subset: &[String]) -> Result<DataFrame> {
    for col_name in subset {
        let series = df
            .column(col_name)
            .map_err(|_| PrepError::ColumnNotFound(col_name.clone()))?
            .as_materialized_series()
            .clone();
        let str_series = series.str()?;

        let cleaned: Vec<Option<String>> = str_series
            .into_iter()
            .map(|opt| opt.map(clean_currency_string))
            .collect();

        df.replace(col_name, Series::new(col_name.as_str().into(), cleaned))?;
    }
    Ok(df)
}

/// Cleanup applied per value by [`clear_numeric_strings`].
pub fn clean_currency_string(raw: &str) -> String {
    CURRENCY_CHARS
        .replace_all(raw, "")
        .trim()
        .replace(',', ".")
}

/// Cast the named columns to `Float64`. Unlike a plain polars cast this is
/// strict: any non-null value that does not parse fails the transform.
pub fn convert_to_numeric(mut df: DataFrame, subset: &[String]) -> Result<DataFrame> {
    for col_name in subset {
        let series = df
            .column(col_name)
            .map_err(|_| PrepError::ColumnNotFound(col_name.clone()))?
            .as_materialized_series()
            .clone();

        let converted = match series.dtype() {
            dtype if is_numeric_dtype(dtype) => series.cast(&DataType::Float64)?,
            DataType::String => {
                let str_series = series.str()?;
                let mut values: Vec<Option<f64>> = Vec::with_capacity(str_series.len());
                for opt_val in str_series.into_iter() {
                    match opt_val {
                        Some(val) => {
                            let parsed = val.trim().parse::<f64>().map_err(|_| {
                                PrepError::TypeConversionFailed {
                                    column: col_name.clone(),
                                    target_type: "Float64".to_string(),
                                    reason: format!("value '{val}' is not numeric"),
                                }
                            })?;
                            values.push(Some(parsed));
                        }
                        None => values.push(None),
                    }
                }
                Series::new(col_name.as_str().into(), values)
            }
            other => {
                return Err(PrepError::TypeConversionFailed {
                    column: col_name.clone(),
                    target_type: "Float64".to_string(),
                    reason: format!("unsupported source dtype {other}"),
                });
            }
        };

        df.replace(col_name, converted)?;
    }
    Ok(df)
}

/// Cast the named columns to the categorical dtype.
pub fn convert_to_categoric(mut df: DataFrame, subset: &[String]) -> Result<DataFrame> {
    for col_name in subset {
        let series = df
            .column(col_name)
            .map_err(|_| PrepError::ColumnNotFound(col_name.clone()))?
            .as_materialized_series()
            .clone();

        let converted = series
            .cast(&DataType::from_categories(Categories::global()))
            .map_err(|e| PrepError::TypeConversionFailed {
                column: col_name.clone(),
                target_type: "Categorical".to_string(),
                reason: e.to_string(),
            })?;

        df.replace(col_name, converted)?;
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn churn_df() -> DataFrame {
        df!(
            "ID" => [1i64, 2, 3],
            "Customer: Name " => ["ana", "bia", "caio"],
            "Receita Mensal" => ["R$ 76,86 ", "R$ 1.234,50", "10,00"],
        )
        .unwrap()
    }

    #[test]
    fn test_drop_cols() {
        let out = drop_cols(churn_df(), &["ID".to_string()]).unwrap();
        assert_eq!(out.width(), 2);
        assert!(out.column("ID").is_err());
    }

    #[test]
    fn test_drop_cols_missing_column() {
        let err = drop_cols(churn_df(), &["missing".to_string()]).unwrap_err();
        assert!(matches!(err, PrepError::ColumnNotFound(name) if name == "missing"));
    }

    #[test]
    fn test_normalize_col_name() {
        assert_eq!(normalize_col_name("Customer: Name "), "customer_name");
        assert_eq!(normalize_col_name("Receita Mensal"), "receita_mensal");
        assert_eq!(normalize_col_name("Emite boletos.1"), "emite_boletos1");
    }

    #[test]
    fn test_rename_cols() {
        let out = rename_cols(churn_df()).unwrap();
        assert_eq!(
            out.get_column_names_str(),
            vec!["id", "customer_name", "receita_mensal"]
        );
    }

    #[test]
    fn test_clean_currency_string() {
        assert_eq!(clean_currency_string("R$ 76,86 "), "76.86");
        assert_eq!(clean_currency_string("R$ 1.234,50"), "1234.50");
        assert_eq!(clean_currency_string("10,00"), "10.00");
    }

    #[test]
    fn test_clear_numeric_strings() {
        let out =
            clear_numeric_strings(churn_df(), &["Receita Mensal".to_string()]).unwrap();
        let col = out.column("Receita Mensal").unwrap();
        let values = col.str().unwrap();
        assert_eq!(values.get(0), Some("76.86"));
        assert_eq!(values.get(1), Some("1234.50"));
    }

    #[test]
    fn test_convert_to_numeric() {
        let df = clear_numeric_strings(churn_df(), &["Receita Mensal".to_string()]).unwrap();
        let out = convert_to_numeric(df, &["Receita Mensal".to_string()]).unwrap();
        let col = out.column("Receita Mensal").unwrap();
        assert_eq!(col.dtype(), &DataType::Float64);
        assert_eq!(col.f64().unwrap().get(0), Some(76.86));
    }

    #[test]
    fn test_convert_to_numeric_rejects_garbage() {
        let df = df!("x" => ["1.0", "abc"]).unwrap();
        let err = convert_to_numeric(df, &["x".to_string()]).unwrap_err();
        assert!(matches!(err, PrepError::TypeConversionFailed { .. }));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_convert_to_numeric_keeps_nulls() {
        let df = df!("x" => [Some("1.5"), None, Some("2.5")]).unwrap();
        let out = convert_to_numeric(df, &["x".to_string()]).unwrap();
        let col = out.column("x").unwrap();
        assert_eq!(col.null_count(), 1);
        assert_eq!(col.f64().unwrap().get(2), Some(2.5));
    }

    #[test]
    fn test_convert_to_categoric() {
        let df = df!("plan" => ["basic", "pro", "basic"]).unwrap();
        let out = convert_to_categoric(df, &["plan".to_string()]).unwrap();
        assert!(matches!(
            out.column("plan").unwrap().dtype(),
            DataType::Categorical(_, _)
        ));
    }
}
