use polars::prelude::*;
use serde_json::{Map, Number, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::DataRowDto;
use crate::features::files::validators::file_not_found_message;
use crate::modules::storage::LocalStorage;
use crate::shared::constants::INVALID_JSON_FORMAT_MESSAGE;

/// Column name -> value every returned row must equal
pub type Filters = Map<String, Value>;

/// Loads uploaded CSV files and answers row queries against them
pub struct CsvQueryService {
    storage: Arc<LocalStorage>,
}

impl CsvQueryService {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self { storage }
    }

    /// Read `filename` from the upload directory, keep rows matching every
    /// filter, and sort ascending by `sort_by`
    ///
    /// Filters and sort columns are checked against the file's header before
    /// any matching; an unknown column is a bad request. The sort is stable, so
    /// rows with equal keys keep their order from the file.
    pub async fn filter_and_sort_csv(
        &self,
        filename: &str,
        filters: Option<Filters>,
        sort_by: Option<String>,
    ) -> Result<Vec<DataRowDto>> {
        if !self.storage.exists(filename).await? {
            return Err(AppError::NotFound(file_not_found_message(filename)));
        }

        // a blank `sort_by=` means no sorting, like a blank `filters=`
        let sort_by = sort_by.filter(|s| !s.trim().is_empty());

        let path = self.storage.path_for(filename);
        debug!(path = %path.display(), ?filters, ?sort_by, "Querying CSV file");

        tokio::task::spawn_blocking(move || {
            query_csv(&path, filters.as_ref(), sort_by.as_deref())
        })
        .await
        .map_err(|e| AppError::Internal(format!("CSV query task failed: {}", e)))?
    }
}

/// Parse the raw `filters` query parameter
///
/// Anything other than a JSON object is rejected.
pub fn parse_filters(raw: Option<&str>) -> Result<Option<Filters>> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(None);
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        _ => Err(AppError::BadRequest(INVALID_JSON_FORMAT_MESSAGE.to_string())),
    }
}

fn query_csv(
    path: &Path,
    filters: Option<&Filters>,
    sort_by: Option<&str>,
) -> Result<Vec<DataRowDto>> {
    let df = load_csv(path)?;
    let columns: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    if let Some(filters) = filters {
        validate_filters(&columns, filters)?;
    }
    let sort_columns = sort_by
        .map(|sort_by| resolve_sort_columns(&columns, sort_by))
        .transpose()?;

    let mut df = match filters {
        Some(filters) => apply_filters(df, filters)?,
        None => df,
    };

    if let Some(sort_columns) = sort_columns {
        df = df.sort(
            sort_columns.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
            SortMultipleOptions::default()
                .with_maintain_order(true)
                .with_nulls_last(true),
        )?;
    }

    to_rows(&df)
}

fn load_csv(path: &Path) -> Result<DataFrame> {
    let result = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish();

    match result {
        Ok(df) => Ok(df),
        // a zero-byte upload has no header and no rows
        Err(PolarsError::NoData(_)) => Ok(DataFrame::empty()),
        Err(e) => Err(e.into()),
    }
}

fn unknown_column(column: &str) -> AppError {
    AppError::BadRequest(format!("Unknown column '{}'", column))
}

fn validate_filters(columns: &[String], filters: &Filters) -> Result<()> {
    for (column, value) in filters {
        if !columns.iter().any(|c| c == column) {
            return Err(unknown_column(column));
        }
        if value.is_array() || value.is_object() {
            return Err(AppError::BadRequest(format!(
                "Filter value for column '{}' must be a single value",
                column
            )));
        }
    }
    Ok(())
}

/// A full column name wins; otherwise `sort_by` is a comma-separated list
fn resolve_sort_columns(columns: &[String], sort_by: &str) -> Result<Vec<String>> {
    if columns.iter().any(|c| c == sort_by) {
        return Ok(vec![sort_by.to_string()]);
    }

    let requested: Vec<String> = sort_by
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if requested.is_empty() {
        return Err(unknown_column(sort_by));
    }
    if let Some(missing) = requested.iter().find(|r| !columns.contains(*r)) {
        return Err(unknown_column(missing));
    }

    Ok(requested)
}

fn apply_filters(df: DataFrame, filters: &Filters) -> Result<DataFrame> {
    let mut predicates = Vec::with_capacity(filters.len());
    for (column, value) in filters {
        let dtype = df.column(column)?.dtype().clone();
        match equality_predicate(column, &dtype, value) {
            Some(predicate) => predicates.push(predicate),
            // one impossible condition empties the whole AND
            None => return Ok(df.head(Some(0))),
        }
    }

    if predicates.is_empty() {
        return Ok(df);
    }

    let mut lazy = df.lazy();
    for predicate in predicates {
        lazy = lazy.filter(predicate);
    }
    Ok(lazy.collect()?)
}

/// Equality that respects the inferred column type
///
/// Returns `None` when the value's JSON type can never equal a cell of the
/// column, e.g. a string compared against an integer column or `null`.
fn equality_predicate(column: &str, dtype: &DataType, value: &Value) -> Option<Expr> {
    match value {
        Value::Number(n) if dtype.is_integer() => match n.as_i64() {
            Some(i) => Some(col(column).eq(lit(i))),
            None => n
                .as_f64()
                .map(|f| col(column).cast(DataType::Float64).eq(lit(f))),
        },
        Value::Number(n) if dtype.is_float() => n.as_f64().map(|f| col(column).eq(lit(f))),
        Value::String(s) if *dtype == DataType::String => Some(col(column).eq(lit(s.clone()))),
        Value::Bool(b) if *dtype == DataType::Boolean => Some(col(column).eq(lit(*b))),
        _ => None,
    }
}

fn to_rows(df: &DataFrame) -> Result<Vec<DataRowDto>> {
    let columns = df.get_columns();
    let mut rows = Vec::with_capacity(df.height());

    for idx in 0..df.height() {
        let mut row = Map::with_capacity(columns.len());
        for column in columns {
            row.insert(column.name().to_string(), any_value_to_json(column.get(idx)?));
        }
        rows.push(DataRowDto(row));
    }

    Ok(rows)
}

fn float_to_json(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn any_value_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_to_json(v as f64),
        AnyValue::Float64(v) => float_to_json(v),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const PEOPLE_CSV: &str = "\
name,city,age,score,active
Anna,Moscow,30,4.5,true
Boris,Kazan,25,3.0,false
Clara,Moscow,25,5.0,true
Dmitry,Sochi,40,,false
";

    fn service_with(files: &[(&str, &str)]) -> (TempDir, CsvQueryService) {
        let tmp = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(tmp.path().join(name), content).unwrap();
        }
        let service = CsvQueryService::new(Arc::new(LocalStorage::new(tmp.path())));
        (tmp, service)
    }

    fn filters(value: Value) -> Option<Filters> {
        value.as_object().cloned()
    }

    fn names(rows: &[DataRowDto]) -> Vec<String> {
        rows.iter()
            .map(|r| r.0["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_round_trip_keeps_order_and_types() {
        let (_tmp, service) = service_with(&[("ab.csv", "a,b\n1,x\n2,y\n")]);

        let rows = service.filter_and_sort_csv("ab.csv", None, None).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(Value::Object(rows[0].0.clone()), json!({"a": 1, "b": "x"}));
        assert_eq!(Value::Object(rows[1].0.clone()), json!({"a": 2, "b": "y"}));
        let keys: Vec<&String> = rows[0].0.keys().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let (_tmp, service) = service_with(&[]);

        let err = service
            .filter_and_sort_csv("nope.csv", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_filter_by_string_and_integer() {
        let (_tmp, service) = service_with(&[("people.csv", PEOPLE_CSV)]);

        let rows = service
            .filter_and_sort_csv("people.csv", filters(json!({"city": "Moscow"})), None)
            .await
            .unwrap();
        assert_eq!(names(&rows), ["Anna", "Clara"]);

        let rows = service
            .filter_and_sort_csv(
                "people.csv",
                filters(json!({"city": "Moscow", "age": 25})),
                None,
            )
            .await
            .unwrap();
        assert_eq!(names(&rows), ["Clara"]);
    }

    #[tokio::test]
    async fn test_filter_by_float_and_bool() {
        let (_tmp, service) = service_with(&[("people.csv", PEOPLE_CSV)]);

        let rows = service
            .filter_and_sort_csv("people.csv", filters(json!({"score": 3})), None)
            .await
            .unwrap();
        assert_eq!(names(&rows), ["Boris"]);

        let rows = service
            .filter_and_sort_csv("people.csv", filters(json!({"active": false})), None)
            .await
            .unwrap();
        assert_eq!(names(&rows), ["Boris", "Dmitry"]);
    }

    #[tokio::test]
    async fn test_filter_type_mismatch_matches_nothing() {
        let (_tmp, service) = service_with(&[("people.csv", PEOPLE_CSV)]);

        for value in [json!({"age": "25"}), json!({"city": 1}), json!({"name": null})] {
            let rows = service
                .filter_and_sort_csv("people.csv", filters(value), None)
                .await
                .unwrap();
            assert!(rows.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unknown_filter_column_is_bad_request() {
        let (_tmp, service) = service_with(&[("people.csv", PEOPLE_CSV)]);

        let err = service
            .filter_and_sort_csv("people.csv", filters(json!({"country": "RU"})), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("country")));
    }

    #[tokio::test]
    async fn test_non_scalar_filter_value_is_bad_request() {
        let (_tmp, service) = service_with(&[("people.csv", PEOPLE_CSV)]);

        let err = service
            .filter_and_sort_csv("people.csv", filters(json!({"age": [25, 30]})), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_sort_is_stable_and_ascending() {
        let (_tmp, service) = service_with(&[("people.csv", PEOPLE_CSV)]);

        let rows = service
            .filter_and_sort_csv("people.csv", None, Some("age".to_string()))
            .await
            .unwrap();
        // Boris and Clara tie on 25 and keep file order
        assert_eq!(names(&rows), ["Boris", "Clara", "Anna", "Dmitry"]);
    }

    #[tokio::test]
    async fn test_sort_puts_nulls_last() {
        let (_tmp, service) = service_with(&[("people.csv", PEOPLE_CSV)]);

        let rows = service
            .filter_and_sort_csv("people.csv", None, Some("score".to_string()))
            .await
            .unwrap();
        assert_eq!(names(&rows), ["Boris", "Anna", "Clara", "Dmitry"]);
        assert_eq!(rows[3].0["score"], Value::Null);
    }

    #[tokio::test]
    async fn test_sort_by_several_columns() {
        let (_tmp, service) = service_with(&[("people.csv", PEOPLE_CSV)]);

        let rows = service
            .filter_and_sort_csv("people.csv", None, Some("city, age".to_string()))
            .await
            .unwrap();
        assert_eq!(names(&rows), ["Boris", "Clara", "Anna", "Dmitry"]);
    }

    #[tokio::test]
    async fn test_unknown_sort_column_is_bad_request() {
        let (_tmp, service) = service_with(&[("people.csv", PEOPLE_CSV)]);

        let err = service
            .filter_and_sort_csv("people.csv", None, Some("height".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_filter_then_sort_equals_sorting_the_subset() {
        let (_tmp, service) = service_with(&[("people.csv", PEOPLE_CSV)]);

        let combined = service
            .filter_and_sort_csv(
                "people.csv",
                filters(json!({"city": "Moscow"})),
                Some("age".to_string()),
            )
            .await
            .unwrap();
        let filtered = service
            .filter_and_sort_csv("people.csv", filters(json!({"city": "Moscow"})), None)
            .await
            .unwrap();

        let mut expected = filtered;
        expected.sort_by_key(|r| r.0["age"].as_i64());
        assert_eq!(names(&combined), names(&expected));
    }

    #[test]
    fn test_resolve_sort_columns_prefers_exact_name() {
        let columns = vec!["a,b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(resolve_sort_columns(&columns, "a,b").unwrap(), ["a,b"]);
        assert_eq!(resolve_sort_columns(&columns, "b, a").unwrap(), ["b", "a"]);
        assert!(resolve_sort_columns(&columns, " , ").is_err());
    }

    #[test]
    fn test_parse_filters() {
        assert!(parse_filters(None).unwrap().is_none());
        assert!(parse_filters(Some("")).unwrap().is_none());

        let parsed = parse_filters(Some(r#"{"city": "Moscow", "age": 30}"#))
            .unwrap()
            .unwrap();
        assert_eq!(parsed.get("age"), Some(&json!(30)));

        for bad in ["{not json", "[1, 2]", "\"city\""] {
            let err = parse_filters(Some(bad)).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(ref m) if m == INVALID_JSON_FORMAT_MESSAGE));
        }
    }

    #[tokio::test]
    async fn test_empty_file_has_no_rows() {
        let (_tmp, service) = service_with(&[("empty.csv", "")]);

        let rows = service
            .filter_and_sort_csv("empty.csv", None, None)
            .await
            .unwrap();
        assert!(rows.is_empty());

        let err = service
            .filter_and_sort_csv("empty.csv", None, Some("name".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_blank_sort_by_keeps_file_order() {
        let (_tmp, service) = service_with(&[("people.csv", PEOPLE_CSV)]);

        for blank in ["", "   "] {
            let rows = service
                .filter_and_sort_csv("people.csv", None, Some(blank.to_string()))
                .await
                .unwrap();
            assert_eq!(names(&rows), vec!["Anna", "Boris", "Clara", "Dmitry"]);
        }
    }
}
