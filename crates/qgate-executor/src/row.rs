//! Conversion of Postgres rows into ordered JSON maps.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Value, json};
use sqlx::postgres::{PgRow, Postgres};
use sqlx::{Column, Decode, Row, Type, TypeInfo};
use tracing::debug;
use uuid::Uuid;

fn get<'r, T>(row: &'r PgRow, index: usize) -> Option<T>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index).ok().flatten()
}

/// Decode one column by its Postgres type name. NULL and undecodable values
/// become JSON null.
fn column_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name {
        "INT2" => get::<i16>(row, index).map(|v| json!(v)),
        "INT4" => get::<i32>(row, index).map(|v| json!(v)),
        "INT8" => get::<i64>(row, index).map(|v| json!(v)),
        "FLOAT4" => get::<f32>(row, index).map(|v| json!(v)),
        "FLOAT8" => get::<f64>(row, index).map(|v| json!(v)),
        // exact decimals are kept as strings
        "NUMERIC" => get::<BigDecimal>(row, index).map(|v| Value::String(v.to_string())),
        "BOOL" => get::<bool>(row, index).map(Value::Bool),
        "UUID" => get::<Uuid>(row, index).map(|v| Value::String(v.to_string())),
        "JSON" | "JSONB" => get::<Value>(row, index),
        "DATE" => get::<NaiveDate>(row, index).map(|v| Value::String(v.format("%Y-%m-%d").to_string())),
        "TIME" => get::<NaiveTime>(row, index).map(|v| Value::String(v.format("%H:%M:%S%.f").to_string())),
        "TIMESTAMP" => get::<NaiveDateTime>(row, index)
            .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, index).map(|v| Value::String(v.to_rfc3339())),
        _ => {
            let value = get::<String>(row, index);
            if value.is_none() {
                debug!(type_name, "unsupported column type, returning null");
            }
            value.map(Value::String)
        }
    }
    .unwrap_or(Value::Null)
}

/// Column names in result order.
pub fn column_names(row: &PgRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// One row as an ordered column → value map.
pub fn row_to_map(row: &PgRow) -> Map<String, Value> {
    let mut map = Map::new();
    for column in row.columns() {
        let value = column_value(row, column.ordinal(), column.type_info().name());
        map.insert(column.name().to_string(), value);
    }
    map
}
