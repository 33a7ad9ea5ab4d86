use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use itertools::Itertools;
use rust_decimal::Decimal;
use tiberius::numeric::Numeric;
use tiberius::{ColumnData, FromSql, Query};

use crate::domain::entity::{Statement, Value};
use crate::domain::repository::DbError;

/// SQL文とパラメータから tiberius のクエリを組み立てる
pub fn build_query(statement: &Statement) -> Query<'_> {
    let mut query = Query::new(statement.sql.as_str());
    for param in &statement.params {
        match param {
            Value::Integer(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::Decimal(d) => query.bind(numeric(d)),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Boolean(b) => query.bind(*b),
            Value::Timestamp(dt) => query.bind(*dt),
            Value::Date(d) => query.bind(*d),
            Value::Null => query.bind(Option::<&str>::None),
        }
    }
    query
}

// Decimal は直接バインドできないので仮数と桁数で渡す
fn numeric(d: &Decimal) -> Numeric {
    Numeric::new_with_scale(d.mantissa(), d.scale() as u8)
}

/// 受信したセルの値を変換する
pub fn to_value(column: &str, data: &ColumnData<'static>) -> Result<Value, DbError> {
    let value = match data {
        ColumnData::U8(v) => v.map(|v| Value::Integer(i64::from(v))),
        ColumnData::I16(v) => v.map(|v| Value::Integer(i64::from(v))),
        ColumnData::I32(v) => v.map(|v| Value::Integer(i64::from(v))),
        ColumnData::I64(v) => v.map(Value::Integer),
        ColumnData::F32(v) => v.map(|v| Value::Float(f64::from(v))),
        ColumnData::F64(v) => v.map(Value::Float),
        ColumnData::Bit(v) => v.map(Value::Boolean),
        ColumnData::String(v) => v.as_ref().map(|s| Value::Text(s.to_string())),
        ColumnData::Guid(v) => v.map(|g| Value::Text(g.to_string())),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|bytes| Value::Text(format!("0x{}", bytes.iter().map(|b| format!("{:02X}", b)).join("")))),
        ColumnData::Numeric(_) => from_sql::<Decimal>(column, data)?.map(Value::Decimal),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            from_sql::<NaiveDateTime>(column, data)?.map(Value::Timestamp)
        }
        ColumnData::Date(_) => from_sql::<NaiveDate>(column, data)?.map(Value::Date),
        ColumnData::Time(_) => from_sql::<NaiveTime>(column, data)?.map(|t| Value::Text(t.to_string())),
        ColumnData::DateTimeOffset(_) => {
            from_sql::<DateTime<Utc>>(column, data)?.map(|dt| Value::Text(dt.to_rfc3339()))
        }
        other => {
            return Err(DbError::UnsupportedType {
                column: column.to_string(),
                type_name: format!("{:?}", other).split('(').next().unwrap_or_default().to_string(),
            })
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

fn from_sql<'a, T: FromSql<'a>>(column: &str, data: &'a ColumnData<'static>) -> Result<Option<T>, DbError> {
    T::from_sql(data).map_err(|e| DbError::Query(format!("column {}: {}", column, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn integers_widen_to_i64() {
        assert_eq!(to_value("a", &ColumnData::U8(Some(7))).unwrap(), Value::Integer(7));
        assert_eq!(to_value("a", &ColumnData::I16(Some(-3))).unwrap(), Value::Integer(-3));
        assert_eq!(to_value("a", &ColumnData::I32(Some(1_000))).unwrap(), Value::Integer(1_000));
    }

    #[test]
    fn nulls_of_any_type_become_null() {
        assert_eq!(to_value("a", &ColumnData::I32(None)).unwrap(), Value::Null);
        assert_eq!(to_value("a", &ColumnData::String(None)).unwrap(), Value::Null);
        assert_eq!(to_value("a", &ColumnData::Numeric(None)).unwrap(), Value::Null);
    }

    #[test]
    fn strings_and_bits_are_copied() {
        let data = ColumnData::String(Some(Cow::Owned("Dune".to_string())));
        assert_eq!(to_value("Name", &data).unwrap(), Value::from("Dune"));
        assert_eq!(to_value("IsOrder", &ColumnData::Bit(Some(true))).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn decimal_params_keep_scale() {
        let n = numeric(&Decimal::new(1999, 2));
        assert_eq!(n.value(), 1999);
        assert_eq!(n.scale(), 2);

        let statement = Statement::new("UPDATE [Books] SET [Price] = @P1 WHERE [BookCode] = @P2")
            .bind(Decimal::new(1999, 2))
            .bind(7i64);
        let query = build_query(&statement);
        assert!(format!("{:?}", query).contains("Numeric"));
    }

    #[test]
    fn date_params_are_typed() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let statement = Statement::new("SELECT * FROM Sales WHERE SaleDate = @P1").bind(date);
        let query = build_query(&statement);
        let debug = format!("{:?}", query);
        assert!(debug.contains("Date"));
        assert!(!debug.contains("String"));
    }

    #[test]
    fn binary_is_rendered_as_hex() {
        let data = ColumnData::Binary(Some(Cow::Owned(vec![0x0a, 0xff])));
        assert_eq!(to_value("Blob", &data).unwrap(), Value::from("0x0AFF"));
    }
}
