//! Conversion of `sea_query::Value` parameters into `may_postgres` binds
//!
//! Values are converted in two passes: the first pass turns every value into
//! an owned `ToSql` box, the second borrows those boxes as the `&[&dyn ToSql]`
//! slice the client expects. Nulls keep the SQL type of their variant, so a
//! `Value::String(None)` binds as a typed text NULL.

use crate::catalog::ColumnKind;
use crate::provider::MoorError;
use chrono::NaiveDateTime;
use may_postgres::types::ToSql;
use rust_decimal::Decimal;
use sea_query::Value;

/// Bind `values` as `ToSql` parameters and call `f` with them
///
/// # Errors
///
/// Returns `MoorError::QueryError` when a value has no PostgreSQL binding
/// (for example an unsigned 64-bit value above `i64::MAX`), otherwise
/// whatever `f` returns.
pub fn with_converted_params<F, R>(values: &[Value], f: F) -> Result<R, MoorError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, MoorError>,
{
    let owned = values
        .iter()
        .map(to_sql_param)
        .collect::<Result<Vec<_>, _>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|p| p.as_ref() as &dyn ToSql).collect();
    f(&params)
}

fn to_sql_param(value: &Value) -> Result<Box<dyn ToSql>, MoorError> {
    let param: Box<dyn ToSql> = match value {
        Value::Bool(v) => Box::new(*v),
        Value::TinyInt(v) => Box::new(*v),
        Value::SmallInt(v) => Box::new(*v),
        Value::Int(v) => Box::new(*v),
        Value::BigInt(v) => Box::new(*v),
        // PostgreSQL has no unsigned integers; widen to the next signed type
        Value::TinyUnsigned(v) => Box::new(v.map(i16::from)),
        Value::SmallUnsigned(v) => Box::new(v.map(i32::from)),
        Value::Unsigned(v) => Box::new(v.map(i64::from)),
        Value::BigUnsigned(v) => {
            let widened = v.map(i64::try_from).transpose().map_err(|_| {
                MoorError::QueryError(format!("unsigned value {v:?} exceeds BIGINT range"))
            })?;
            Box::new(widened)
        }
        Value::Float(v) => Box::new(*v),
        Value::Double(v) => Box::new(*v),
        Value::String(v) => Box::new(v.clone()),
        Value::Char(v) => Box::new(v.map(|c| c.to_string())),
        Value::Bytes(v) => Box::new(v.clone()),
        Value::Json(v) => Box::new(v.as_deref().cloned()),
        other => {
            if let Ok(ts) = <Option<NaiveDateTime> as sea_query::ValueType>::try_from(other.clone()) {
                Box::new(ts)
            } else if let Ok(num) = <Option<Decimal> as sea_query::ValueType>::try_from(other.clone()) {
                Box::new(num)
            } else {
                return Err(MoorError::QueryError(format!(
                    "unsupported parameter value: {other:?}"
                )));
            }
        }
    };
    Ok(param)
}

/// Whether `value` is the null of any variant
pub fn is_null(value: &Value) -> bool {
    match value {
        Value::Bool(v) => v.is_none(),
        Value::TinyInt(v) => v.is_none(),
        Value::SmallInt(v) => v.is_none(),
        Value::Int(v) => v.is_none(),
        Value::BigInt(v) => v.is_none(),
        Value::TinyUnsigned(v) => v.is_none(),
        Value::SmallUnsigned(v) => v.is_none(),
        Value::Unsigned(v) => v.is_none(),
        Value::BigUnsigned(v) => v.is_none(),
        Value::Float(v) => v.is_none(),
        Value::Double(v) => v.is_none(),
        Value::String(v) => v.is_none(),
        Value::Char(v) => v.is_none(),
        Value::Bytes(v) => v.is_none(),
        Value::Json(v) => v.is_none(),
        other => {
            *other == Value::from(None::<NaiveDateTime>) || *other == Value::from(None::<Decimal>)
        }
    }
}

/// Read a numeric aggregate result as a `Decimal`
///
/// `MAX`/`MIN`/`SUM` come back as whatever type the column (or PostgreSQL's
/// widening rules) produce; this folds them into one representation.
/// Returns `None` for NULL and for non-numeric values.
pub fn numeric_value(value: Value) -> Option<Decimal> {
    match value {
        Value::TinyInt(Some(v)) => Some(Decimal::from(v)),
        Value::SmallInt(Some(v)) => Some(Decimal::from(v)),
        Value::Int(Some(v)) => Some(Decimal::from(v)),
        Value::BigInt(Some(v)) => Some(Decimal::from(v)),
        Value::TinyUnsigned(Some(v)) => Some(Decimal::from(v)),
        Value::SmallUnsigned(Some(v)) => Some(Decimal::from(v)),
        Value::Unsigned(Some(v)) => Some(Decimal::from(v)),
        Value::BigUnsigned(Some(v)) => Some(Decimal::from(v)),
        Value::Float(Some(v)) => Decimal::try_from(v).ok(),
        Value::Double(Some(v)) => Decimal::try_from(v).ok(),
        other => <Decimal as sea_query::ValueType>::try_from(other).ok(),
    }
}

/// Whether a key value still holds its type's default (NULL or integer zero)
pub fn is_unset_key(value: &Value) -> bool {
    match value {
        Value::TinyInt(Some(v)) => *v == 0,
        Value::SmallInt(Some(v)) => *v == 0,
        Value::Int(Some(v)) => *v == 0,
        Value::BigInt(Some(v)) => *v == 0,
        Value::TinyUnsigned(Some(v)) => *v == 0,
        Value::SmallUnsigned(Some(v)) => *v == 0,
        Value::Unsigned(Some(v)) => *v == 0,
        Value::BigUnsigned(Some(v)) => *v == 0,
        other => is_null(other),
    }
}

/// Re-type an integer value to the width of a `kind` column
///
/// Storage may report a generated key as INT4 for an `i64` member or the
/// other way round. Values that do not fit, and non-integer values, are
/// returned unchanged.
pub fn integer_as(value: Value, kind: ColumnKind) -> Value {
    let wide = match value {
        Value::TinyInt(Some(v)) => i64::from(v),
        Value::SmallInt(Some(v)) => i64::from(v),
        Value::Int(Some(v)) => i64::from(v),
        Value::BigInt(Some(v)) => v,
        other => return other,
    };
    let converted = match kind {
        ColumnKind::TinyInt => i8::try_from(wide).ok().map(|v| Value::TinyInt(Some(v))),
        ColumnKind::SmallInt => i16::try_from(wide).ok().map(|v| Value::SmallInt(Some(v))),
        ColumnKind::Integer => i32::try_from(wide).ok().map(|v| Value::Int(Some(v))),
        ColumnKind::BigInt => Some(Value::BigInt(Some(wide))),
        _ => None,
    };
    converted.unwrap_or(Value::BigInt(Some(wide)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_keep_order_and_count() {
        let values = vec![
            Value::Int(Some(1)),
            Value::String(Some("a".to_string())),
            Value::Bool(None),
        ];
        let count = with_converted_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_empty_params() {
        let count = with_converted_params(&[], |params| Ok(params.len())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_big_unsigned_overflow_is_rejected() {
        let values = vec![Value::BigUnsigned(Some(u64::MAX))];
        let result = with_converted_params(&values, |_| Ok(()));
        assert!(matches!(result, Err(MoorError::QueryError(_))));
    }

    #[test]
    fn test_callback_error_propagates() {
        let result: Result<(), MoorError> =
            with_converted_params(&[Value::Int(Some(1))], |_| Err(MoorError::Other("x".into())));
        assert!(matches!(result, Err(MoorError::Other(_))));
    }

    #[test]
    fn test_is_null() {
        assert!(is_null(&Value::Int(None)));
        assert!(is_null(&Value::String(None)));
        assert!(is_null(&Value::from(None::<Decimal>)));
        assert!(!is_null(&Value::Int(Some(0))));
        assert!(!is_null(&Value::from(Decimal::ZERO)));
    }

    #[test]
    fn test_numeric_value() {
        assert_eq!(numeric_value(Value::Int(Some(7))), Some(Decimal::from(7)));
        assert_eq!(numeric_value(Value::BigInt(None)), None);
        assert_eq!(
            numeric_value(Value::from(Decimal::new(250, 2))),
            Some(Decimal::new(250, 2))
        );
        assert_eq!(numeric_value(Value::String(Some("1".into()))), None);
    }

    #[test]
    fn test_is_unset_key() {
        assert!(is_unset_key(&Value::BigInt(Some(0))));
        assert!(is_unset_key(&Value::Int(None)));
        assert!(!is_unset_key(&Value::Int(Some(7))));
        assert!(!is_unset_key(&Value::from("a")));
    }

    #[test]
    fn test_integer_as_column_width() {
        assert_eq!(integer_as(Value::Int(Some(7)), ColumnKind::BigInt), Value::BigInt(Some(7)));
        assert_eq!(integer_as(Value::BigInt(Some(7)), ColumnKind::Integer), Value::Int(Some(7)));
        assert_eq!(
            integer_as(Value::String(Some("k".to_string())), ColumnKind::BigInt),
            Value::String(Some("k".to_string()))
        );
    }
}
