//! ValueType trait for type-safe value conversions
//!
//! The `ValueType` trait maps Rust types to their corresponding `sea_query::Value` variant
//! and to the [`ColumnKind`] the catalog records for a field of that type.
//!
//! ## Usage
//!
//! ```rust
//! use mooring::ValueType;
//! use sea_query::Value;
//!
//! let value = ValueType::into_value(42i32);
//! assert!(matches!(value, Value::Int(Some(42))));
//!
//! let value = ValueType::into_value(None::<i32>);
//! assert!(matches!(value, Value::Int(None)));
//! ```
//!
//! Implemented for `bool`, `i8`, `i16`, `i32`, `i64`, `f32`, `f64`, `String`,
//! `Vec<u8>`, `serde_json::Value`, `chrono::NaiveDateTime`,
//! `rust_decimal::Decimal`, and `Option<T>` of each.

use crate::catalog::ColumnKind;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_query::Value;

/// Trait for mapping Rust types to their corresponding `sea_query::Value` variant.
pub trait ValueType: Sized {
    /// Column kind recorded in the catalog for fields of this type
    const KIND: ColumnKind;

    /// Whether a field of this type may hold NULL
    const NULLABLE: bool = false;

    /// Convert this value into a `sea_query::Value`.
    fn into_value(self) -> Value;

    /// Convert a `sea_query::Value` into this type, if possible.
    ///
    /// Returns `None` if the value doesn't match the expected variant or is null.
    fn from_value(value: Value) -> Option<Self>;

    /// Return the null variant for this type.
    ///
    /// This is used by `Option<T>` to create the appropriate null `Value` variant
    /// when converting `None`.
    fn null_value() -> Value;
}

macro_rules! impl_value_type {
    ($ty:ty, $variant:ident, $kind:ident) => {
        impl ValueType for $ty {
            const KIND: ColumnKind = ColumnKind::$kind;

            fn into_value(self) -> Value {
                Value::$variant(Some(self))
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(Some(v)) => Some(v),
                    _ => None,
                }
            }

            fn null_value() -> Value {
                Value::$variant(None)
            }
        }
    };
}

impl_value_type!(bool, Bool, Boolean);
impl_value_type!(i8, TinyInt, TinyInt);
impl_value_type!(i16, SmallInt, SmallInt);
impl_value_type!(i32, Int, Integer);
impl_value_type!(i64, BigInt, BigInt);
impl_value_type!(f32, Float, Float);
impl_value_type!(f64, Double, Double);
impl_value_type!(String, String, Text);
impl_value_type!(Vec<u8>, Bytes, Bytes);

impl ValueType for serde_json::Value {
    const KIND: ColumnKind = ColumnKind::Json;

    fn into_value(self) -> Value {
        Value::Json(Some(Box::new(self)))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Json(Some(v)) => Some(*v),
            _ => None,
        }
    }

    fn null_value() -> Value {
        Value::Json(None)
    }
}

// Chrono and decimal variants are read back through sea-query's own
// conversions so the storage shape of the variant stays sea-query's concern.

impl ValueType for NaiveDateTime {
    const KIND: ColumnKind = ColumnKind::Timestamp;

    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        <NaiveDateTime as sea_query::ValueType>::try_from(value).ok()
    }

    fn null_value() -> Value {
        Value::from(None::<NaiveDateTime>)
    }
}

impl ValueType for Decimal {
    const KIND: ColumnKind = ColumnKind::Decimal;

    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        <Decimal as sea_query::ValueType>::try_from(value).ok()
    }

    fn null_value() -> Value {
        Value::from(None::<Decimal>)
    }
}

impl<T: ValueType> ValueType for Option<T> {
    const KIND: ColumnKind = T::KIND;
    const NULLABLE: bool = true;

    fn into_value(self) -> Value {
        match self {
            Some(v) => T::into_value(v),
            None => T::null_value(),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        if value == T::null_value() {
            return Some(None);
        }
        T::from_value(value).map(Some)
    }

    fn null_value() -> Value {
        T::null_value()
    }
}

/// Marker for field types that support text matching (`LIKE`)
pub trait TextValue: ValueType {}

impl TextValue for String {}
impl TextValue for Option<String> {}
