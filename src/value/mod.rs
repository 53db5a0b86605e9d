//! Value type system for Mooring
//!
//! Record fields, predicate literals and provider parameters all travel as
//! `sea_query::Value`. This module maps Rust field types onto those values
//! and converts values into `may_postgres` parameters.
//!
//! - **`ValueType`** - Maps Rust types to their `sea_query::Value` variant and column kind
//! - **`with_converted_params`** - Binds a slice of values as `ToSql` parameters

pub mod conversion;
pub mod types;

pub use conversion::{integer_as, is_null, is_unset_key, numeric_value, with_converted_params};
pub use types::{TextValue, ValueType};
