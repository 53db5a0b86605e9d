//! The `Record` trait
//!
//! Implemented by `#[derive(Record)]`. A record type carries its table name,
//! its column declarations and a set of typed field handles; dynamic `get` and
//! `set` give change tracking access to individual members by name.

use crate::catalog::ColumnSpec;
use crate::provider::MoorError;
use crate::row::FromRow;
use sea_query::Value;

/// A persisted record type
///
/// # Example
///
/// ```no_run
/// use mooring::Record;
///
/// #[derive(Record, Default)]
/// #[table_name = "users"]
/// pub struct User {
///     #[primary_key]
///     #[auto_increment]
///     pub id: i64,
///     pub name: String,
///     pub email: Option<String>,
/// }
///
/// assert_eq!(User::TABLE, "users");
/// assert_eq!(User::COLUMNS.len(), 3);
/// let fields = User::fields();
/// let _adults = fields.name.eq("Alice");
/// ```
pub trait Record: FromRow + Send + Sync + 'static {
    /// Struct of typed `Field` handles, one per persisted member
    type Fields: Copy;

    /// SQL table name
    const TABLE: &'static str;

    /// Persisted columns, in declaration order
    const COLUMNS: &'static [ColumnSpec];

    /// Typed field handles for building predicates
    fn fields() -> Self::Fields;

    /// Read a persisted member by Rust name
    fn get(&self, member: &str) -> Option<Value>;

    /// Write a persisted member by Rust name
    ///
    /// # Errors
    ///
    /// `UnknownColumn` for a member that is not persisted, `ParseError` when
    /// `value` does not fit the member's type.
    fn set(&mut self, member: &str, value: Value) -> Result<(), MoorError>;

    /// Whether the key still holds its default value (not yet persisted)
    fn is_new(&self) -> bool;
}
