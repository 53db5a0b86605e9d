//! Procedural macros for Mooring
//!
//! This crate provides the `Record` derive, which turns a plain struct into a
//! persisted record: a static column catalog, typed field handles for
//! predicates, dynamic column accessors and a row materializer.

mod attributes;
mod macros;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `Record` - generates the catalog shape and field handles
///
/// This macro generates:
/// - `impl mooring::Record` (table name, `COLUMNS`, `fields()`, `get`, `set`, `is_new`)
/// - `<Name>Fields` struct of typed `mooring::Field<Name, T>` handles
/// - `impl mooring::FromRow` reading each column by name
///
/// # Example
///
/// ```ignore
/// use mooring::Record;
///
/// #[derive(Record)]
/// #[table_name = "users"]
/// pub struct User {
///     #[primary_key]
///     #[auto_increment]
///     pub id: i64,
///     pub name: String,
///     #[column_name = "years"]
///     pub age: i32,
///     #[skip]
///     pub cached_label: String,
/// }
///
/// let f = User::fields();
/// let predicate = f.name.eq("Alice") & f.age.gt(30);
/// ```
#[proc_macro_derive(Record, attributes(table_name, primary_key, auto_increment, column_name, skip))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    macros::derive_record(input)
}
