//! # Mooring
//!
//! Typed record persistence for PostgreSQL on the `may` coroutine runtime.
//!
//! A record type derives [`Record`], which gives it a static column catalog and
//! typed [`Field`] handles. Queries are written either as [`Condition`] trees,
//! as native predicates over those handles, or as dynamic `"NameAndAge"`
//! finder names; all three normalise to the same [`Condition`] and flow
//! through a [`QueryPipeline`] into parameterized SQL executed by a
//! [`Provider`]. [`Tracked`] records write minimal-diff UPDATEs on save.
//!
//! ```no_run
//! use mooring::{Model, ModelRegistry, Record, Value};
//! use mooring::mock::MockProvider;
//! use std::sync::Arc;
//!
//! #[derive(Record)]
//! #[table_name = "users"]
//! pub struct User {
//!     #[primary_key]
//!     #[auto_increment]
//!     pub id: i64,
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! # fn main() -> Result<(), mooring::MoorError> {
//! let registry = ModelRegistry::new(Arc::new(MockProvider::new()));
//! let adults = User::find_where(&registry, |u| u.age.ge(18))?;
//! let alice = User::find_by(&registry, "NameAndAge", vec![Value::from("Alice"), Value::from(30)])?;
//! # Ok(())
//! # }
//! ```

extern crate self as mooring;

pub mod catalog;
pub mod condition;
pub mod config;
pub mod connection;
pub mod dynamic;
pub mod mock;
pub mod model;
pub mod predicate;
pub mod provider;
pub mod query;
pub mod record;
pub mod registry;
pub mod row;
pub mod schema;
pub mod tracked;
pub mod translate;
pub mod value;

pub use catalog::{ColumnCatalog, ColumnDescriptor, ColumnKind, ColumnSpec};
pub use condition::{Condition, Op};
pub use config::DatabaseConfig;
pub use dynamic::DynamicFinder;
pub use model::Model;
pub use predicate::{Field, Operand, OrderKey, Predicate, PredicateExpr};
pub use provider::{MayPostgresProvider, MoorError, Provider};
pub use query::{Direction, OrderBy, Patch, QueryPipeline, Range};
pub use record::Record;
pub use registry::{ModelContext, ModelRegistry};
pub use row::{FromRow, Row};
pub use schema::{PostgresSchemaBuilder, SchemaBuilder};
pub use tracked::{DirtySet, SaveOutcome, Tracked};
pub use translate::PredicateTranslator;
pub use value::ValueType;

pub use mooring_derive::Record;

pub use sea_query;
pub use sea_query::Value;
