//! Query pipeline for record types.
//!
//! A [`QueryPipeline`] starts from a record type's [`crate::ModelContext`],
//! accumulates a filter, sort keys and a result window by value, and is
//! consumed by exactly one terminal operation.
//!
//! # Architecture
//!
//! - **Select**: pipeline state and `SELECT` assembly (`QueryPipeline`)
//! - **Execution**: terminal operations (`select`, `find_one`, `count`,
//!   aggregates, `delete`, `update`) and write statements
//! - **Order**: sort keys (`OrderBy`, `Direction`) and the 1-based `Range`
//!
//! # Examples
//!
//! ```no_run
//! use mooring::{Model, ModelRegistry, Record};
//! use mooring::mock::MockProvider;
//! use std::sync::Arc;
//!
//! #[derive(Record)]
//! #[table_name = "users"]
//! pub struct User {
//!     #[primary_key]
//!     pub id: i64,
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! # fn main() -> Result<(), mooring::MoorError> {
//! let registry = ModelRegistry::new(Arc::new(MockProvider::new()));
//! let page = User::query(&registry)?
//!     .filter_by(|u| u.age.ge(18))
//!     .order_by(User::fields().name.asc())
//!     .range(11, 10)
//!     .select()?;
//! # let _ = page;
//! # Ok(())
//! # }
//! ```

// SELECT pipeline state and statement assembly
pub mod select;
#[doc(inline)]
pub use select::QueryPipeline;

// Terminal operations and write statements
pub mod execution;
#[doc(inline)]
pub use execution::Patch;

// Sort keys and result windows
pub mod order;
#[doc(inline)]
pub use order::{Direction, OrderBy, Range};
