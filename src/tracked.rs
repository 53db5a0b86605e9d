//! Change tracking
//!
//! [`Tracked`] wraps a record and remembers which members were written since
//! it was loaded or last saved. Saving a persisted record issues an UPDATE of
//! exactly those columns, or nothing at all when none were written.
//!
//! ```no_run
//! use mooring::{ModelRegistry, Model, Record, SaveOutcome, Tracked};
//!
//! #[derive(Record)]
//! struct User {
//!     #[primary_key]
//!     #[auto_increment]
//!     id: i64,
//!     name: String,
//!     age: i32,
//! }
//!
//! # fn demo(registry: &ModelRegistry) -> Result<(), mooring::MoorError> {
//! if let Some(user) = User::find_by_id(registry, 7i64)? {
//!     let mut user = Tracked::loaded(user);
//!     user.set(User::fields().age, 31)?;
//!     assert!(matches!(user.save(registry)?, SaveOutcome::Updated { .. }));
//! }
//! # Ok(())
//! # }
//! ```

use crate::predicate::Field;
use crate::provider::MoorError;
use crate::record::Record;
use crate::registry::{ModelContext, ModelRegistry};
use crate::value::ValueType;
use std::ops::Deref;

/// Members written since the last load or save, in first-write order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtySet {
    members: Vec<&'static str>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a write to `member`; repeated writes are kept once
    pub fn insert(&mut self, member: &'static str) {
        if !self.contains(member) {
            self.members.push(member);
        }
    }

    pub fn contains(&self, member: &str) -> bool {
        self.members.iter().any(|m| *m == member)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.members.iter().copied()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}

/// What `Tracked::save` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record was inserted
    Inserted,
    /// An UPDATE ran and matched `rows` rows
    Updated { rows: u64 },
    /// Nothing was written, so no statement ran
    Unchanged,
}

/// A record with per-member write tracking
#[derive(Debug, Clone)]
pub struct Tracked<R> {
    record: R,
    dirty: DirtySet,
    persisted: bool,
}

impl<R: Record> Tracked<R> {
    /// Wrap a record that does not exist in storage yet
    pub fn new(record: R) -> Self {
        Self {
            record,
            dirty: DirtySet::new(),
            persisted: false,
        }
    }

    /// Wrap a record just read from storage; nothing is dirty
    pub fn loaded(record: R) -> Self {
        Self {
            record,
            dirty: DirtySet::new(),
            persisted: true,
        }
    }

    /// Write `value` to `field` and mark it dirty
    pub fn set<T: ValueType>(&mut self, field: Field<R, T>, value: impl Into<T>) -> Result<(), MoorError> {
        self.record.set(field.member(), value.into().into_value())?;
        self.dirty.insert(field.member());
        Ok(())
    }

    /// Mark `field` dirty after writing it through [`Tracked::record_mut`]
    pub fn mark_dirty<T>(&mut self, field: Field<R, T>) {
        self.dirty.insert(field.member());
    }

    /// Mark a member dirty by its Rust name
    pub fn mark_dirty_by_name(&mut self, member: &str) -> Result<(), MoorError> {
        let spec = R::COLUMNS
            .iter()
            .find(|spec| spec.field == member)
            .ok_or_else(|| MoorError::UnknownColumn {
                table: R::TABLE.to_string(),
                column: member.to_string(),
            })?;
        self.dirty.insert(spec.field);
        Ok(())
    }

    /// Mutable access to the record; writes made here are not tracked
    pub fn record_mut(&mut self) -> &mut R {
        &mut self.record
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_fields(&self) -> &DirtySet {
        &self.dirty
    }

    /// Whether the record is known to exist in storage
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Insert a new record, or update the dirty columns of a persisted one
    ///
    /// A record whose key still holds its default is always inserted. Key
    /// members are never part of an UPDATE.
    pub fn save(&mut self, registry: &ModelRegistry) -> Result<SaveOutcome, MoorError> {
        let ctx = registry.get_or_create::<R>()?;
        if !self.persisted || self.record.is_new() {
            self.insert_into(&ctx)?;
            return Ok(SaveOutcome::Inserted);
        }

        let members: Vec<&str> = self
            .dirty
            .iter()
            .filter(|member| {
                ctx.catalog()
                    .by_field(member)
                    .is_some_and(|column| !column.is_key)
            })
            .collect();
        if members.is_empty() {
            self.dirty.clear();
            return Ok(SaveOutcome::Unchanged);
        }

        let rows = ctx.update(&self.record, &members)?;
        if rows == 0 {
            log::warn!(
                "UPDATE of {} matched no rows; the record may have been deleted",
                ctx.catalog().type_name()
            );
        }
        self.dirty.clear();
        Ok(SaveOutcome::Updated { rows })
    }

    /// Insert unconditionally, writing a generated key back into the record
    pub fn insert(&mut self, registry: &ModelRegistry) -> Result<(), MoorError> {
        let ctx = registry.get_or_create::<R>()?;
        self.insert_into(&ctx)
    }

    fn insert_into(&mut self, ctx: &ModelContext) -> Result<(), MoorError> {
        for (member, value) in ctx.insert(&self.record)? {
            self.record.set(member, value)?;
        }
        self.persisted = true;
        self.dirty.clear();
        Ok(())
    }

    /// Delete the record by key
    pub fn delete(&mut self, registry: &ModelRegistry) -> Result<u64, MoorError> {
        let ctx = registry.get_or_create::<R>()?;
        let rows = ctx.delete(&self.record)?;
        self.persisted = false;
        Ok(rows)
    }

    pub fn into_inner(self) -> R {
        self.record
    }
}

impl<R> Deref for Tracked<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_set_keeps_first_write_order() {
        let mut dirty = DirtySet::new();
        dirty.insert("age");
        dirty.insert("name");
        dirty.insert("age");
        assert_eq!(dirty.iter().collect::<Vec<_>>(), vec!["age", "name"]);
        assert_eq!(dirty.len(), 2);
        assert!(dirty.contains("name"));
        dirty.clear();
        assert!(dirty.is_empty());
    }
}
