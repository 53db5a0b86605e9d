//! Query by synthetic member name
//!
//! A dynamic finder name lists columns joined by `And`, for example
//! `"NameAndAge"`. Each fragment is matched case-sensitively against a column
//! name or the PascalCase form of a member name, and paired positionally with
//! an argument to build an equality condition.

use crate::catalog::ColumnCatalog;
use crate::condition::{Condition, Op};
use crate::provider::MoorError;
use sea_query::Value;

/// Separator between column fragments in a dynamic name
pub const SEPARATOR: &str = "And";

/// Parser for dynamic finder names
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicFinder;

impl DynamicFinder {
    /// Build `fragment1 = arg1 AND fragment2 = arg2 ...` from `name`
    ///
    /// The result is a left-folded `and` of equality leaves and equals the
    /// condition built explicitly with [`Condition::compare`] and
    /// [`Condition::and`] in the same order.
    ///
    /// # Errors
    ///
    /// `UnknownColumn` naming the first fragment that matches no column, then
    /// `ArityMismatch` when the argument count differs from the fragment count.
    pub fn parse(catalog: &ColumnCatalog, name: &str, args: Vec<Value>) -> Result<Condition, MoorError> {
        let columns = name
            .split(SEPARATOR)
            .map(|fragment| catalog.resolve_property(fragment).map(|c| c.name))
            .collect::<Result<Vec<_>, _>>()?;

        if columns.len() != args.len() {
            return Err(MoorError::ArityMismatch {
                expected: columns.len(),
                actual: args.len(),
            });
        }

        Ok(columns
            .into_iter()
            .zip(args)
            .fold(Condition::Empty, |acc, (column, value)| {
                acc.and(Condition::compare(column, Op::Eq, value))
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnKind, ColumnSpec};

    const SPECS: &[ColumnSpec] = &[
        ColumnSpec {
            field: "id",
            column: "id",
            kind: ColumnKind::BigInt,
            nullable: false,
            key: true,
            auto_increment: true,
        },
        ColumnSpec {
            field: "name",
            column: "name",
            kind: ColumnKind::Text,
            nullable: false,
            key: false,
            auto_increment: false,
        },
        ColumnSpec {
            field: "age",
            column: "age",
            kind: ColumnKind::Integer,
            nullable: false,
            key: false,
            auto_increment: false,
        },
        ColumnSpec {
            field: "home_city",
            column: "home_city",
            kind: ColumnKind::Text,
            nullable: true,
            key: false,
            auto_increment: false,
        },
    ];

    fn catalog() -> ColumnCatalog {
        ColumnCatalog::build("Person", "people", SPECS).unwrap()
    }

    #[test]
    fn test_name_and_age_equals_explicit_build() {
        let cond = DynamicFinder::parse(
            &catalog(),
            "NameAndAge",
            vec![Value::from("Alice"), Value::from(30)],
        )
        .unwrap();
        let explicit = Condition::compare("name", Op::Eq, "Alice")
            .and(Condition::compare("age", Op::Eq, 30));
        assert_eq!(cond, explicit);
    }

    #[test]
    fn test_single_fragment_and_column_names() {
        let cond = DynamicFinder::parse(&catalog(), "home_city", vec![Value::from("Oslo")]).unwrap();
        assert_eq!(cond, Condition::compare("home_city", Op::Eq, "Oslo"));
        let cond = DynamicFinder::parse(&catalog(), "HomeCity", vec![Value::from("Oslo")]).unwrap();
        assert_eq!(cond, Condition::compare("home_city", Op::Eq, "Oslo"));
    }

    #[test]
    fn test_unknown_fragment() {
        match DynamicFinder::parse(&catalog(), "NoSuchField", vec![Value::from(1)]) {
            Err(MoorError::UnknownColumn { column, .. }) => assert_eq!(column, "NoSuchField"),
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
        // Case-sensitive
        assert!(DynamicFinder::parse(&catalog(), "nameAndAge", vec![]).is_err());
    }

    #[test]
    fn test_first_unknown_fragment_is_reported() {
        match DynamicFinder::parse(&catalog(), "NameAndBogusAndWorse", vec![]) {
            Err(MoorError::UnknownColumn { column, .. }) => assert_eq!(column, "Bogus"),
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_arity_mismatch() {
        let result = DynamicFinder::parse(&catalog(), "NameAndAge", vec![Value::from("Alice")]);
        assert!(matches!(
            result,
            Err(MoorError::ArityMismatch { expected: 2, actual: 1 })
        ));
    }
}
