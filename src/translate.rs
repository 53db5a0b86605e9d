//! Predicate-to-condition translation
//!
//! [`PredicateTranslator`] walks a [`PredicateExpr`] once and produces the
//! equivalent [`Condition`], resolving every member access through the
//! record's [`ColumnCatalog`]. Only comparisons, the recognised text/null/set
//! methods, and logical connectives are representable.

use crate::catalog::{ColumnCatalog, ColumnDescriptor, ColumnKind};
use crate::condition::{Condition, Op};
use crate::predicate::{Operand, OrderKey, Predicate, PredicateExpr};
use crate::provider::MoorError;
use crate::query::OrderBy;
use sea_query::Value;

/// Translates predicates over one record type into conditions
#[derive(Debug, Clone, Copy)]
pub struct PredicateTranslator<'a> {
    catalog: &'a ColumnCatalog,
}

impl<'a> PredicateTranslator<'a> {
    pub fn new(catalog: &'a ColumnCatalog) -> Self {
        Self { catalog }
    }

    /// Translate a typed predicate
    pub fn translate_predicate<R>(&self, predicate: &Predicate<R>) -> Result<Condition, MoorError> {
        self.translate(predicate.expr())
    }

    /// Translate an untyped predicate expression
    ///
    /// # Errors
    ///
    /// `UnknownColumn` when a member is not cataloged; `TranslationError` for
    /// column-to-column or literal-to-literal comparisons, unrecognised
    /// methods, and bare members that are not boolean columns.
    pub fn translate(&self, expr: &PredicateExpr) -> Result<Condition, MoorError> {
        match expr {
            PredicateExpr::Compare { left, op, right } => self.comparison(left, *op, right),
            PredicateExpr::Member(member) => {
                let column = self.catalog.resolve_member(member)?;
                if column.kind != ColumnKind::Boolean {
                    return Err(MoorError::TranslationError(format!(
                        "member `{member}` is not a boolean column and cannot stand alone in a filter"
                    )));
                }
                Ok(Condition::compare(column.name, Op::Eq, true))
            }
            PredicateExpr::Call {
                member,
                method,
                args,
            } => self.call(member, method, args),
            PredicateExpr::And(a, b) => Ok(self.translate(a)?.and(self.translate(b)?)),
            PredicateExpr::Or(a, b) => Ok(self.translate(a)?.or(self.translate(b)?)),
            PredicateExpr::Not(inner) => Ok(self.translate(inner)?.negate()),
        }
    }

    fn comparison(&self, left: &Operand, op: Op, right: &Operand) -> Result<Condition, MoorError> {
        match (left, right) {
            (Operand::Member(member), Operand::Literal(value)) => {
                let column = self.catalog.resolve_member(member)?;
                Ok(Condition::compare(column.name, op, value.clone()))
            }
            (Operand::Literal(value), Operand::Member(member)) => {
                let column = self.catalog.resolve_member(member)?;
                if op == Op::Like {
                    return Err(MoorError::TranslationError(format!(
                        "LIKE needs the column `{member}` on the left"
                    )));
                }
                Ok(Condition::compare(column.name, op.mirror(), value.clone()))
            }
            (Operand::Member(a), Operand::Member(b)) => {
                // Resolve first so a typo still reports the unknown column
                self.catalog.resolve_member(a)?;
                self.catalog.resolve_member(b)?;
                Err(MoorError::TranslationError(format!(
                    "cannot compare column `{a}` with column `{b}`"
                )))
            }
            (Operand::Literal(_), Operand::Literal(_)) => Err(MoorError::TranslationError(
                "comparison does not reference a column".to_string(),
            )),
        }
    }

    fn call(&self, member: &str, method: &str, args: &[Value]) -> Result<Condition, MoorError> {
        let column = self.catalog.resolve_member(member)?.name;
        match method {
            "is_null" => {
                expect_args(method, args, 0)?;
                Ok(Condition::is_null(column))
            }
            "is_not_null" => {
                expect_args(method, args, 0)?;
                Ok(Condition::is_not_null(column))
            }
            "is_in" => Ok(Condition::is_in(column, args.iter().cloned())),
            "like" => Ok(Condition::like(column, text_arg(method, args)?)),
            "starts_with" => Ok(Condition::like(
                column,
                format!("{}%", escape_like(text_arg(method, args)?)),
            )),
            "ends_with" => Ok(Condition::like(
                column,
                format!("%{}", escape_like(text_arg(method, args)?)),
            )),
            "contains" => Ok(Condition::like(
                column,
                format!("%{}%", escape_like(text_arg(method, args)?)),
            )),
            other => Err(MoorError::TranslationError(format!(
                "method `{other}` on `{member}` has no SQL equivalent"
            ))),
        }
    }

    /// Resolve a sort key to an `ORDER BY` term
    pub fn order_key<R>(&self, key: &OrderKey<R>) -> Result<OrderBy, MoorError> {
        let column = self.catalog.resolve_member(key.member())?;
        Ok(OrderBy {
            column: column.name.to_string(),
            direction: key.direction(),
        })
    }

    /// Resolve a column-selection expression to its catalog entry
    pub fn column_of(&self, member: &str) -> Result<&'a ColumnDescriptor, MoorError> {
        self.catalog.resolve_member(member)
    }
}

fn expect_args(method: &str, args: &[Value], expected: usize) -> Result<(), MoorError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(MoorError::TranslationError(format!(
            "`{method}` takes {expected} argument(s), got {}",
            args.len()
        )))
    }
}

fn text_arg<'v>(method: &str, args: &'v [Value]) -> Result<&'v str, MoorError> {
    match args {
        [Value::String(Some(s))] => Ok(s.as_str()),
        _ => Err(MoorError::TranslationError(format!(
            "`{method}` takes a single text argument"
        ))),
    }
}

/// Escape LIKE metacharacters so `text` matches literally
pub(crate) fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
