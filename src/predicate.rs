//! Typed predicates over record fields
//!
//! `#[derive(Record)]` generates a `<Name>Fields` struct whose members are
//! [`Field`] handles. Calling comparison methods on a handle builds a
//! [`Predicate`], a small untyped AST ([`PredicateExpr`]) tagged with the
//! record type so predicates over different records cannot be combined.
//! [`crate::PredicateTranslator`] walks the AST once into a
//! [`crate::Condition`].
//!
//! ```rust
//! use mooring::Record;
//!
//! #[derive(Record)]
//! struct User {
//!     #[primary_key]
//!     id: i64,
//!     name: String,
//!     age: i32,
//!     active: bool,
//! }
//!
//! let u = User::fields();
//! let adults_named_al = u.name.starts_with("Al") & u.age.ge(18) & u.active.is_true();
//! let _newest_first = u.id.desc();
//! # let _ = adults_named_al;
//! ```

use crate::condition::Op;
use crate::query::Direction;
use crate::value::{TextValue, ValueType};
use sea_query::Value;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{BitAnd, BitOr, Not};

/// One side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A record member, by Rust name
    Member(String),
    /// A concrete value
    Literal(Value),
}

impl Operand {
    pub fn member(name: impl Into<String>) -> Self {
        Operand::Member(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Operand::Literal(value.into())
    }
}

impl<R, T> From<Field<R, T>> for Operand {
    fn from(field: Field<R, T>) -> Self {
        Operand::Member(field.member().to_string())
    }
}

/// Untyped predicate syntax tree
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateExpr {
    /// `left <op> right`
    Compare {
        left: Operand,
        op: Op,
        right: Operand,
    },
    /// Bare member access: a boolean column in a filter
    Member(String),
    /// Method call on a member, e.g. `name.starts_with("Al")`
    Call {
        member: String,
        method: String,
        args: Vec<Value>,
    },
    And(Box<PredicateExpr>, Box<PredicateExpr>),
    Or(Box<PredicateExpr>, Box<PredicateExpr>),
    Not(Box<PredicateExpr>),
}

impl PredicateExpr {
    pub fn compare(left: Operand, op: Op, right: Operand) -> Self {
        PredicateExpr::Compare { left, op, right }
    }

    pub fn call(member: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
        PredicateExpr::Call {
            member: member.into(),
            method: method.into(),
            args,
        }
    }
}

/// A predicate over records of type `R`
pub struct Predicate<R> {
    expr: PredicateExpr,
    _record: PhantomData<fn(&R)>,
}

impl<R> Predicate<R> {
    /// Wrap an untyped expression
    pub fn from_expr(expr: PredicateExpr) -> Self {
        Self {
            expr,
            _record: PhantomData,
        }
    }

    /// `left <op> right`, with either side a member or a literal
    pub fn compare(left: impl Into<Operand>, op: Op, right: impl Into<Operand>) -> Self {
        Self::from_expr(PredicateExpr::compare(left.into(), op, right.into()))
    }

    pub fn expr(&self) -> &PredicateExpr {
        &self.expr
    }

    pub fn into_expr(self) -> PredicateExpr {
        self.expr
    }
}

impl<R> Clone for Predicate<R> {
    fn clone(&self) -> Self {
        Self::from_expr(self.expr.clone())
    }
}

impl<R> fmt::Debug for Predicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.expr).finish()
    }
}

impl<R> PartialEq for Predicate<R> {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

impl<R> BitAnd for Predicate<R> {
    type Output = Predicate<R>;

    fn bitand(self, rhs: Predicate<R>) -> Predicate<R> {
        Predicate::from_expr(PredicateExpr::And(Box::new(self.expr), Box::new(rhs.expr)))
    }
}

impl<R> BitOr for Predicate<R> {
    type Output = Predicate<R>;

    fn bitor(self, rhs: Predicate<R>) -> Predicate<R> {
        Predicate::from_expr(PredicateExpr::Or(Box::new(self.expr), Box::new(rhs.expr)))
    }
}

impl<R> Not for Predicate<R> {
    type Output = Predicate<R>;

    fn not(self) -> Predicate<R> {
        Predicate::from_expr(PredicateExpr::Not(Box::new(self.expr)))
    }
}

/// Sort key over a record member
pub struct OrderKey<R> {
    member: &'static str,
    direction: Direction,
    _record: PhantomData<fn(&R)>,
}

impl<R> OrderKey<R> {
    pub fn new(member: &'static str, direction: Direction) -> Self {
        Self {
            member,
            direction,
            _record: PhantomData,
        }
    }

    pub fn member(&self) -> &'static str {
        self.member
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl<R> Clone for OrderKey<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for OrderKey<R> {}

impl<R> fmt::Debug for OrderKey<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderKey")
            .field("member", &self.member)
            .field("direction", &self.direction)
            .finish()
    }
}

/// Typed handle on member `T` of record `R`
pub struct Field<R, T> {
    member: &'static str,
    _marker: PhantomData<fn(&R) -> T>,
}

impl<R, T> Clone for Field<R, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, T> Copy for Field<R, T> {}

impl<R, T> fmt::Debug for Field<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.member).finish()
    }
}

impl<R, T> Field<R, T> {
    pub const fn new(member: &'static str) -> Self {
        Self {
            member,
            _marker: PhantomData,
        }
    }

    /// Rust member name
    pub fn member(&self) -> &'static str {
        self.member
    }

    pub fn asc(self) -> OrderKey<R> {
        OrderKey::new(self.member, Direction::Asc)
    }

    pub fn desc(self) -> OrderKey<R> {
        OrderKey::new(self.member, Direction::Desc)
    }

    pub fn is_null(self) -> Predicate<R> {
        self.call("is_null", Vec::new())
    }

    pub fn is_not_null(self) -> Predicate<R> {
        self.call("is_not_null", Vec::new())
    }

    fn call(self, method: &str, args: Vec<Value>) -> Predicate<R> {
        Predicate::from_expr(PredicateExpr::call(self.member, method, args))
    }
}

impl<R, T: ValueType> Field<R, T> {
    fn compare(self, op: Op, value: impl Into<T>) -> Predicate<R> {
        Predicate::from_expr(PredicateExpr::compare(
            Operand::member(self.member),
            op,
            Operand::Literal(value.into().into_value()),
        ))
    }

    pub fn eq(self, value: impl Into<T>) -> Predicate<R> {
        self.compare(Op::Eq, value)
    }

    pub fn ne(self, value: impl Into<T>) -> Predicate<R> {
        self.compare(Op::Ne, value)
    }

    pub fn lt(self, value: impl Into<T>) -> Predicate<R> {
        self.compare(Op::Lt, value)
    }

    pub fn le(self, value: impl Into<T>) -> Predicate<R> {
        self.compare(Op::Le, value)
    }

    pub fn gt(self, value: impl Into<T>) -> Predicate<R> {
        self.compare(Op::Gt, value)
    }

    pub fn ge(self, value: impl Into<T>) -> Predicate<R> {
        self.compare(Op::Ge, value)
    }

    pub fn is_in<I, V>(self, values: I) -> Predicate<R>
    where
        I: IntoIterator<Item = V>,
        V: Into<T>,
    {
        let args = values.into_iter().map(|v| v.into().into_value()).collect();
        self.call("is_in", args)
    }
}

impl<R, T: TextValue> Field<R, T> {
    /// Raw `LIKE` pattern; `%` and `_` keep their wildcard meaning
    pub fn like(self, pattern: impl Into<String>) -> Predicate<R> {
        self.call("like", vec![Value::String(Some(pattern.into()))])
    }

    pub fn starts_with(self, prefix: impl Into<String>) -> Predicate<R> {
        self.call("starts_with", vec![Value::String(Some(prefix.into()))])
    }

    pub fn ends_with(self, suffix: impl Into<String>) -> Predicate<R> {
        self.call("ends_with", vec![Value::String(Some(suffix.into()))])
    }

    pub fn contains(self, needle: impl Into<String>) -> Predicate<R> {
        self.call("contains", vec![Value::String(Some(needle.into()))])
    }
}

impl<R> Field<R, bool> {
    pub fn is_true(self) -> Predicate<R> {
        Predicate::from_expr(PredicateExpr::Member(self.member.to_string()))
    }

    pub fn is_false(self) -> Predicate<R> {
        !self.is_true()
    }
}
