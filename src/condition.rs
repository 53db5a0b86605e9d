//! Condition algebra
//!
//! A [`Condition`] is an immutable boolean expression tree over column
//! comparisons. It is the single WHERE representation: typed predicates and
//! dynamic finder names both normalise to it before a statement is built.
//!
//! Leaves compare a column with a literal; literals are never inlined into SQL
//! text. [`Condition::to_sql`] renders the tree with `?` placeholders and a
//! parallel parameter list, and [`Condition::into_sea_condition`] converts it
//! into a `sea_query::Condition` for statement assembly.
//!
//! ```rust
//! use mooring::{Condition, Op};
//!
//! let cond = Condition::compare("name", Op::Eq, "Alice") & Condition::compare("age", Op::Gt, 30);
//! let (sql, params) = cond.to_sql();
//! assert_eq!(sql, r#"("name" = ?) AND ("age" > ?)"#);
//! assert_eq!(params.len(), 2);
//! ```

use crate::value::is_null;
use sea_query::{BinOper, Expr, ExprTrait, Iden, Value};
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// Comparison operator of a condition leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl Op {
    /// SQL spelling of the operator
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Like => "LIKE",
        }
    }

    /// The operator with its operands swapped (`a < b` is `b > a`)
    ///
    /// `Like` has no mirror and is returned unchanged.
    pub fn mirror(self) -> Op {
        match self {
            Op::Lt => Op::Gt,
            Op::Le => Op::Ge,
            Op::Gt => Op::Lt,
            Op::Ge => Op::Le,
            other => other,
        }
    }

    fn bin_oper(self) -> BinOper {
        match self {
            Op::Eq => BinOper::Equal,
            Op::Ne => BinOper::NotEqual,
            Op::Lt => BinOper::SmallerThan,
            Op::Le => BinOper::SmallerThanOrEqual,
            Op::Gt => BinOper::GreaterThan,
            Op::Ge => BinOper::GreaterThanOrEqual,
            Op::Like => BinOper::Like,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Boolean expression tree used as a WHERE clause
///
/// `Empty` matches everything and is the identity of both `and` and `or`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Condition {
    #[default]
    Empty,
    /// `column <op> value`
    Compare { column: String, op: Op, value: Value },
    /// `column IS [NOT] NULL`
    Null { column: String, negated: bool },
    /// `column [NOT] IN (values...)`
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Compare `column` with a literal
    ///
    /// Equality against a NULL literal becomes `IS NULL` (and inequality
    /// `IS NOT NULL`), since `= NULL` never matches.
    pub fn compare(column: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        match op {
            Op::Eq if is_null(&value) => Condition::Null {
                column,
                negated: false,
            },
            Op::Ne if is_null(&value) => Condition::Null {
                column,
                negated: true,
            },
            _ => Condition::Compare { column, op, value },
        }
    }

    /// `column IS NULL`
    pub fn is_null(column: impl Into<String>) -> Self {
        Condition::Null {
            column: column.into(),
            negated: false,
        }
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Condition::Null {
            column: column.into(),
            negated: true,
        }
    }

    /// `column IN (values...)`
    pub fn is_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// `column NOT IN (values...)`
    pub fn not_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    /// `column LIKE pattern`
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Condition::Compare {
            column: column.into(),
            op: Op::Like,
            value: Value::String(Some(pattern.into())),
        }
    }

    /// Both conditions hold; `Empty` on either side yields the other side
    pub fn and(self, other: Condition) -> Self {
        match (self, other) {
            (Condition::Empty, x) | (x, Condition::Empty) => x,
            (a, b) => Condition::And(Box::new(a), Box::new(b)),
        }
    }

    /// Either condition holds; `Empty` on either side yields the other side
    pub fn or(self, other: Condition) -> Self {
        match (self, other) {
            (Condition::Empty, x) | (x, Condition::Empty) => x,
            (a, b) => Condition::Or(Box::new(a), Box::new(b)),
        }
    }

    /// Negation; `!Empty` is `Empty` and a double negation collapses
    pub fn negate(self) -> Self {
        match self {
            Condition::Empty => Condition::Empty,
            Condition::Not(inner) => *inner,
            other => Condition::Not(Box::new(other)),
        }
    }

    /// True for the `Empty` condition
    pub fn is_empty(&self) -> bool {
        matches!(self, Condition::Empty)
    }

    /// True when the tree contains no leaf and so constrains nothing
    pub(crate) fn is_trivial(&self) -> bool {
        match self {
            Condition::Empty => true,
            Condition::And(a, b) | Condition::Or(a, b) => a.is_trivial() && b.is_trivial(),
            Condition::Not(inner) => inner.is_trivial(),
            _ => false,
        }
    }

    /// Render to SQL text with `?` placeholders plus the parameters in
    /// left-to-right order
    ///
    /// `Empty` renders as an empty string with no parameters.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.render(&mut sql, &mut params);
        (sql, params)
    }

    fn render(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            Condition::Empty => {}
            Condition::Compare { column, op, value } => {
                push_ident(sql, column);
                sql.push(' ');
                sql.push_str(op.as_sql());
                sql.push_str(" ?");
                params.push(value.clone());
            }
            Condition::Null { column, negated } => {
                push_ident(sql, column);
                sql.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Condition::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    sql.push_str(if *negated { "1 = 1" } else { "1 = 0" });
                    return;
                }
                push_ident(sql, column);
                sql.push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    sql.push('?');
                    params.push(value.clone());
                }
                sql.push(')');
            }
            Condition::And(a, b) => render_binary(a, b, " AND ", sql, params),
            Condition::Or(a, b) => render_binary(a, b, " OR ", sql, params),
            Condition::Not(inner) => {
                if inner.is_trivial() {
                    return;
                }
                sql.push_str("NOT (");
                inner.render(sql, params);
                sql.push(')');
            }
        }
    }

    /// Convert into a `sea_query::Condition`
    pub fn into_sea_condition(&self) -> sea_query::Condition {
        match self {
            Condition::Empty => sea_query::Condition::all(),
            Condition::Compare { column, op, value } => sea_query::Condition::all()
                .add(Expr::col(SqlIdent::new(column)).binary(op.bin_oper(), value.clone())),
            Condition::Null { column, negated } => {
                let col = Expr::col(SqlIdent::new(column));
                sea_query::Condition::all().add(if *negated {
                    col.is_not_null()
                } else {
                    col.is_null()
                })
            }
            Condition::In {
                column,
                values,
                negated,
            } => {
                let expr = if values.is_empty() {
                    Expr::cust(if *negated { "1 = 1" } else { "1 = 0" })
                } else if *negated {
                    Expr::col(SqlIdent::new(column)).is_not_in(values.clone())
                } else {
                    Expr::col(SqlIdent::new(column)).is_in(values.clone())
                };
                sea_query::Condition::all().add(expr)
            }
            Condition::And(a, b) => {
                let mut cond = sea_query::Condition::all();
                for side in [a, b] {
                    if !side.is_trivial() {
                        cond = cond.add(side.into_sea_condition());
                    }
                }
                cond
            }
            Condition::Or(a, b) => {
                if a.is_trivial() || b.is_trivial() {
                    let side = if a.is_trivial() { b } else { a };
                    return side.into_sea_condition();
                }
                sea_query::Condition::any()
                    .add(a.into_sea_condition())
                    .add(b.into_sea_condition())
            }
            Condition::Not(inner) => {
                if inner.is_trivial() {
                    sea_query::Condition::all()
                } else {
                    inner.into_sea_condition().not()
                }
            }
        }
    }
}

fn render_binary(a: &Condition, b: &Condition, joiner: &str, sql: &mut String, params: &mut Vec<Value>) {
    match (a.is_trivial(), b.is_trivial()) {
        (true, true) => {}
        (true, false) => b.render(sql, params),
        (false, true) => a.render(sql, params),
        (false, false) => {
            sql.push('(');
            a.render(sql, params);
            sql.push(')');
            sql.push_str(joiner);
            sql.push('(');
            b.render(sql, params);
            sql.push(')');
        }
    }
}

fn push_ident(sql: &mut String, ident: &str) {
    sql.push('"');
    sql.push_str(&ident.replace('"', "\"\""));
    sql.push('"');
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql().0)
    }
}

impl sea_query::IntoCondition for Condition {
    fn into_condition(self) -> sea_query::Condition {
        self.into_sea_condition()
    }
}

impl BitAnd for Condition {
    type Output = Condition;

    fn bitand(self, rhs: Condition) -> Condition {
        self.and(rhs)
    }
}

impl BitOr for Condition {
    type Output = Condition;

    fn bitor(self, rhs: Condition) -> Condition {
        self.or(rhs)
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        self.negate()
    }
}

/// Runtime SQL identifier for sea-query statements
#[derive(Debug, Clone)]
pub(crate) struct SqlIdent(String);

impl SqlIdent {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Iden for SqlIdent {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{ConditionalStatement, PostgresQueryBuilder, Query};

    fn name_is_alice() -> Condition {
        Condition::compare("name", Op::Eq, "Alice")
    }

    fn age_over_30() -> Condition {
        Condition::compare("age", Op::Gt, 30)
    }

    #[test]
    fn test_leaf_renders_placeholder() {
        let (sql, params) = name_is_alice().to_sql();
        assert_eq!(sql, r#""name" = ?"#);
        assert_eq!(params, vec![Value::String(Some("Alice".to_string()))]);
    }

    #[test]
    fn test_and_wraps_both_sides_in_order() {
        let a = name_is_alice();
        let b = age_over_30();
        let (sa, pa) = a.to_sql();
        let (sb, pb) = b.to_sql();

        let (sql, params) = a.and(b).to_sql();
        assert_eq!(sql, format!("({sa}) AND ({sb})"));
        assert_eq!(params, [pa, pb].concat());
    }

    #[test]
    fn test_nested_or_keeps_precedence() {
        let cond = name_is_alice() | (age_over_30() & Condition::compare("age", Op::Lt, 40));
        let (sql, params) = cond.to_sql();
        assert_eq!(
            sql,
            r#"("name" = ?) OR (("age" > ?) AND ("age" < ?))"#
        );
        assert_eq!(params.len(), 3);
        assert_eq!(params[2], Value::Int(Some(40)));
    }

    #[test]
    fn test_empty_is_identity() {
        let x = age_over_30();
        assert_eq!(Condition::Empty.and(x.clone()), x);
        assert_eq!(x.clone().and(Condition::Empty), x);
        assert_eq!(Condition::Empty.or(x.clone()), x);
        assert_eq!(Condition::Empty.and(x.clone()).to_sql(), x.to_sql());
        assert_eq!(Condition::Empty.to_sql(), (String::new(), vec![]));
    }

    #[test]
    fn test_hand_built_empty_children_are_skipped() {
        let cond = Condition::And(Box::new(Condition::Empty), Box::new(age_over_30()));
        assert_eq!(cond.to_sql(), age_over_30().to_sql());
    }

    fn without_parens(sql: &str) -> String {
        sql.chars().filter(|c| *c != '(' && *c != ')').collect()
    }

    #[test]
    fn test_and_is_associative_in_meaning() {
        let c = Condition::compare("id", Op::Ne, 1);
        let (left_sql, left_params) = name_is_alice().and(age_over_30()).and(c.clone()).to_sql();
        let (right_sql, right_params) = name_is_alice().and(age_over_30().and(c)).to_sql();
        assert_eq!(left_sql, r#"(("name" = ?) AND ("age" > ?)) AND ("id" <> ?)"#);
        assert_eq!(right_sql, r#"("name" = ?) AND (("age" > ?) AND ("id" <> ?))"#);
        assert_eq!(without_parens(&left_sql), without_parens(&right_sql));
        assert_eq!(left_params, right_params);
    }

    #[test]
    fn test_or_is_associative_in_meaning() {
        let c = Condition::compare("id", Op::Ne, 1);
        let (left_sql, left_params) = name_is_alice().or(age_over_30()).or(c.clone()).to_sql();
        let (right_sql, right_params) = name_is_alice().or(age_over_30().or(c)).to_sql();
        assert_eq!(left_sql, r#"(("name" = ?) OR ("age" > ?)) OR ("id" <> ?)"#);
        assert_eq!(right_sql, r#"("name" = ?) OR (("age" > ?) OR ("id" <> ?))"#);
        assert_eq!(without_parens(&left_sql), without_parens(&right_sql));
        assert_eq!(
            left_params,
            vec![Value::from("Alice"), Value::Int(Some(30)), Value::Int(Some(1))]
        );
        assert_eq!(left_params, right_params);
    }

    #[test]
    fn test_double_negation_collapses() {
        let x = name_is_alice();
        assert_eq!(!!x.clone(), x);
        assert_eq!(!Condition::Empty, Condition::Empty);
        assert_eq!((!x).to_sql().0, r#"NOT ("name" = ?)"#);
    }

    #[test]
    fn test_null_literal_becomes_is_null() {
        let cond = Condition::compare("email", Op::Eq, Value::String(None));
        assert_eq!(cond.to_sql(), (r#""email" IS NULL"#.to_string(), vec![]));
        let cond = Condition::compare("email", Op::Ne, Option::<String>::None);
        assert_eq!(cond.to_sql().0, r#""email" IS NOT NULL"#);
    }

    #[test]
    fn test_in_lists() {
        let (sql, params) = Condition::is_in("id", [1, 2, 3]).to_sql();
        assert_eq!(sql, r#""id" IN (?, ?, ?)"#);
        assert_eq!(params.len(), 3);
        assert_eq!(Condition::is_in("id", Vec::<i32>::new()).to_sql().0, "1 = 0");
        assert_eq!(Condition::not_in("id", Vec::<i32>::new()).to_sql().0, "1 = 1");
    }

    #[test]
    fn test_identifier_quotes_are_escaped() {
        let (sql, _) = Condition::compare("we\"ird", Op::Eq, 1).to_sql();
        assert_eq!(sql, r#""we""ird" = ?"#);
    }

    #[test]
    fn test_literal_never_inlined() {
        let evil = "x'; DROP TABLE users; --";
        let (sql, params) = Condition::compare("name", Op::Eq, evil).to_sql();
        assert!(!sql.contains("DROP"));
        assert_eq!(params, vec![Value::from(evil)]);
    }

    #[test]
    fn test_sea_condition_binds_values() {
        let cond = name_is_alice() & age_over_30();
        let (sql, values) = Query::select()
            .column(SqlIdent::new("id"))
            .from(SqlIdent::new("users"))
            .cond_where(cond)
            .build(PostgresQueryBuilder);
        assert!(sql.contains(r#""name" = $1"#), "{sql}");
        assert!(sql.contains(r#""age" > $2"#), "{sql}");
        assert_eq!(values.0.len(), 2);
    }

    #[test]
    fn test_op_mirror() {
        assert_eq!(Op::Lt.mirror(), Op::Gt);
        assert_eq!(Op::Ge.mirror(), Op::Le);
        assert_eq!(Op::Eq.mirror(), Op::Eq);
    }
}
