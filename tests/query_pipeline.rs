//! Query construction and execution against the recording mock provider

use mooring::mock::{MockProvider, StatementKind};
use mooring::{
    Condition, Direction, Model, ModelRegistry, MoorError, Op, Operand, Patch, Predicate,
    PredicateExpr, Record, Row, Value,
};
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Record, Debug, Clone, PartialEq)]
#[table_name = "users"]
pub struct User {
    #[primary_key]
    #[auto_increment]
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub email: Option<String>,
}

#[derive(Record, Debug)]
#[table_name = "line_items"]
pub struct LineItem {
    #[primary_key]
    pub order_id: i64,
    #[primary_key]
    pub position: i32,
}

fn setup() -> (Arc<MockProvider>, ModelRegistry) {
    let mock = Arc::new(MockProvider::new());
    let registry = ModelRegistry::new(mock.clone());
    (mock, registry)
}

fn user_row(id: i64, name: &str, age: i32) -> Row {
    Row::from_pairs([
        ("id", Value::BigInt(Some(id))),
        ("name", Value::from(name)),
        ("age", Value::Int(Some(age))),
        ("email", Value::String(None)),
    ])
}

#[test]
fn test_and_renders_both_sides_in_parameter_order() {
    let a = Condition::compare("name", Op::Eq, "Alice");
    let b = Condition::compare("age", Op::Gt, 30);
    let (sql, params) = a.clone().and(b.clone()).to_sql();
    assert_eq!(sql, format!("({}) AND ({})", a.to_sql().0, b.to_sql().0));
    assert_eq!(params, vec![Value::from("Alice"), Value::Int(Some(30))]);

    let x = Condition::compare("age", Op::Le, 65);
    assert_eq!(Condition::Empty.and(x.clone()).to_sql(), x.to_sql());
}

#[test]
fn test_predicate_dynamic_name_and_explicit_build_agree() {
    let (_, registry) = setup();
    let explicit = Condition::compare("name", Op::Eq, "Alice").and(Condition::compare("age", Op::Gt, 30));

    let translated = User::parse(&registry, |u| u.name.eq("Alice") & u.age.gt(30)).unwrap();
    assert_eq!(translated, explicit);

    let equality = Condition::compare("name", Op::Eq, "Alice").and(Condition::compare("age", Op::Eq, 30));
    let dynamic = User::parse_name(&registry, "NameAndAge", vec![Value::from("Alice"), Value::from(30)]).unwrap();
    assert_eq!(dynamic, equality);
    assert_eq!(
        User::parse(&registry, |u| u.name.eq("Alice") & u.age.eq(30)).unwrap(),
        dynamic
    );
}

#[test]
fn test_unknown_column_from_predicate_and_dynamic_name() {
    let (mock, registry) = setup();

    let result = User::find_where(&registry, |_| {
        Predicate::from_expr(PredicateExpr::compare(
            Operand::member("no_such_field"),
            Op::Eq,
            Operand::literal(1),
        ))
    });
    assert!(matches!(result, Err(MoorError::UnknownColumn { .. })));

    let result = User::find_by(&registry, "NoSuchField", vec![Value::from(1)]);
    match result {
        Err(MoorError::UnknownColumn { column, .. }) => assert_eq!(column, "NoSuchField"),
        other => panic!("expected UnknownColumn, got {other:?}"),
    }

    let result = User::find_by(&registry, "NameAndAge", vec![Value::from("Alice")]);
    assert!(matches!(
        result,
        Err(MoorError::ArityMismatch { expected: 2, actual: 1 })
    ));

    assert_eq!(mock.statement_count(), 0);
}

#[test]
fn test_first_row_by_ascending_key() {
    let (mock, registry) = setup();
    mock.push_rows(vec![user_row(1, "Ada", 36)]);

    let users = User::query(&registry)
        .unwrap()
        .order_by(User::fields().id.asc())
        .range(1, 1)
        .select()
        .unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, 1);

    let statement = mock.last_statement().unwrap();
    assert_eq!(statement.kind, StatementKind::Query);
    assert_eq!(
        statement.sql,
        r#"SELECT "id", "name", "age", "email" FROM "users" ORDER BY "id" ASC LIMIT $1"#
    );
    assert_eq!(statement.params, vec![Value::BigUnsigned(Some(1))]);
}

#[test]
fn test_zero_count_range_runs_nothing() {
    let (mock, registry) = setup();
    let users = User::query(&registry).unwrap().range(1, 0).select().unwrap();
    assert!(users.is_empty());
    assert_eq!(mock.statement_count(), 0);
}

#[test]
fn test_range_offset_is_one_based() {
    let (mock, registry) = setup();
    User::query(&registry)
        .unwrap()
        .filter(Condition::compare("age", Op::Gt, 20))
        .range(11, 10)
        .select()
        .unwrap();
    let statement = mock.last_statement().unwrap();
    assert!(statement.sql.ends_with("LIMIT $2 OFFSET $3"));
    assert_eq!(
        statement.params,
        vec![
            Value::Int(Some(20)),
            Value::BigUnsigned(Some(10)),
            Value::BigUnsigned(Some(10)),
        ]
    );

    User::query(&registry).unwrap().range(2, 1).select().unwrap();
    assert_eq!(
        mock.last_statement().unwrap().params,
        vec![Value::BigUnsigned(Some(1)), Value::BigUnsigned(Some(1))]
    );

    let (_, window_registry) = setup();
    let pipeline = User::query(&window_registry).unwrap().range(11, 10);
    let window = pipeline.window().unwrap();
    assert_eq!((window.offset(), window.count(), window.skip()), (11, 10, 10));
}

#[test]
fn test_invalid_range_is_reported_at_the_terminal() {
    let (mock, registry) = setup();
    for (offset, count) in [(0, 1), (-1, 5), (1, -1)] {
        let result = User::query(&registry).unwrap().range(offset, count).select();
        assert!(matches!(result, Err(MoorError::InvalidRange { .. })));
    }
    assert_eq!(mock.statement_count(), 0);
}

#[test]
fn test_find_one_not_found_is_none() {
    let (mock, registry) = setup();
    let found = User::find_one(&registry, Condition::compare("name", Op::Eq, "Nobody")).unwrap();
    assert!(found.is_none());

    let sql = mock.last_statement().unwrap().sql;
    assert!(sql.contains(r#"WHERE "name" = $1"#));
    assert!(sql.contains(r#"ORDER BY "id" ASC"#));
}

#[test]
fn test_find_by_id() {
    let (mock, registry) = setup();
    mock.push_rows(vec![user_row(7, "Grace", 41)]);
    let user = User::find_by_id(&registry, 7i64).unwrap().unwrap();
    assert_eq!(user.name, "Grace");
    assert_eq!(mock.last_statement().unwrap().params[0], Value::BigInt(Some(7)));

    let result = LineItem::find_by_id(&registry, 1i64);
    assert!(matches!(result, Err(MoorError::SchemaError { .. })));
}

#[test]
fn test_find_recent_orders_by_key_descending() {
    let (mock, registry) = setup();
    mock.push_rows(vec![user_row(9, "Linus", 50), user_row(8, "Ken", 70)]);
    let recent = User::find_recent(&registry, 2).unwrap();
    assert_eq!(recent.iter().map(|u| u.id).collect::<Vec<_>>(), vec![9, 8]);
    assert!(mock
        .last_statement()
        .unwrap()
        .sql
        .contains(r#"ORDER BY "id" DESC LIMIT"#));
}

#[test]
fn test_chained_filters_and_together() {
    let (mock, registry) = setup();
    User::query(&registry)
        .unwrap()
        .filter(Condition::compare("age", Op::Ge, 18))
        .filter_by(|u| u.name.starts_with("A") | u.email.is_null())
        .order_by_name("name", Direction::Desc)
        .select()
        .unwrap();

    let statement = mock.last_statement().unwrap();
    assert!(statement.sql.contains(r#""age" >= $1 AND"#));
    assert!(statement.sql.contains(r#""name" LIKE $2"#));
    assert!(statement.sql.contains(r#""email" IS NULL"#));
    assert!(statement.sql.contains(r#"ORDER BY "name" DESC"#));
    assert_eq!(statement.params[0], Value::Int(Some(18)));
    assert_eq!(statement.params[1], Value::from("A%"));
}

#[test]
fn test_aggregates_distinguish_no_value_from_zero() {
    let (mock, registry) = setup();
    mock.push_rows(vec![Row::from_pairs([("max", Value::Int(None))])]);
    let max = User::max(&registry, Condition::compare("age", Op::Gt, 200), |u| u.age).unwrap();
    assert_eq!(max, None);

    mock.push_rows(vec![Row::from_pairs([("sum", Value::BigInt(Some(0)))])]);
    let sum = User::sum(&registry, Condition::Empty, |u| u.age).unwrap();
    assert_eq!(sum, Some(Decimal::ZERO));

    mock.push_rows(vec![Row::from_pairs([("min", Value::Int(Some(18)))])]);
    let min = User::min(&registry, Condition::Empty, |u| u.age).unwrap();
    assert_eq!(min, Some(Decimal::from(18)));

    let sql = mock.statements()[0].sql.clone();
    assert!(sql.starts_with(r#"SELECT MAX("age") FROM "users" WHERE "age" > $1"#));
}

#[test]
fn test_count() {
    let (mock, registry) = setup();
    mock.push_rows(vec![Row::from_pairs([("count", Value::BigInt(Some(3)))])]);
    assert_eq!(User::count_where(&registry, Condition::is_not_null("email")).unwrap(), 3);
    assert_eq!(
        mock.last_statement().unwrap().sql,
        r#"SELECT COUNT(*) FROM "users" WHERE "email" IS NOT NULL"#
    );
    assert_eq!(User::count(&registry).unwrap(), 0);
}

#[test]
fn test_bulk_delete_and_update() {
    let (mock, registry) = setup();
    mock.push_affected(4);
    mock.push_affected(2);

    let deleted = User::delete_where(&registry, |u| u.age.lt(18)).unwrap();
    assert_eq!(deleted, 4);
    assert_eq!(
        mock.last_statement().unwrap().sql,
        r#"DELETE FROM "users" WHERE "age" < $1"#
    );

    let f = User::fields();
    let patch = Patch::new().set(f.email, None::<String>).set(f.name, "anon");
    let updated = User::update_by(&registry, Condition::compare("age", Op::Gt, 99), patch).unwrap();
    assert_eq!(updated, 2);
    let statement = mock.last_statement().unwrap();
    assert_eq!(
        statement.sql,
        r#"UPDATE "users" SET "email" = $1, "name" = $2 WHERE "age" > $3"#
    );
    assert_eq!(statement.params[0], Value::String(None));

    let before = mock.statement_count();
    let nothing = User::update_by(&registry, Condition::Empty, Patch::new()).unwrap();
    assert_eq!(nothing, 0);
    assert_eq!(mock.statement_count(), before);
}

#[test]
fn test_provider_errors_propagate_unchanged() {
    let (mock, registry) = setup();
    mock.push_query_error(MoorError::Other("connection reset".to_string()));
    match User::find(&registry, Condition::Empty) {
        Err(MoorError::Other(msg)) => assert_eq!(msg, "connection reset"),
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[test]
fn test_schema_changes() {
    let (mock, registry) = setup();
    User::add_column(&registry, |u| u.email, None).unwrap();
    User::drop_column(&registry, "email").unwrap();

    let statements = mock.statements();
    assert_eq!(
        statements[0].sql,
        r#"ALTER TABLE "users" ADD COLUMN "email" text NULL"#
    );
    assert_eq!(statements[1].sql, r#"ALTER TABLE "users" DROP COLUMN "email""#);
}

#[test]
fn test_find_by_sql() {
    let (mock, registry) = setup();
    mock.push_rows(vec![user_row(2, "Barbara", 60)]);
    let users = User::find_by_sql(
        &registry,
        "SELECT * FROM users WHERE age > $1",
        &[Value::from(50)],
    )
    .unwrap();
    assert_eq!(users[0].name, "Barbara");
    assert_eq!(mock.last_statement().unwrap().sql, "SELECT * FROM users WHERE age > $1");
}

#[test]
fn test_aggregates_by_column_name() {
    let (mock, registry) = setup();
    mock.push_rows(vec![Row::from_pairs([("max", Value::Int(Some(64)))])]);
    let max = User::max_by_name(&registry, Condition::compare("name", Op::Ne, "Bob"), "age").unwrap();
    assert_eq!(max, Some(Decimal::from(64)));
    assert_eq!(
        mock.last_statement().unwrap().sql,
        r#"SELECT MAX("age") FROM "users" WHERE "name" <> $1"#
    );

    let result = User::sum_by_name(&registry, Condition::Empty, "salary");
    assert!(matches!(result, Err(MoorError::UnknownColumn { .. })));
    assert_eq!(mock.statement_count(), 1);
}

#[test]
fn test_builder_error_keeps_its_variant() {
    let (mock, registry) = setup();
    let pipeline = User::query(&registry).unwrap().range(0, 5).order_by_name("nope", Direction::Asc);
    assert!(matches!(
        pipeline.error(),
        Some(MoorError::InvalidRange { offset: 0, count: 5 })
    ));
    assert!(matches!(pipeline.build(), Err(MoorError::QueryError(_))));
    assert!(matches!(
        pipeline.select(),
        Err(MoorError::InvalidRange { .. })
    ));
    assert_eq!(mock.statement_count(), 0);

    let pipeline = User::query(&registry).unwrap().order_by_name("nope", Direction::Asc);
    assert!(matches!(pipeline.error(), Some(MoorError::UnknownColumn { .. })));
    assert!(User::query(&registry).unwrap().error().is_none());
}
