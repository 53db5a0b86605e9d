//! Tests for `#[derive(Record)]`
//!
//! These exercise the generated catalog shape, field handles, dynamic
//! accessors and row materializer without touching a database.

use mooring::{ColumnKind, MoorError, Record, Row, Value};
use mooring::FromRow;

#[derive(Record, Debug, Clone, PartialEq, Default)]
#[table_name = "people"]
struct Person {
    #[primary_key]
    #[auto_increment]
    id: i64,
    name: String,
    #[column_name = "years"]
    age: i32,
    nickname: Option<String>,
    #[skip]
    cached_label: String,
}

#[derive(Record)]
struct LineItem {
    #[primary_key]
    order_id: i32,
    #[primary_key]
    position: i16,
    quantity: i32,
}

#[derive(Record)]
struct AuditEntry {
    message: String,
}

#[test]
fn test_table_name_explicit_and_default() {
    assert_eq!(Person::TABLE, "people");
    assert_eq!(LineItem::TABLE, "line_item");
}

#[test]
fn test_columns_follow_declaration_order() {
    let columns: Vec<_> = Person::COLUMNS.iter().map(|c| c.column).collect();
    assert_eq!(columns, vec!["id", "name", "years", "nickname"]);

    let age = &Person::COLUMNS[2];
    assert_eq!(age.field, "age");
    assert_eq!(age.kind, ColumnKind::Integer);
    assert!(!age.nullable);

    let nickname = &Person::COLUMNS[3];
    assert_eq!(nickname.kind, ColumnKind::Text);
    assert!(nickname.nullable);

    let id = &Person::COLUMNS[0];
    assert!(id.key && id.auto_increment);
}

#[test]
fn test_composite_and_missing_keys() {
    let keys: Vec<_> = LineItem::COLUMNS.iter().filter(|c| c.key).map(|c| c.field).collect();
    assert_eq!(keys, vec!["order_id", "position"]);
    assert!(AuditEntry::COLUMNS.iter().all(|c| !c.key));
}

#[test]
fn test_field_handles_carry_member_names() {
    let f = Person::fields();
    assert_eq!(f.age.member(), "age");
    assert_eq!(f.nickname.member(), "nickname");
}

#[test]
fn test_dynamic_get_and_set() {
    let mut person = Person {
        id: 3,
        name: "Ada".to_string(),
        age: 36,
        nickname: None,
        cached_label: String::new(),
    };
    assert_eq!(person.get("age"), Some(Value::Int(Some(36))));
    assert_eq!(person.get("nickname"), Some(Value::String(None)));
    assert_eq!(person.get("cached_label"), None);

    person.set("nickname", Value::from("Countess")).unwrap();
    assert_eq!(person.nickname.as_deref(), Some("Countess"));

    assert!(matches!(
        person.set("age", Value::from("old")),
        Err(MoorError::ParseError(_))
    ));
    assert!(matches!(
        person.set("no_such_field", Value::Int(Some(1))),
        Err(MoorError::UnknownColumn { .. })
    ));
}

#[test]
fn test_is_new_checks_every_key() {
    assert!(Person::default().is_new());
    let person = Person {
        id: 9,
        ..Person::default()
    };
    assert!(!person.is_new());

    let item = LineItem {
        order_id: 1,
        position: 0,
        quantity: 2,
    };
    assert!(!item.is_new());
}

#[test]
fn test_from_row_reads_by_column_name() {
    let row = Row::from_pairs([
        ("years", Value::Int(Some(41))),
        ("nickname", Value::String(None)),
        ("id", Value::BigInt(Some(5))),
        ("name", Value::from("Grace")),
    ]);
    let person = Person::from_row(&row).unwrap();
    assert_eq!(
        person,
        Person {
            id: 5,
            name: "Grace".to_string(),
            age: 41,
            nickname: None,
            cached_label: String::new(),
        }
    );

    let short = Row::from_pairs([("id", Value::BigInt(Some(5)))]);
    assert!(matches!(Person::from_row(&short), Err(MoorError::ParseError(_))));
}
