//! Integration tests for the fluent query builders against SQLite.

mod common;

use common::TestDatabase;
use namesake::{params, NamesakeError, Value};
use pretty_assertions::assert_eq;

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_filter_order_limit_renders_and_binds_once() {
    let t = TestDatabase::blog();
    let query = t
        .db
        .entity("post")
        .unwrap()
        .select_all()
        .filter("id > :id", params! { "id" => 10 })
        .order_by("id ASC")
        .limit(100);

    let stmt = query.statement().unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT * FROM `post` WHERE (id > :id) ORDER BY id ASC LIMIT 100"
    );
    assert_eq!(stmt.params, params! { "id" => 10 });

    assert!(query.get().unwrap().is_empty());
    assert_eq!(t.log.statements(), vec![stmt]);
}

#[test]
fn test_fragments_are_and_combined() {
    let t = TestDatabase::blog();
    let posts = t
        .db
        .entity("post")
        .unwrap()
        .select_all()
        .filter("views > :min", params! { "min" => 1 })
        .filter("isPublished = :published OR title = :title", params! { "published" => true, "title" => "Second" })
        .order_by("id")
        .get()
        .unwrap();
    assert_eq!(
        t.last_sql(),
        "SELECT * FROM `post` WHERE (views > :min) AND (isPublished = :published OR title = :title) ORDER BY id"
    );
    assert_eq!(posts.values("title"), vec![Value::from("Hello"), Value::from("Second"), Value::from("Third")]);
}

#[test]
fn test_limit_and_offset() {
    let t = TestDatabase::blog();
    let post = t.db.entity("post").unwrap();

    let page = post.select_all().order_by("id").limit(2).offset(1).get().unwrap();
    assert_eq!(t.last_sql(), "SELECT * FROM `post` ORDER BY id LIMIT 1, 2");
    assert_eq!(page.values("id"), vec![Value::Int(2), Value::Int(3)]);

    let tail = post.select_all().order_by("id").offset(3).get().unwrap();
    assert_eq!(t.last_sql(), "SELECT * FROM `post` ORDER BY id LIMIT 3, 9223372036854775807");
    assert_eq!(tail.values("id"), vec![Value::Int(4)]);
}

#[test]
fn test_delete_of_missing_row_affects_nothing() {
    let t = TestDatabase::blog();
    let deleted = t.db.entity("post").unwrap().delete().by_id(23).get().unwrap();
    assert_eq!(t.last_sql(), "DELETE FROM `post` WHERE (id = :id)");
    assert_eq!(deleted, 0);
}

#[test]
fn test_insert_update_delete_cycle() {
    let t = TestDatabase::blog();
    let tag = t.db.entity("tag").unwrap();

    let id = tag.insert().data(params! { "label" => "orm" }).get().unwrap().unwrap();
    assert_eq!(t.last_sql(), "INSERT INTO `tag` (`label`) VALUES (:__v0)");

    let updated = tag.update().by_id(id.clone()).data(params! { "label" => "ORM" }).get().unwrap();
    assert_eq!(updated, 1);
    assert_eq!(t.last_sql(), "UPDATE `tag` SET `label` = :__v0 WHERE (id = :id)");

    let row = tag.get(id.clone()).unwrap().unwrap();
    assert_eq!(row.value("label"), Some(Value::from("ORM")));

    assert_eq!(tag.delete().by_id(id.clone()).get().unwrap(), 1);
    assert!(!tag.has(id).unwrap());
}

#[test]
fn test_count_and_sum_agree_with_rows() {
    let t = TestDatabase::blog();
    let post = t.db.entity("post").unwrap();
    let filter = ("category_id = :c", params! { "c" => 1 });

    let rows = post.select_all().filter(filter.0, filter.1.clone()).get().unwrap();
    let count = post.count().filter(filter.0, filter.1.clone()).get().unwrap();
    let sum = post.sum("views").filter(filter.0, filter.1).get().unwrap();

    assert_eq!(count, rows.len() as i64);
    let expected: i64 = rows.values("views").iter().filter_map(Value::as_i64).sum();
    assert_eq!(sum, Value::Int(expected));
    assert_eq!(t.last_sql(), "SELECT SUM(`views`) FROM `post` WHERE (category_id = :c)");
}

#[test]
fn test_sum_without_rows_is_zero() {
    let t = TestDatabase::empty();
    assert_eq!(t.db.entity("post").unwrap().sum("views").get().unwrap(), Value::Int(0));
    assert_eq!(t.db.entity("post").unwrap().count().get().unwrap(), 0);
}

// ============================================================================
// Binding errors are raised before any round trip
// ============================================================================

#[test]
fn test_missing_binding() {
    let t = TestDatabase::blog();
    t.reset();
    let err = t
        .db
        .entity("post")
        .unwrap()
        .select_all()
        .filter("id = :id", ())
        .get()
        .unwrap_err();
    match err {
        NamesakeError::QueryBinding { table, missing, .. } => {
            assert_eq!(table, "post");
            assert_eq!(missing, vec!["id"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(t.queries(), 0);
}

#[test]
fn test_unused_binding() {
    let t = TestDatabase::blog();
    t.reset();
    let err = t
        .db
        .entity("post")
        .unwrap()
        .count()
        .filter("views > 3", params! { "views" => 3 })
        .get()
        .unwrap_err();
    assert!(matches!(err, NamesakeError::QueryBinding { ref unused, .. } if unused == &["views"]));
    assert_eq!(t.queries(), 0);
}

#[test]
fn test_conflicting_binding() {
    let t = TestDatabase::blog();
    t.reset();
    let err = t
        .db
        .entity("post")
        .unwrap()
        .delete()
        .by_id(1)
        .by_id(2)
        .get()
        .unwrap_err();
    assert!(matches!(err, NamesakeError::QueryBinding { ref conflicting, .. } if conflicting == &["id"]));
    assert_eq!(t.queries(), 0);
    assert!(t.db.entity("post").unwrap().has(1).unwrap());
}

#[test]
fn test_placeholders_in_literals_are_not_bindings() {
    let t = TestDatabase::blog();
    let rows = t
        .db
        .entity("post")
        .unwrap()
        .select_all()
        .filter("title <> ':not_a_param' AND id = :id", params! { "id" => 1 })
        .get()
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_empty_payload_never_executes() {
    let t = TestDatabase::blog();
    t.reset();
    let err = t.db.entity("post").unwrap().insert().get().unwrap_err();
    assert!(matches!(err, NamesakeError::EmptyPayload { .. }));
    assert_eq!(t.queries(), 0);
}

#[test]
fn test_driver_errors_are_wrapped_with_sql() {
    let t = TestDatabase::blog();
    let err = t
        .db
        .entity("post")
        .unwrap()
        .select_all()
        .filter("no_such_column = 1", ())
        .get()
        .unwrap_err();
    assert!(err.is_execution());
    assert!(err.to_string().contains("no_such_column"));
}
