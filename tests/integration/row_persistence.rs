//! Integration tests for writing rows back: save, delete and linking rows
//! through their relationships.

mod common;

use common::{fake_label, fake_title, TestDatabase};
use namesake::{params, Key, NamesakeError, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

fn join_rows(t: &TestDatabase, post: i64, tag: i64) -> i64 {
    t.db.entity("post_tag")
        .unwrap()
        .count()
        .filter(
            "post_id = :post AND tag_id = :tag",
            params! { "post" => post, "tag" => tag },
        )
        .get()
        .unwrap()
}

// ============================================================================
// Save and delete
// ============================================================================

#[test]
fn test_save_inserts_then_updates() {
    let t = TestDatabase::empty();
    let post = t.db.entity("post").unwrap();
    let title = fake_title();

    let row = post
        .create(params! { "title" => title.as_str(), "views" => 3 })
        .unwrap();
    assert!(row.id().is_none());

    row.save().unwrap();
    let id = row.id().expect("id assigned on insert");
    assert_eq!(row.fields().first().map(String::as_str), Some("id"));
    assert_eq!(t.queries(), 1);
    assert!(t.last_sql().starts_with("INSERT INTO `post`"));

    row.set("views", 4);
    row.save().unwrap();
    assert_eq!(t.queries(), 2);
    assert!(t.last_sql().starts_with("UPDATE `post` SET"));

    let stored = post.get(id).unwrap().unwrap();
    assert_eq!(stored.value("title"), Some(Value::from(title)));
    assert_eq!(stored.value("views"), Some(Value::Int(4)));
    assert_eq!(post.count().get().unwrap(), 1);
}

#[test]
fn test_save_encodes_conventional_fields() {
    let t = TestDatabase::empty();
    let post = t.db.entity("post").unwrap();

    let row = post
        .create(params! { "title" => "flags", "isPublished" => "yes" })
        .unwrap();
    assert_eq!(row.value("isPublished"), Some(Value::Bool(true)));
    row.save().unwrap();

    let raw = t
        .db
        .execute("SELECT isPublished FROM post", &Default::default())
        .unwrap();
    assert_eq!(raw.scalar(), Some(&Value::Int(1)));
}

#[test]
fn test_delete_row_and_collection() {
    let t = TestDatabase::blog();
    let comment = t.db.entity("comment").unwrap();

    let first = comment.get(1).unwrap().unwrap();
    assert_eq!(first.delete().unwrap(), 1);
    assert!(!comment.has(1).unwrap());

    let unsaved = comment.create(params! { "body" => "draft" }).unwrap();
    assert!(matches!(
        unsaved.delete(),
        Err(NamesakeError::MissingPrimaryKey { table }) if table == "comment"
    ));

    let rest = comment.select_all().get().unwrap();
    t.reset();
    assert_eq!(rest.delete().unwrap(), 2);
    assert_eq!(t.queries(), 1);
    assert_eq!(comment.count().get().unwrap(), 0);
}

#[test]
fn test_push_requires_saved_rows() {
    let t = TestDatabase::blog();
    let tag = t.db.entity("tag").unwrap();
    let mut tags = tag.select_all().filter_in("id", [1, 2]).get().unwrap();

    let fresh = tag.create(params! { "label" => fake_label() }).unwrap();
    assert!(tags.push(fresh.clone()).is_err());

    fresh.save().unwrap();
    assert!(tags.push(fresh.clone()).unwrap());
    assert!(!tags.push(fresh).unwrap());
    assert_eq!(tags.len(), 3);
}

// ============================================================================
// Relate and unrelate
// ============================================================================

#[test]
fn test_many_to_many_relate_writes_one_join_row() {
    let t = TestDatabase::blog();
    let post = t.db.entity("post").unwrap().get(2).unwrap().unwrap();
    let tag = t.db.entity("tag").unwrap().get(3).unwrap().unwrap();
    t.reset();

    post.relate(&tag).unwrap();
    assert_eq!(t.queries(), 1);
    assert_eq!(join_rows(&t, 2, 3), 1);

    // Either side may start the link
    tag.unrelate(&post).unwrap();
    assert_eq!(join_rows(&t, 2, 3), 0);
    assert_eq!(
        t.db.entity("post_tag").unwrap().count().get().unwrap(),
        3,
        "other links untouched"
    );
}

#[test]
fn test_direct_relate_sets_foreign_key() {
    let t = TestDatabase::blog();
    let orphan = t.db.entity("post").unwrap().get(4).unwrap().unwrap();
    let tech = t.db.entity("category").unwrap().get(2).unwrap().unwrap();

    orphan.relate(&tech).unwrap();
    assert_eq!(orphan.value("category_id"), Some(Value::Int(2)));
    let stored = t.db.entity("post").unwrap().get(4).unwrap().unwrap();
    assert_eq!(stored.value("category_id"), Some(Value::Int(2)));

    orphan.unrelate(&tech).unwrap();
    let stored = t.db.entity("post").unwrap().get(4).unwrap().unwrap();
    assert_eq!(stored.value("category_id"), Some(Value::Null));
}

#[test]
fn test_reverse_relate_saves_the_other_row() {
    let t = TestDatabase::blog();
    let empty = t.db.entity("category").unwrap().get(3).unwrap().unwrap();
    let second = t.db.entity("post").unwrap().get(2).unwrap().unwrap();

    empty.relate(&second).unwrap();
    assert_eq!(second.value("category_id"), Some(Value::Int(3)));

    let fresh = t.db.entity("category").unwrap().get(3).unwrap().unwrap();
    assert_eq!(fresh.related("post").unwrap().len(), 1);
}

#[test]
fn test_relate_unsaved_row_fails() {
    let t = TestDatabase::blog();
    let post = t.db.entity("post").unwrap().get(1).unwrap().unwrap();
    let draft = t.db.entity("tag").unwrap().create(params! { "label" => "draft" }).unwrap();
    t.reset();

    assert!(matches!(
        post.relate(&draft),
        Err(NamesakeError::MissingPrimaryKey { .. })
    ));
    assert_eq!(t.queries(), 0);
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_rows_serialize_as_json() {
    let t = TestDatabase::blog();
    let category = t.db.entity("category").unwrap();

    let news = category.get(1).unwrap().unwrap();
    assert_eq!(news.to_json(), json!({"id": 1, "name": "news"}));
    assert_eq!(serde_json::to_value(&news).unwrap(), news.to_json());

    let all = category.select_all().order_by("id").get().unwrap();
    assert_eq!(
        serde_json::to_value(&all).unwrap(),
        json!([
            {"id": 1, "name": "news"},
            {"id": 2, "name": "tech"},
            {"id": 3, "name": "empty"},
        ])
    );
    assert_eq!(all.keys().cloned().collect::<Vec<_>>(), vec![Key::Int(1), Key::Int(2), Key::Int(3)]);
}

#[test]
fn test_datetime_fields_serialize_as_text() {
    let t = TestDatabase::blog();
    let post = t.db.entity("post").unwrap().get(1).unwrap().unwrap();
    assert_eq!(post.to_json()["pubdate"], json!("2024-01-01 10:00:00"));
    assert_eq!(post.to_json()["isPublished"], json!(true));
}
