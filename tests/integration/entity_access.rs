//! Integration tests for entities: field descriptors, keyed access, row
//! creation, resolvers and the entity cache.

mod common;

use chrono::NaiveDate;
use common::TestDatabase;
use namesake::codec::FnCodec;
use namesake::{
    params, Database, EntityBehavior, NamesakeError, RecordingExecutor, SqliteExecutor, Value,
};
use pretty_assertions::assert_eq;
use std::rc::Rc;

// ============================================================================
// Field descriptors
// ============================================================================

#[test]
fn test_field_kinds() {
    let t = TestDatabase::blog();
    let comment = t.db.entity("comment").unwrap();
    let fields = comment.fields().unwrap();
    let kinds: Vec<(&str, &str)> = fields.iter().map(|f| (f.name.as_str(), f.kind())).collect();
    assert_eq!(
        kinds,
        vec![
            ("id", "integer"),
            ("post_id", "integer"),
            ("body", "identity"),
            ("createdAt", "datetime"),
        ]
    );
}

#[test]
fn test_fetched_rows_are_decoded() {
    let t = TestDatabase::blog();
    let post = t.db.entity("post").unwrap().get(1).unwrap().unwrap();
    assert_eq!(post.value("isPublished"), Some(Value::Bool(true)));
    assert_eq!(
        post.value("pubdate"),
        Some(Value::DateTime(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap()
        ))
    );

    let orphan = t.db.entity("post").unwrap().get(4).unwrap().unwrap();
    assert_eq!(orphan.value("pubdate"), Some(Value::Null));
    assert_eq!(orphan.value("category_id"), Some(Value::Null));
}

// ============================================================================
// Keyed access
// ============================================================================

#[test]
fn test_get_has_unset() {
    let t = TestDatabase::blog();
    let category = t.db.entity("category").unwrap();

    assert_eq!(
        category.get(2).unwrap().and_then(|c| c.value("name")),
        Some(Value::from("tech"))
    );
    assert!(category.get(99).unwrap().is_none());
    assert!(category.has(3).unwrap());

    assert_eq!(category.unset(3).unwrap(), 1);
    assert!(!category.has(3).unwrap());
    assert_eq!(category.unset(3).unwrap(), 0);
}

#[test]
fn test_set_inserts_then_updates() {
    let t = TestDatabase::blog();
    let category = t.db.entity("category").unwrap();

    let created = category.set(Value::Null, params! { "name" => "science" }).unwrap();
    let id = created.id().expect("generated id");
    assert_eq!(category.count().get().unwrap(), 4);

    let updated = category.set(id.clone(), params! { "name" => "Science" }).unwrap();
    assert_eq!(updated.id(), Some(id));
    assert_eq!(updated.value("name"), Some(Value::from("Science")));
    assert_eq!(category.count().get().unwrap(), 4);

    let explicit = category.set(40, params! { "name" => "forty" }).unwrap();
    assert_eq!(explicit.id(), Some(Value::Int(40)));
    assert_eq!(category.count().get().unwrap(), 5);
}

#[test]
fn test_create_matches_fetched_shape() {
    let t = TestDatabase::blog();
    let post = t.db.entity("post").unwrap();
    let data = params! {
        "title" => "Draft",
        "pubdate" => "2024-05-06 07:08:09",
        "isPublished" => "false",
        "category_id" => 2,
    };

    let unsaved = post.create(data.clone()).unwrap();
    assert!(unsaved.id().is_none());
    assert_eq!(t.queries(), 0);

    let id = post.insert().data(data).get().unwrap().unwrap();
    let fetched = post.get(id).unwrap().unwrap();
    for field in ["title", "pubdate", "isPublished", "category_id"] {
        assert_eq!(unsaved.value(field), fetched.value(field), "field {field}");
    }
}

// ============================================================================
// Resolvers, attributes and the entity cache
// ============================================================================

fn customised() -> (Database, Rc<RecordingExecutor<SqliteExecutor>>) {
    let sqlite = SqliteExecutor::open_in_memory().unwrap();
    sqlite
        .execute_batch(&format!("{}{}", common::SCHEMA, common::SEED))
        .unwrap();
    let log = Rc::new(RecordingExecutor::new(sqlite));
    let db = Database::builder(Rc::clone(&log))
        .introspector(Rc::clone(&log))
        .resolver(|name| {
            (name == "post").then(|| {
                EntityBehavior::new()
                    .codec(
                        "title",
                        FnCodec::new(
                            "title",
                            |v| Ok(Value::from(v.as_str().unwrap_or_default().to_lowercase())),
                            Ok,
                        ),
                    )
                    .computed("headline", |row| {
                        let title = row.value("title").unwrap_or_default();
                        let locale = row.attribute("locale").unwrap_or_else(|| Value::from("en"));
                        Ok(Value::from(format!(
                            "[{}] {}",
                            locale.as_str().unwrap_or_default(),
                            title.as_str().unwrap_or_default()
                        )))
                    })
            })
        })
        .attribute("locale", "en")
        .build();
    (db, log)
}

#[test]
fn test_resolver_behaviour_applies() {
    let (db, _log) = customised();
    let post = db.entity("post").unwrap();

    let id = post.insert().data(params! { "title" => "LOUD" }).get().unwrap().unwrap();
    let row = post.get(id).unwrap().unwrap();
    assert_eq!(row.value("title"), Some(Value::from("loud")));

    assert_eq!(
        row.get("headline").unwrap().into_value(),
        Some(Value::from("[en] loud"))
    );
    db.set_attribute("locale", "fr");
    assert_eq!(
        row.get("headline").unwrap().into_value(),
        Some(Value::from("[fr] loud"))
    );

    // Other tables keep the default behaviour
    let tag = db.entity("tag").unwrap().get(1).unwrap().unwrap();
    assert!(tag.get("headline").is_err());
}

#[test]
fn test_unknown_entity() {
    let t = TestDatabase::blog();
    assert!(matches!(
        t.db.entity("author"),
        Err(NamesakeError::EntityNotFound(name)) if name == "author"
    ));
}

#[test]
fn test_clear_cache_does_not_change_results() {
    let t = TestDatabase::blog();
    let before: Vec<_> = t
        .db
        .entity("post")
        .unwrap()
        .select_all()
        .get()
        .unwrap()
        .iter()
        .map(|row| row.to_json())
        .collect();

    t.db.clear_cache();

    let after: Vec<_> = t
        .db
        .entity("post")
        .unwrap()
        .select_all()
        .get()
        .unwrap()
        .iter()
        .map(|row| row.to_json())
        .collect();
    assert_eq!(before, after);
}
