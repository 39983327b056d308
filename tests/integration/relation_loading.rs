//! Integration tests for relationship inference and batched relation
//! loading: one query per relation per collection, memoized per row.

mod common;

use common::TestDatabase;
use namesake::{params, Key, NamesakeError, RelationKind, Row, RowCollection, Value};
use pretty_assertions::assert_eq;

fn sorted_ids(rows: impl IntoIterator<Item = Row>) -> Vec<i64> {
    let mut ids: Vec<i64> = rows
        .into_iter()
        .filter_map(|row| row.id().and_then(|id| id.as_i64()))
        .collect();
    ids.sort_unstable();
    ids
}

fn all(t: &TestDatabase, table: &str) -> RowCollection {
    let rows = t.db.entity(table).unwrap().select_all().get().unwrap();
    t.reset();
    rows
}

// ============================================================================
// Inference
// ============================================================================

#[test]
fn test_direct_and_reverse_are_symmetric() {
    let t = TestDatabase::blog();

    let forward = t.db.relationship("post", "category").unwrap();
    let backward = t.db.relationship("category", "post").unwrap();
    assert_eq!(
        forward.kind,
        RelationKind::Direct {
            foreign_key: "category_id".to_string()
        }
    );
    assert_eq!(
        backward.kind,
        RelationKind::Reverse {
            foreign_key: "category_id".to_string()
        }
    );
    assert!(forward.is_to_one());
    assert!(backward.is_to_many());
}

#[test]
fn test_many_to_many_through_join_table() {
    let t = TestDatabase::blog();
    let relationship = t.db.relationship("tag", "post").unwrap();
    assert_eq!(
        relationship.kind,
        RelationKind::ManyToMany {
            join_table: "post_tag".to_string(),
            local_key: "tag_id".to_string(),
            remote_key: "post_id".to_string(),
        }
    );
}

#[test]
fn test_unrelated_tables() {
    let t = TestDatabase::blog();
    assert!(matches!(
        t.db.relationship("category", "tag"),
        Err(NamesakeError::RelationNotFound { .. })
    ));

    let category = t.db.entity("category").unwrap().get(1).unwrap().unwrap();
    t.reset();
    assert!(matches!(
        category.related("tag"),
        Err(NamesakeError::RelationNotFound { .. })
    ));
    assert_eq!(t.queries(), 0);
}

// ============================================================================
// Batching
// ============================================================================

#[test]
fn test_one_query_regardless_of_collection_size() {
    for extra in [0, 3, 40] {
        let t = TestDatabase::blog();
        t.seed_posts(2, extra);
        let posts = all(&t, "post");
        assert_eq!(posts.len(), 4 + extra);

        let categories = posts.related("category").unwrap();
        assert_eq!(t.queries(), 1, "{extra} extra posts");
        assert_eq!(sorted_ids(categories), vec![1, 2]);

        for post in &posts {
            post.get("category").unwrap();
        }
        assert_eq!(t.queries(), 1, "memoized access for {extra} extra posts");
    }
}

#[test]
fn test_empty_collection_runs_one_query() {
    let t = TestDatabase::blog();
    let none = t
        .db
        .entity("category")
        .unwrap()
        .select_all()
        .filter("0 = 1", ())
        .get()
        .unwrap();
    t.reset();

    let posts = none.related("post").unwrap();
    assert!(posts.is_empty());
    assert_eq!(t.queries(), 1);
    assert_eq!(t.last_sql(), "SELECT * FROM `post` WHERE (0 = 1)");
}

#[test]
fn test_resolved_members_are_skipped() {
    let t = TestDatabase::blog();
    let posts = all(&t, "post");

    let first = posts.first().unwrap().clone();
    first.related("comment").unwrap();
    assert_eq!(t.queries(), 1);

    let comments = posts.related("comment").unwrap();
    assert_eq!(t.queries(), 2);
    assert_eq!(
        t.last_sql(),
        "SELECT * FROM `comment` WHERE (`post_id` IN (:__related0_0, :__related0_1, :__related0_2))"
    );
    assert_eq!(sorted_ids(comments), vec![1, 2, 3]);

    posts.related("comment").unwrap();
    assert_eq!(t.queries(), 2);
}

// ============================================================================
// Results
// ============================================================================

#[test]
fn test_missing_matches_are_explicit() {
    let t = TestDatabase::blog();
    let posts = all(&t, "post");
    posts.related("category").unwrap();

    let orphan = posts.get(&Key::Int(4)).unwrap();
    let related = orphan.related("category").unwrap();
    assert!(related.one().is_none());
    assert!(related.is_empty());

    let categories = all(&t, "category");
    categories.related("post").unwrap();
    let empty = categories.get(&Key::Int(3)).unwrap();
    let posts = empty.get("post").unwrap();
    assert_eq!(posts.as_many().map(RowCollection::len), Some(0));
    assert_eq!(t.queries(), 1);
}

#[test]
fn test_many_to_many_both_directions() {
    let t = TestDatabase::blog();

    let posts = all(&t, "post");
    posts.related("tag").unwrap();
    let per_post: Vec<(i64, Vec<i64>)> = posts
        .iter()
        .map(|post| {
            let id = post.id().and_then(|id| id.as_i64()).unwrap();
            (id, sorted_ids(post.related("tag").unwrap().rows()))
        })
        .collect();
    assert_eq!(
        per_post,
        vec![(1, vec![1, 2]), (2, vec![]), (3, vec![1]), (4, vec![])]
    );

    let tags = all(&t, "tag");
    let tagged = tags.related("post").unwrap();
    assert_eq!(t.queries(), 1);
    assert_eq!(sorted_ids(tagged), vec![1, 3]);

    let rust = tags.get(&Key::Int(1)).unwrap();
    assert_eq!(sorted_ids(rust.related("post").unwrap().rows()), vec![1, 3]);
    let unused = tags.get(&Key::Int(3)).unwrap();
    assert!(unused.related("post").unwrap().is_empty());
    assert_eq!(t.queries(), 1);
}

#[test]
fn test_chained_collections() {
    let t = TestDatabase::blog();
    let comments = all(&t, "comment");

    let categories = comments
        .related("post")
        .unwrap()
        .related("category")
        .unwrap();
    assert_eq!(t.queries(), 2);
    assert_eq!(sorted_ids(categories), vec![1, 2]);
}

#[test]
fn test_related_rows_are_shared_within_a_batch() {
    let t = TestDatabase::blog();
    let posts = all(&t, "post");
    posts.related("category").unwrap();

    let first = posts.get(&Key::Int(1)).unwrap().related("category").unwrap();
    let second = posts.get(&Key::Int(2)).unwrap().related("category").unwrap();
    assert!(first.one().unwrap().ptr_eq(second.one().unwrap()));
}

#[test]
fn test_many_to_many_rows_are_shared_across_owners() {
    let t = TestDatabase::blog();
    let posts = all(&t, "post");
    let tags = posts.related("tag").unwrap();

    let tag_of = |post: i64| {
        let related = posts.get(&Key::Int(post)).unwrap().related("tag").unwrap();
        related.many().unwrap().get(&Key::Int(1)).unwrap().clone()
    };
    assert!(tag_of(1).ptr_eq(&tag_of(3)));

    t.reset();
    tags.related("post").unwrap();
    assert_eq!(t.queries(), 1);
    for post in posts.iter() {
        for tag in post.related("tag").unwrap().rows() {
            tag.related("post").unwrap();
        }
    }
    assert_eq!(t.queries(), 1);
}

// ============================================================================
// Relation handles and related_with
// ============================================================================

#[test]
fn test_relation_select_is_fresh_and_filterable() {
    let t = TestDatabase::blog();
    let post = t.db.entity("post").unwrap().get(1).unwrap().unwrap();
    t.reset();

    let relation = post.relation("comment");
    let nice = relation
        .select()
        .unwrap()
        .filter("body = :body", params! { "body" => "nice" })
        .get()
        .unwrap();
    assert_eq!(sorted_ids(nice), vec![2]);
    assert_eq!(
        t.last_sql(),
        "SELECT * FROM `comment` WHERE (`post_id` = :__related0_0) AND (body = :body)"
    );
    assert!(!relation.is_resolved());

    assert_eq!(relation.get().unwrap().len(), 2);
    assert!(relation.is_resolved());
}

#[test]
fn test_related_with_rendering() {
    let t = TestDatabase::blog();
    let posts = all(&t, "post");
    let tag = t.db.entity("tag").unwrap();

    let statement = tag.select_all().related_with(&posts).unwrap().statement().unwrap();
    assert_eq!(
        statement.sql,
        "SELECT * FROM `tag` WHERE (`id` IN (SELECT `tag_id` FROM `post_tag` WHERE \
         `post_id` IN (:__related0_0, :__related0_1, :__related0_2, :__related0_3)))"
    );

    let category = t.db.entity("category").unwrap();
    let statement = category
        .select_all()
        .related_with(&posts)
        .unwrap()
        .statement()
        .unwrap();
    assert_eq!(
        statement.sql,
        "SELECT * FROM `category` WHERE (`id` IN (:__related0_0, :__related0_1))"
    );
    assert_eq!(statement.params.get("__related0_0"), Some(&Value::Int(1)));
    assert_eq!(statement.params.get("__related0_1"), Some(&Value::Int(2)));

    let orphans = posts.filter(|post| post.value("category_id") == Some(Value::Null));
    let statement = category
        .select_all()
        .related_with(&orphans)
        .unwrap()
        .statement()
        .unwrap();
    assert_eq!(statement.sql, "SELECT * FROM `category` WHERE (0 = 1)");
    assert_eq!(t.queries(), 0);
}

#[test]
fn test_clear_cache_keeps_relations_working() {
    let t = TestDatabase::blog();
    let before = sorted_ids(all(&t, "category").related("post").unwrap());
    t.db.clear_cache();
    let after = sorted_ids(all(&t, "category").related("post").unwrap());
    assert_eq!(before, after);
    assert_eq!(after, vec![1, 2, 3]);
}
