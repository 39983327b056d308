//! Shared fixture: a small blog schema in in-memory SQLite, behind a
//! statement recorder so tests can count round trips.
//!
//! ```text
//! category 1 ── post 1 ── comment 1, 2      post 1 ── tag 1, 2
//!          └─── post 2                      post 3 ── tag 1
//! category 2 ── post 3 ── comment 3
//! category 3 (no posts)     post 4 (no category)   tag 3 (no posts)
//! ```

#![allow(dead_code)]

use fake::faker::lorem::en::{Sentence, Word};
use fake::Fake;
use namesake::{Database, Params, RecordingExecutor, SqliteExecutor, Value};
use std::rc::Rc;

pub const SCHEMA: &str = "
    CREATE TABLE category (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL);
    CREATE TABLE post (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category_id INTEGER,
        title TEXT,
        body TEXT,
        views INTEGER NOT NULL DEFAULT 0,
        pubdate DATETIME,
        isPublished INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE comment (id INTEGER PRIMARY KEY AUTOINCREMENT, post_id INTEGER, body TEXT, createdAt DATETIME);
    CREATE TABLE tag (id INTEGER PRIMARY KEY AUTOINCREMENT, label TEXT);
    CREATE TABLE post_tag (id INTEGER PRIMARY KEY AUTOINCREMENT, post_id INTEGER, tag_id INTEGER);
";

pub const SEED: &str = "
    INSERT INTO category (id, name) VALUES (1, 'news'), (2, 'tech'), (3, 'empty');
    INSERT INTO post (id, category_id, title, views, pubdate, isPublished) VALUES
        (1, 1, 'Hello', 10, '2024-01-01 10:00:00', 1),
        (2, 1, 'Second', 5, '2024-01-02 10:00:00', 0),
        (3, 2, 'Third', 7, '2024-01-03 10:00:00', 1),
        (4, NULL, 'Orphan', 0, NULL, 0);
    INSERT INTO comment (id, post_id, body, createdAt) VALUES
        (1, 1, 'first!', '2024-01-01 11:00:00'),
        (2, 1, 'nice', '2024-01-01 12:00:00'),
        (3, 3, 'hmm', '2024-01-03 11:00:00');
    INSERT INTO tag (id, label) VALUES (1, 'rust'), (2, 'sql'), (3, 'unused');
    INSERT INTO post_tag (post_id, tag_id) VALUES (1, 1), (1, 2), (3, 1);
";

pub type Recorder = Rc<RecordingExecutor<SqliteExecutor>>;

pub struct TestDatabase {
    pub db: Database,
    pub log: Recorder,
}

impl TestDatabase {
    /// Seeded blog database.
    pub fn blog() -> Self {
        Self::with_sql(&format!("{SCHEMA}{SEED}"))
    }

    /// Blog schema without rows.
    pub fn empty() -> Self {
        Self::with_sql(SCHEMA)
    }

    fn with_sql(sql: &str) -> Self {
        let sqlite = SqliteExecutor::open_in_memory().expect("in-memory sqlite");
        sqlite.execute_batch(sql).expect("fixture sql");
        let log = Rc::new(RecordingExecutor::new(sqlite));
        let db = Database::new(Rc::clone(&log));
        Self { db, log }
    }

    /// Statements executed since the last reset.
    pub fn queries(&self) -> usize {
        self.log.count()
    }

    pub fn reset(&self) {
        self.log.clear();
    }

    pub fn last_sql(&self) -> String {
        self.log.last().map(|s| s.sql).unwrap_or_default()
    }

    /// Insert `n` generated posts in `category_id` directly, bypassing the
    /// builders.
    pub fn seed_posts(&self, category_id: i64, n: usize) {
        for _ in 0..n {
            let mut params = Params::new();
            params.insert("category", category_id);
            params.insert("title", fake_title());
            params.insert("views", (0..1_000i64).fake::<i64>());
            self.db
                .execute(
                    "INSERT INTO post (category_id, title, views) VALUES (:category, :title, :views)",
                    &params,
                )
                .expect("seed post");
        }
    }
}

pub fn fake_title() -> String {
    Sentence(2..5).fake()
}

pub fn fake_label() -> Value {
    Value::from(Word().fake::<String>())
}
