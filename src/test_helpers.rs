//! Shared fixtures for unit tests.

use crate::executor::{RecordingExecutor, SqliteExecutor};
use crate::Database;
use std::rc::Rc;

pub(crate) const BLOG_SCHEMA: &str = "
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

pub(crate) fn blog() -> Database {
    blog_recorded().0
}

/// Blog database whose statements are logged by the returned recorder.
pub(crate) fn blog_recorded() -> (Database, Rc<RecordingExecutor<SqliteExecutor>>) {
    let sqlite = SqliteExecutor::open_in_memory().expect("in-memory sqlite");
    sqlite.execute_batch(BLOG_SCHEMA).expect("blog fixture");
    let recorder = Rc::new(RecordingExecutor::new(sqlite));
    (Database::new(Rc::clone(&recorder)), recorder)
}
