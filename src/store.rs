//! SQLite-backed identifier store.
//!
//! The store holds nothing but the external video keys; every other field a
//! client sees is fetched live from YouTube. The backend only ever reads from
//! it, the `seed_ids` binary is the one writer.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};

/// Name reported for the single table, kept for parity with the debug dump.
pub const COLLECTION_NAME: &str = "videos";

/// One row of the `videos` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredIdentifier {
    /// SQLite rowid; defines the storage-native enumeration order.
    pub id: i64,
    pub video_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("creating store directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("opening identifier store {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("identifier store query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Read access the aggregator needs. Implemented by [`IdentifierStore`] and
/// by in-memory fakes in tests.
pub trait IdentifierSource: Send + Sync {
    /// Every stored identifier in storage-native order. Empty is not an error.
    fn list_identifiers(&self) -> Result<Vec<StoredIdentifier>, StoreError>;

    /// Human-readable database name reported by the info endpoints.
    fn database_name(&self) -> &str;
}

/// Wrapper around a single long-lived SQLite connection.
#[derive(Debug)]
pub struct IdentifierStore {
    conn: Mutex<Connection>,
    path: PathBuf,
    database_name: String,
}

impl IdentifierStore {
    /// Opens (and if necessary creates) the DB and makes sure the table
    /// exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        // journal_mode answers with the mode now in effect.
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let database_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| COLLECTION_NAME.to_string());

        let store = Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
            database_name,
        };
        store.ensure_tables()?;
        Ok(store)
    }

    fn ensure_tables(&self) -> Result<(), StoreError> {
        self.conn.lock().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                videoid TEXT PRIMARY KEY NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Adds one identifier. Returns `false` when it was already present.
    pub fn insert(&self, video_id: &str) -> Result<bool, StoreError> {
        let changed = self.conn.lock().execute(
            "INSERT INTO videos (videoid) VALUES (?1) ON CONFLICT(videoid) DO NOTHING",
            params![video_id],
        )?;
        Ok(changed > 0)
    }

    /// Clears the table and inserts `ids` in order, all in one transaction.
    /// Duplicates inside `ids` are stored once. Returns the number inserted.
    pub fn replace_all<S: AsRef<str>>(&self, ids: &[S]) -> Result<usize, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM videos", [])?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO videos (videoid) VALUES (?1) ON CONFLICT(videoid) DO NOTHING",
            )?;
            for id in ids {
                inserted += stmt.execute(params![id.as_ref()])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }
}

impl IdentifierSource for IdentifierStore {
    fn list_identifiers(&self) -> Result<Vec<StoredIdentifier>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT rowid, videoid
            FROM videos
            ORDER BY rowid ASC
            "#,
        )?;

        let mut rows = stmt.query([])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row_to_identifier(row)?);
        }
        Ok(ids)
    }

    fn database_name(&self) -> &str {
        &self.database_name
    }
}

fn row_to_identifier(row: &Row<'_>) -> rusqlite::Result<StoredIdentifier> {
    Ok(StoredIdentifier {
        id: row.get(0)?,
        video_id: row.get(1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn video_ids(store: &IdentifierStore) -> Vec<String> {
        store
            .list_identifiers()
            .unwrap()
            .into_iter()
            .map(|stored| stored.video_id)
            .collect()
    }

    #[test]
    fn open_creates_parent_dirs_and_empty_table() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested/dir/youtube_videos_db.sqlite3");
        let store = IdentifierStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.list_identifiers().unwrap().is_empty());
        assert_eq!(store.database_name(), "youtube_videos_db");
    }

    #[test]
    fn list_preserves_insertion_order() {
        let temp = tempdir().unwrap();
        let store = IdentifierStore::open(&temp.path().join("ids.db")).unwrap();
        for id in ["zeta", "alpha", "mid"] {
            assert!(store.insert(id).unwrap());
        }
        assert_eq!(video_ids(&store), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn insert_ignores_duplicates() {
        let temp = tempdir().unwrap();
        let store = IdentifierStore::open(&temp.path().join("ids.db")).unwrap();
        assert!(store.insert("dQw4w9WgXcQ").unwrap());
        assert!(!store.insert("dQw4w9WgXcQ").unwrap());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn replace_all_clears_previous_rows() {
        let temp = tempdir().unwrap();
        let store = IdentifierStore::open(&temp.path().join("ids.db")).unwrap();
        store.insert("old").unwrap();

        let inserted = store.replace_all(&["a", "b", "a", "c"]).unwrap();
        assert_eq!(inserted, 3);
        assert_eq!(video_ids(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn reopening_keeps_rows() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("ids.db");
        IdentifierStore::open(&path)
            .unwrap()
            .replace_all(&["one", "two"])
            .unwrap();

        let reopened = IdentifierStore::open(&path).unwrap();
        assert_eq!(video_ids(&reopened), vec!["one", "two"]);
    }

    #[test]
    fn missing_table_surfaces_query_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("ids.db");
        let store = IdentifierStore::open(&path).unwrap();
        Connection::open(&path)
            .unwrap()
            .execute_batch("DROP TABLE videos;")
            .unwrap();

        let err = store.list_identifiers().unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[test]
    fn stored_identifier_serializes_camel_case() {
        let value = serde_json::to_value(StoredIdentifier {
            id: 7,
            video_id: "abc".into(),
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({ "id": 7, "videoId": "abc" }));
    }
}
