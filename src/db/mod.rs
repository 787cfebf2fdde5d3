use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tokio::task;
use crate::error::{Result, DmrestError};

pub mod schema;

/// Database connection wrapper
#[derive(Debug, Clone)]
pub struct Db {
    path: std::path::PathBuf,
    read_only: bool,
}

impl Db {
    /// Connection manager that may create and write the database
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            path: db_path.as_ref().to_path_buf(),
            read_only: false,
        }
    }

    /// Connection manager for the read path: the file must exist and
    /// connections refuse every write
    pub fn read_only<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            path: db_path.as_ref().to_path_buf(),
            read_only: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a new database connection
    ///
    /// Only per-connection pragmas are set here; nothing persistent in the file changes.
    pub fn open_connection(&self) -> Result<Connection> {
        let conn = if self.read_only {
            Connection::open_with_flags(
                &self.path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
        } else {
            Connection::open(&self.path)
        }
        .map_err(DmrestError::Database)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON; \
             PRAGMA temp_store = MEMORY; \
             PRAGMA cache_size = -65536;"
        )?;
        if self.read_only {
            conn.execute_batch("PRAGMA query_only = ON;")?;
        }

        Ok(conn)
    }

    /// Execute a closure with a database connection in a blocking task
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        task::spawn_blocking(move || {
            let mut conn = db.open_connection()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            DmrestError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("database task failed: {}", e),
            ))
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_db_connection() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Db::new(&db_path);

        let result = db.with_connection(|conn| {
            conn.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)", [])
                .map_err(DmrestError::Database)?;
            Ok(())
        }).await;

        assert!(result.is_ok());
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_read_only_refuses_writes() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        Db::new(&db_path).with_connection(|conn| {
            conn.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)", [])?;
            Ok(())
        }).await.unwrap();

        let db = Db::read_only(&db_path);
        let count: i64 = db.with_connection(|conn| {
            let foreign_keys: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
            assert_eq!(foreign_keys, 1);
            Ok(conn.query_row("SELECT COUNT(*) FROM test", [], |row| row.get(0))?)
        }).await.unwrap();
        assert_eq!(count, 0);

        let write = db.with_connection(|conn| {
            conn.execute("INSERT INTO test (id) VALUES (1)", [])?;
            Ok(())
        }).await;
        assert!(matches!(write, Err(DmrestError::Database(_))));
    }

    #[tokio::test]
    async fn test_read_only_does_not_create_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("missing.db");
        let result = Db::read_only(&db_path).with_connection(|_| Ok(())).await;
        assert!(result.is_err());
        assert!(!db_path.exists());
    }
}
