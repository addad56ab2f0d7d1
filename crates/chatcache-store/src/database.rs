//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use chatcache_shared::constants::APP_NAME;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default cache database.
    ///
    /// The database file is placed in the platform-appropriate cache directory:
    /// - Linux:   `~/.cache/chatcache/chatcache.db`
    /// - macOS:   `~/Library/Caches/com.chatcache.chatcache/chatcache.db`
    /// - Windows: `{FOLDERID_LocalAppData}\chatcache\chatcache\cache\chatcache.db`
    pub fn new() -> Result<Self> {
        Self::open_at(&Self::default_path()?)
    }

    /// Path used by [`Database::new`], creating its parent directory.
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("com", APP_NAME, APP_NAME).ok_or(StoreError::NoDataDir)?;

        let cache_dir = project_dirs.cache_dir();
        std::fs::create_dir_all(cache_dir)?;

        Ok(cache_dir.join(format!("{APP_NAME}.db")))
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "opening cache database");

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open a private in-memory database.  Contents vanish on drop.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}
