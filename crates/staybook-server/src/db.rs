//! Process-wide database handle.
//!
//! The connection is opened on first use and kept behind a mutex; every
//! request runs its storage work on the blocking pool. [`SharedDb::teardown`]
//! closes the connection explicitly (shutdown, test isolation); the next use
//! after a teardown reopens it.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use staybook_store::{Database, StoreError};

use crate::error::ServerError;

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// Platform data directory.
    Default,
    Path(PathBuf),
    /// Private in-memory database, lost on teardown.
    Memory,
}

/// `:memory:` selects a private in-memory database.
impl From<Option<PathBuf>> for DbLocation {
    fn from(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) if p.as_os_str() == ":memory:" => Self::Memory,
            Some(p) => Self::Path(p),
            None => Self::Default,
        }
    }
}

pub struct SharedDb {
    location: DbLocation,
    inner: Mutex<Option<Database>>,
}

impl SharedDb {
    pub fn new(location: DbLocation) -> Self {
        Self {
            location,
            inner: Mutex::new(None),
        }
    }

    fn open(&self) -> Result<Database, StoreError> {
        match &self.location {
            DbLocation::Default => Database::new(),
            DbLocation::Path(path) => {
                info!(path = %path.display(), "opening database");
                Database::open_at(path)
            }
            DbLocation::Memory => Database::open_in_memory(),
        }
    }

    /// A panic inside [`SharedDb::with`] poisons the mutex. The connection
    /// itself stays usable because every write runs in its own transaction.
    fn lock(&self) -> MutexGuard<'_, Option<Database>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("database lock was poisoned, recovering");
            self.inner.clear_poison();
            PoisonError::into_inner(poisoned)
        })
    }

    /// Whether the connection is currently open.
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Run `f` against the database, opening it first if needed.
    pub fn with<T>(
        &self,
        f: impl FnOnce(&mut Database) -> Result<T, ServerError>,
    ) -> Result<T, ServerError> {
        let mut guard = self.lock();

        if guard.is_none() {
            *guard = Some(self.open()?);
            debug!(location = ?self.location, "database opened");
        }

        let db = guard
            .as_mut()
            .ok_or_else(|| ServerError::Internal("database unavailable".into()))?;
        f(db)
    }

    /// [`SharedDb::with`] on the blocking thread pool.
    pub async fn run<T, F>(self: &Arc<Self>, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&mut Database) -> Result<T, ServerError> + Send + 'static,
        T: Send + 'static,
    {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.with(f))
            .await
            .map_err(|e| ServerError::Internal(format!("storage task failed: {e}")))?
    }

    /// Close the connection. Returns `true` if one was open.
    pub fn teardown(&self) -> Result<bool, ServerError> {
        let mut guard = self.lock();
        match guard.take() {
            Some(db) => {
                db.close()?;
                info!("database closed");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
