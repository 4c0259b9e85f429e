pub mod memory;
pub mod session_store;
pub mod sqlite;
pub mod user_repository;

use crate::domain::repository::{RecordRepository, UserRepository};
use anyhow::Result;
use memory::InMemoryRecordRepository;
use sqlite::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;
use user_repository::InMemoryUserRepository;

#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseBackend {
    Memory,
    SqliteInMemory,
    Sqlite(PathBuf),
}

impl DatabaseBackend {
    /// Accepts `memory`, `sqlite::memory:`, `sqlite://<path>` and `sqlite:<path>`.
    pub fn from_url(url: &str) -> Option<Self> {
        let url = url.trim();
        if url == "memory" {
            return Some(DatabaseBackend::Memory);
        }
        if url == "sqlite::memory:" {
            return Some(DatabaseBackend::SqliteInMemory);
        }
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))?;
        if path.is_empty() {
            return None;
        }
        Some(DatabaseBackend::Sqlite(PathBuf::from(path)))
    }
}

/// The record store handed to the services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub records: Arc<dyn RecordRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            records: Arc::new(InMemoryRecordRepository::new()),
        }
    }

    pub fn sqlite(store: SqliteStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            records: store,
        }
    }

    pub fn open(backend: &DatabaseBackend) -> Result<Self> {
        match backend {
            DatabaseBackend::Memory => Ok(Self::in_memory()),
            DatabaseBackend::SqliteInMemory => Ok(Self::sqlite(SqliteStore::open_in_memory()?)),
            DatabaseBackend::Sqlite(path) => Ok(Self::sqlite(SqliteStore::open(path)?)),
        }
    }
}
