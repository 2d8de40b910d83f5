//! Backend construction.

use std::str::FromStr;
use std::sync::Arc;

use crate::appwrite::{AppwriteClient, AppwriteSettings, AppwriteStore};
use crate::memory::MemoryStore;
use crate::repositories::{
    ClaimRepository, GlobalConfigRepository, LogRepository, MemberRepository,
};
use crate::storage::{AppwriteFileStorage, FileStorage, MemoryFileStorage};
use crate::store::{DocumentStore, StoreError};

/// Which document store to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Appwrite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "appwrite" => Ok(StoreBackend::Appwrite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

/// Collection ids.
#[derive(Debug, Clone)]
pub struct Collections {
    pub members: String,
    pub logs: String,
    pub global_config: String,
    pub claims: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            members: "members".into(),
            logs: "logs".into(),
            global_config: "global_config".into(),
            claims: "claims".into(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub appwrite: AppwriteSettings,
    pub database_id: String,
    pub bucket_id: String,
}

/// Handles to the configured backends.
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn DocumentStore>,
    pub files: Arc<dyn FileStorage>,
    /// Present when running against Appwrite; shared with the identity provider.
    pub appwrite: Option<AppwriteClient>,
}

/// Create the document store and file storage for `config`.
pub fn create_backends(config: &StoreConfig) -> Result<Backends, StoreError> {
    match config.backend {
        StoreBackend::Appwrite => {
            let client = AppwriteClient::new(&config.appwrite)?;
            Ok(Backends {
                store: Arc::new(AppwriteStore::new(client.clone(), &config.database_id)),
                files: Arc::new(AppwriteFileStorage::new(client.clone(), &config.bucket_id)),
                appwrite: Some(client),
            })
        }
        StoreBackend::Memory => Ok(Backends {
            store: Arc::new(MemoryStore::new()),
            files: Arc::new(MemoryFileStorage::new()),
            appwrite: None,
        }),
    }
}

/// All repositories over one store.
#[derive(Clone)]
pub struct Repositories {
    pub members: MemberRepository,
    pub claims: ClaimRepository,
    pub logs: LogRepository,
    pub global_config: GlobalConfigRepository,
}

impl Repositories {
    pub fn new(store: Arc<dyn DocumentStore>, collections: &Collections) -> Self {
        Self {
            members: MemberRepository::new(store.clone(), &collections.members),
            claims: ClaimRepository::new(store.clone(), &collections.claims),
            logs: LogRepository::new(store.clone(), &collections.logs),
            global_config: GlobalConfigRepository::new(store, &collections.global_config),
        }
    }
}
