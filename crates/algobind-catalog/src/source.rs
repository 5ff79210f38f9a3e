//! Concrete catalogue sources.

use crate::CatalogError;
use algobind_kernel::{
    Catalog, CatalogSource, FetchCallback, FetchError, Registry, RegistryError, parse_catalog,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::debug;

/// Catalogue stored as a JSON file on disk. Re-read on every fetch, so a
/// registry reset picks up edits.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Catalog, CatalogError> {
        debug!(path = %self.path.display(), "reading catalogue file");
        let text = fs::read_to_string(&self.path).map_err(|e| CatalogError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let raw: Value = serde_json::from_str(&text).map_err(|e| CatalogError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        parse_catalog(&raw).map_err(|e| CatalogError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

impl CatalogSource for JsonFileSource {
    fn fetch(&self) -> Result<Catalog, FetchError> {
        Ok(self.read()?)
    }
}

/// Catalogue held in memory as raw JSON.
#[derive(Debug, Clone)]
pub struct StaticSource {
    raw: Value,
}

impl StaticSource {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }
}

impl CatalogSource for StaticSource {
    fn fetch(&self) -> Result<Catalog, FetchError> {
        parse_catalog(&self.raw).map_err(|e| FetchError::new(e.to_string()))
    }
}

/// Wraps a blocking source so callback fetches run on the runtime's blocking
/// pool and complete on another thread.
pub struct ThreadedSource<S> {
    inner: Arc<S>,
    handle: Handle,
}

impl<S> std::fmt::Debug for ThreadedSource<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadedSource").finish_non_exhaustive()
    }
}

impl<S> ThreadedSource<S>
where
    S: CatalogSource + 'static,
{
    pub fn new(inner: S, handle: Handle) -> Self {
        Self {
            inner: Arc::new(inner),
            handle,
        }
    }

    /// Use the runtime the caller is running on.
    pub fn current(inner: S) -> Result<Self, CatalogError> {
        let handle = Handle::try_current().map_err(|_| CatalogError::NoRuntime)?;
        Ok(Self::new(inner, handle))
    }
}

impl<S> CatalogSource for ThreadedSource<S>
where
    S: CatalogSource + 'static,
{
    fn fetch(&self) -> Result<Catalog, FetchError> {
        self.inner.fetch()
    }

    fn fetch_with(&self, done: FetchCallback) {
        let inner = Arc::clone(&self.inner);
        debug!("dispatching catalogue fetch to the blocking pool");
        // Detached. A shut-down runtime drops `done`, which fails the fetch.
        drop(self.handle.spawn_blocking(move || done(inner.fetch())));
    }
}

type OutcomeSlot = Arc<Mutex<Option<oneshot::Sender<Result<(), RegistryError>>>>>;

fn deliver(slot: &OutcomeSlot, outcome: Result<(), RegistryError>) {
    let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(sender) = sender {
        // The receiver may have been dropped by a cancelled caller.
        let _ = sender.send(outcome);
    }
}

/// Await callback-based population of `registry`.
pub async fn populate_async(registry: &Registry) -> Result<(), RegistryError> {
    let (sender, receiver) = oneshot::channel();
    let on_success: OutcomeSlot = Arc::new(Mutex::new(Some(sender)));
    let on_failure = Arc::clone(&on_success);
    registry.populate_with(
        move || deliver(&on_success, Ok(())),
        Some(Box::new(move |err: RegistryError| {
            deliver(&on_failure, Err(err))
        })),
    );
    receiver
        .await
        .unwrap_or_else(|_| Err(RegistryError::Fetch("catalogue fetch was dropped".to_string())))
}
