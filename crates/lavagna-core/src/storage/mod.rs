//! Storage abstraction for saved projects.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::project::Project;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a project picker shows for a stored project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    /// Storage key, as passed to [`Storage::load`].
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl ProjectSummary {
    pub fn new(id: impl Into<String>, project: &Project) -> Self {
        Self {
            id: id.into(),
            name: project.name.clone(),
            width: project.width,
            height: project.height,
        }
    }
}

/// Sort by name, then by storage key.
pub(crate) fn sort_summaries(summaries: &mut [ProjectSummary]) {
    summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}

/// Project storage backend.
///
/// The canvas itself is synchronous; only persistence goes through futures so
/// hosts can plug in remote or browser-backed stores.
pub trait Storage: Send + Sync {
    /// Save a project under `id`, replacing any previous one.
    fn save(&self, id: &str, project: &Project) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a project.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Project>>;

    /// Delete a project. Deleting a missing project is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all project ids.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a project exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;

    /// Summaries of every stored project, sorted by name.
    fn summaries(&self) -> BoxFuture<'_, StorageResult<Vec<ProjectSummary>>> {
        Box::pin(async move {
            let mut summaries = Vec::new();
            for id in self.list().await? {
                let project = self.load(&id).await?;
                summaries.push(ProjectSummary::new(id, &project));
            }
            sort_summaries(&mut summaries);
            Ok(summaries)
        })
    }
}

/// Drive a future to completion on the current thread.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, Waker};

    let mut cx = Context::from_waker(Waker::noop());
    let mut f = std::pin::pin!(f);
    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
