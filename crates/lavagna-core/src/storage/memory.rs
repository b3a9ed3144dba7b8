//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::project::Project;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    projects: RwLock<HashMap<String, Project>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, project: &Project) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let project = project.clone();
        Box::pin(async move {
            self.projects.write().map_err(lock_error)?.insert(id, project);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Project>> {
        let id = id.to_string();
        Box::pin(async move {
            let projects = self.projects.read().map_err(lock_error)?;
            projects.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.projects.write().map_err(lock_error)?.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let projects = self.projects.read().map_err(lock_error)?;
            let mut ids: Vec<String> = projects.keys().cloned().collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.projects.read().map_err(lock_error)?.contains_key(&id)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::Background;
    use crate::snapshot::Snapshot;
    use crate::storage::block_on;

    fn project() -> Project {
        let snapshot = Snapshot::from_premultiplied(2, 2, vec![0; 16]).unwrap();
        Project::new("Untitled", &snapshot, Background::default()).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let project = project();

        block_on(storage.save("test", &project)).unwrap();
        let loaded = block_on(storage.load("test")).unwrap();
        assert_eq!(loaded.id, project.id);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();
        assert!(!block_on(storage.exists("test")).unwrap());
        block_on(storage.save("test", &project())).unwrap();
        assert!(block_on(storage.exists("test")).unwrap());
        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.exists("test")).unwrap());
        block_on(storage.delete("test")).unwrap();
    }

    #[test]
    fn test_summaries_sorted_by_name() {
        let storage = MemoryStorage::new();
        let snapshot = Snapshot::from_premultiplied(4, 3, vec![0; 48]).unwrap();
        let geometry = Project::new("Geometry", &snapshot, Background::default()).unwrap();
        block_on(storage.save("p1", &geometry)).unwrap();
        block_on(storage.save("p2", &project())).unwrap();

        let summaries = block_on(storage.summaries()).unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Geometry", "Untitled"]);
        assert_eq!(summaries[0].id, "p1");
        assert_eq!((summaries[0].width, summaries[0].height), (4, 3));
    }

    #[test]
    fn test_list() {
        let storage = MemoryStorage::new();
        block_on(storage.save("board-2", &project())).unwrap();
        block_on(storage.save("board-1", &project())).unwrap();
        assert_eq!(block_on(storage.list()).unwrap(), vec!["board-1", "board-2"]);
    }
}
