//! File-based storage for native platforms.

use super::{BoxFuture, ProjectSummary, Storage, StorageError, StorageResult, sort_summaries};
use crate::project::Project;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores projects as JSON files in a directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage under the platform data directory
    /// (`lavagna/projects`).
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("lavagna").join("projects"))
    }

    fn project_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, id: &str, project: &Project) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.project_path(id);
        let json = project.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            fs::write(&path, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })?;
            log::debug!("Saved project to {}", path.display());
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Project>> {
        let path = self.project_path(id);
        let id = id.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id));
            }
            let json = fs::read_to_string(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;
            Project::from_json(&json).map_err(|e| {
                StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
            })
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.project_path(id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut ids: Vec<String> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
                .collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.project_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }

    /// Unreadable or corrupt project files are skipped with a warning.
    fn summaries(&self) -> BoxFuture<'_, StorageResult<Vec<ProjectSummary>>> {
        Box::pin(async move {
            let mut summaries = Vec::new();
            for id in self.list().await? {
                match self.load(&id).await {
                    Ok(project) => summaries.push(ProjectSummary::new(id, &project)),
                    Err(e) => log::warn!("Skipping project {}: {}", id, e),
                }
            }
            sort_summaries(&mut summaries);
            Ok(summaries)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::Background;
    use crate::snapshot::Snapshot;
    use crate::storage::block_on;
    use tempfile::tempdir;

    fn project(name: &str) -> Project {
        let snapshot = Snapshot::from_premultiplied(3, 2, vec![255; 24]).unwrap();
        Project::new(name, &snapshot, Background::default()).unwrap()
    }

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let project = project("Test Board");

        block_on(storage.save("test-board", &project)).unwrap();
        let loaded = block_on(storage.load("test-board")).unwrap();
        assert_eq!(loaded, project);
        assert_eq!(loaded.snapshot().unwrap().width(), 3);
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_list_and_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        block_on(storage.save("b", &project("b"))).unwrap();
        block_on(storage.save("a", &project("a"))).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(block_on(storage.list()).unwrap(), vec!["a", "b"]);
        block_on(storage.delete("a")).unwrap();
        assert!(!block_on(storage.exists("a")).unwrap());
        assert!(block_on(storage.exists("b")).unwrap());
    }

    #[test]
    fn test_file_storage_sanitizes_id() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let project = project("x");

        block_on(storage.save("class/7:b*", &project)).unwrap();
        assert!(dir.path().join("class_7_b_.json").exists());
        let loaded = block_on(storage.load("class/7:b*")).unwrap();
        assert_eq!(loaded.id, project.id);
    }

    #[test]
    fn test_summaries_skip_corrupt_files() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        block_on(storage.save("zeta", &project("Algebra"))).unwrap();
        block_on(storage.save("alpha", &project("Zoology"))).unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let summaries = block_on(storage.summaries()).unwrap();
        let ids: Vec<&str> = summaries.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
        assert_eq!(summaries[0].name, "Algebra");
        assert_eq!((summaries[0].width, summaries[0].height), (3, 2));
    }

    #[test]
    fn test_corrupt_file_reports_serialization_error() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        assert!(matches!(
            block_on(storage.load("broken")),
            Err(StorageError::Serialization(_))
        ));
    }
}
