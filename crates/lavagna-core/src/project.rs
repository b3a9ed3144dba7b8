//! Persisted whiteboard projects.

use crate::background::Background;
use crate::snapshot::{Snapshot, SnapshotError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Invalid board data: {0}")]
    Encoding(String),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("Board is {actual_width}x{actual_height}, project declares {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// A saved board: metadata plus the encoded buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project identifier.
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub background: Background,
    /// Base64 of the snapshot blob.
    pub board: String,
}

impl Project {
    /// Build a project from a board snapshot under a fresh id.
    pub fn new(
        name: impl Into<String>,
        snapshot: &Snapshot,
        background: Background,
    ) -> Result<Self, ProjectError> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            width: snapshot.width(),
            height: snapshot.height(),
            background,
            board: BASE64.encode(snapshot.to_png()?),
        })
    }

    /// Decode the board snapshot.
    pub fn snapshot(&self) -> Result<Snapshot, ProjectError> {
        let blob = BASE64
            .decode(self.board.as_bytes())
            .map_err(|e| ProjectError::Encoding(e.to_string()))?;
        let snapshot = Snapshot::from_png(&blob)?;
        if snapshot.width() != self.width || snapshot.height() != self.height {
            return Err(ProjectError::DimensionMismatch {
                width: self.width,
                height: self.height,
                actual_width: snapshot.width(),
                actual_height: snapshot.height(),
            });
        }
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::BackgroundPattern;
    use crate::color::InkColor;

    fn snapshot() -> Snapshot {
        let pixels = (0..6 * 4 * 4).map(|i| if i % 4 == 3 { 255 } else { i as u8 }).collect();
        Snapshot::from_premultiplied(6, 4, pixels).unwrap()
    }

    #[test]
    fn test_project_json_roundtrip() {
        let background = Background {
            pattern: BackgroundPattern::Grid,
            color: InkColor::rgb(250, 250, 240),
        };
        let project = Project::new("Lesson 1", &snapshot(), background).unwrap();
        let json = project.to_json().unwrap();
        let loaded = Project::from_json(&json).unwrap();

        assert_eq!(loaded, project);
        assert_eq!(loaded.snapshot().unwrap(), snapshot());
    }

    #[test]
    fn test_unique_ids() {
        let a = Project::new("a", &snapshot(), Background::default()).unwrap();
        let b = Project::new("b", &snapshot(), Background::default()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_corrupt_board() {
        let mut project = Project::new("x", &snapshot(), Background::default()).unwrap();
        project.board = "!!! not base64".to_string();
        assert!(matches!(project.snapshot(), Err(ProjectError::Encoding(_))));

        project.board = BASE64.encode(b"not a png");
        assert!(matches!(project.snapshot(), Err(ProjectError::Snapshot(_))));
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut project = Project::new("x", &snapshot(), Background::default()).unwrap();
        project.width = 10;
        assert!(matches!(
            project.snapshot(),
            Err(ProjectError::DimensionMismatch { width: 10, .. })
        ));
    }

    #[test]
    fn test_missing_background_defaults() {
        let project = Project::new("x", &snapshot(), Background::default()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&project.to_json().unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("background");
        let loaded: Project = serde_json::from_value(value).unwrap();
        assert_eq!(loaded.background, Background::default());
    }
}
