//! Lavagna headless host.
//!
//! Stands in for the browser shell: loads configuration, replays gesture
//! scripts on a [`lavagna_core::Canvas`] and persists the result.

pub mod cli;
pub mod script;

use anyhow::{Context, Result};
use cli::{ListArgs, RunArgs};
use lavagna_core::storage::{FileStorage, ProjectSummary, Storage};
use lavagna_core::{Canvas, CanvasConfig, Project};
use std::path::Path;

/// Replay a script and write its outputs.
pub fn run(args: &RunArgs) -> Result<Canvas> {
    let fallback = match &args.config {
        Some(path) => CanvasConfig::load(path)?,
        None => CanvasConfig::default(),
    };
    let script = script::Script::load(&args.script)?;
    let mut canvas = script.canvas(&fallback)?;

    if let Some(path) = &args.load {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read project {}", path.display()))?;
        let project = Project::from_json(&json)?;
        canvas.load_project(&project)?;
    }

    let base_dir = args.script.parent().unwrap_or(Path::new("."));
    script::replay(&mut canvas, &script.steps, base_dir)?;

    if let Some(path) = &args.output {
        std::fs::write(path, canvas.export_png()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {}", path.display());
    }

    if args.project.is_some() || args.save {
        let project = canvas.to_project(&args.name)?;
        if let Some(path) = &args.project {
            std::fs::write(path, project.to_json()?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote project {}", path.display());
        }
        if args.save {
            let storage = open_storage(args.store.as_deref())?;
            pollster::block_on(storage.save(&project.id, &project))?;
            log::info!("Saved project {} to {}", project.id, storage.base_path().display());
        }
    }
    Ok(canvas)
}

/// Projects in the store, sorted by name.
pub fn list(args: &ListArgs) -> Result<Vec<ProjectSummary>> {
    let storage = open_storage(args.store.as_deref())?;
    Ok(pollster::block_on(storage.summaries())?)
}

fn open_storage(dir: Option<&Path>) -> Result<FileStorage> {
    let storage = match dir {
        Some(dir) => FileStorage::new(dir.to_path_buf())?,
        None => FileStorage::default_location()?,
    };
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lavagna_core::Snapshot;

    fn run_args(dir: &Path) -> RunArgs {
        RunArgs {
            script: dir.join("script.json"),
            config: None,
            load: None,
            output: Some(dir.join("board.png")),
            project: Some(dir.join("board.json")),
            name: "Test".to_string(),
            save: true,
            store: Some(dir.join("store")),
        }
    }

    #[test]
    fn test_run_writes_outputs_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("script.json"),
            r#"{
                "config": {"width": 64, "height": 48},
                "steps": [{"action": "stroke", "points": [{"x": 4, "y": 4}, {"x": 60, "y": 44}]}]
            }"#,
        )
        .unwrap();

        let args = run_args(dir.path());
        let canvas = run(&args).unwrap();
        assert_eq!(canvas.history().len(), 2);

        let png = std::fs::read(dir.path().join("board.png")).unwrap();
        let flat = Snapshot::from_png(&png).unwrap();
        assert_eq!((flat.width(), flat.height()), (64, 48));

        let json = std::fs::read_to_string(dir.path().join("board.json")).unwrap();
        let project = Project::from_json(&json).unwrap();
        assert_eq!(project.name, "Test");

        let listed = list(&ListArgs {
            store: Some(dir.path().join("store")),
        })
        .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, project.id);
        assert_eq!(listed[0].name, "Test");
        assert_eq!((listed[0].width, listed[0].height), (64, 48));
    }

    #[test]
    fn test_run_continues_loaded_project() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("script.json"),
            r#"{
                "config": {"width": 40, "height": 30},
                "steps": [{"action": "stroke", "points": [{"x": 1, "y": 1}, {"x": 30, "y": 1}]}]
            }"#,
        )
        .unwrap();
        let mut args = run_args(dir.path());
        args.save = false;
        let first = run(&args).unwrap();

        args.load = Some(dir.path().join("board.json"));
        args.project = Some(dir.path().join("second.json"));
        let second = run(&args).unwrap();
        assert_eq!((second.width(), second.height()), (first.width(), first.height()));
        assert_eq!(second.history().len(), 2);

        let read = |name: &str| {
            let json = std::fs::read_to_string(dir.path().join(name)).unwrap();
            Project::from_json(&json).unwrap()
        };
        assert_eq!(read("board.json").id, read("second.json").id);
    }

    #[test]
    fn test_missing_script_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&run_args(dir.path())).is_err());
    }
}
