//! Loading of scene, skeleton, and configuration documents.
//!
//! Every document the CLI reads is JSON. Loaders return [`InputError`] so
//! that commands can report a stable code in `--json` mode.

use std::fs;
use std::path::{Path, PathBuf};

use mechrig_core::{RigConfig, RigConventions, RigError, SceneDocument, SceneInput, Skeleton};
use thiserror::Error;

/// Failure while loading an input document.
#[derive(Debug, Error)]
pub enum InputError {
    /// File could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid JSON for the expected document.
    #[error("JSON parse error in '{}': {message}", path.display())]
    JsonParse { path: PathBuf, message: String },

    /// Document parsed but does not describe a usable scene or config.
    #[error(transparent)]
    Rig(#[from] RigError),
}

fn read(path: &Path) -> Result<String, InputError> {
    fs::read_to_string(path).map_err(|source| InputError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_error(path: &Path, err: serde_json::Error) -> InputError {
    InputError::JsonParse {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Loads a scene document and resolves its selection.
pub fn load_scene(path: &Path) -> Result<SceneInput, InputError> {
    let json = read(path)?;
    let document = SceneDocument::from_json(&json).map_err(|e| parse_error(path, e))?;
    Ok(document.into_input()?)
}

/// Loads naming conventions, or the defaults when no file is given.
pub fn load_conventions(path: Option<&Path>) -> Result<RigConventions, InputError> {
    match path {
        Some(path) => {
            let json = read(path)?;
            RigConventions::from_json(&json).map_err(|e| parse_error(path, e))
        }
        None => Ok(RigConventions::default()),
    }
}

/// Loads a skeleton document.
pub fn load_skeleton(path: &Path) -> Result<Skeleton, InputError> {
    let json = read(path)?;
    Skeleton::from_json(&json).map_err(|e| parse_error(path, e))
}

/// Loads a control-rig configuration.
pub fn load_rig_config(path: &Path) -> Result<RigConfig, InputError> {
    let json = read(path)?;
    RigConfig::from_json(&json).map_err(|e| parse_error(path, e))
}

/// Writes a document to `path`, or to stdout when no path is given.
pub fn write_document(path: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, contents)?;
        }
        None => println!("{}", contents),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"{
        "nodes": [
            {"name": "Body", "group": "Body"},
            {"name": "Arm", "group": "Arm", "parent": "Body"}
        ],
        "selection": ["Body", "Arm"]
    }"#;

    #[test]
    fn test_load_scene() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scene.json");
        fs::write(&path, SCENE).unwrap();

        let input = load_scene(&path).unwrap();
        assert_eq!(input.selection.len(), 2);
        assert!(input.reflection_origin.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_scene(&tmp.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, InputError::FileRead { .. }));
    }

    #[test]
    fn test_load_malformed_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scene.json");
        fs::write(&path, "{ nodes: ").unwrap();

        let err = load_scene(&path).unwrap_err();
        assert!(matches!(err, InputError::JsonParse { .. }));
    }

    #[test]
    fn test_load_unresolvable_selection() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scene.json");
        fs::write(
            &path,
            r#"{"nodes": [{"name": "Body", "group": "Body"}], "selection": ["Ghost"]}"#,
        )
        .unwrap();

        match load_scene(&path).unwrap_err() {
            InputError::Rig(err) => assert_eq!(err.code(), "R004"),
            other => panic!("expected rig error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_conventions() {
        assert_eq!(load_conventions(None).unwrap(), RigConventions::default());
    }

    #[test]
    fn test_write_document_creates_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out").join("rig.json");
        write_document(Some(&path), "{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }
}
