//! Writing rendered artifacts.
//!
//! The destination is checked before any generation work starts; writes
//! happen only once every artifact is in memory, one file per rayon task.
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::emit::{Artifact, Bindings};
use crate::error::OutputError;

#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Validate an existing, writable directory.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, OutputError> {
        let root = path.into();
        let metadata = match std::fs::metadata(&root) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(OutputError::NotADirectory(root));
            }
            Err(source) => return Err(OutputError::Inspect { path: root, source }),
        };
        if !metadata.is_dir() {
            return Err(OutputError::NotADirectory(root));
        }
        if metadata.permissions().readonly() {
            return Err(OutputError::ReadOnly(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write(&self, artifact: &Artifact) -> Result<PathBuf, OutputError> {
        let path = self.root.join(&artifact.file_name);
        std::fs::write(&path, &artifact.contents)
            .map_err(|source| OutputError::Write { path: path.clone(), source })?;
        log::debug!("wrote {}", path.display());
        Ok(path)
    }

    /// Write the declaration document and every unit. Returns the written paths,
    /// declaration document first.
    pub fn write_all(&self, bindings: &Bindings) -> Result<Vec<PathBuf>, OutputError> {
        let artifacts: Vec<&Artifact> = bindings.artifacts().collect();
        artifacts
            .par_iter()
            .map(|artifact| self.write(artifact))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Bindings {
        Bindings {
            header: Artifact { file_name: "API.h".into(), contents: "#pragma once\n".into() },
            units: vec![
                Artifact { file_name: "pkg.A.cpp".into(), contents: "// a\n".into() },
                Artifact { file_name: "pkg.Outer.Inner.cpp".into(), contents: "// inner\n".into() },
            ],
        }
    }

    #[test]
    fn writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutputDir::open(dir.path()).unwrap();
        let written = out.write_all(&sample()).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(written[0], dir.path().join("API.h"));
        assert_eq!(std::fs::read_to_string(dir.path().join("pkg.Outer.Inner.cpp")).unwrap(), "// inner\n");
    }

    #[test]
    fn rejects_missing_and_non_directories() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(OutputDir::open(&missing), Err(OutputError::NotADirectory(p)) if p == missing));

        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(OutputDir::open(&file), Err(OutputError::NotADirectory(_))));
    }

    #[test]
    fn rejects_read_only_directories() {
        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        let mut permissions = std::fs::metadata(&locked).unwrap().permissions();
        permissions.set_readonly(true);
        std::fs::set_permissions(&locked, permissions.clone()).unwrap();

        let result = OutputDir::open(&locked);

        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        std::fs::set_permissions(&locked, permissions).unwrap();
        assert!(matches!(result, Err(OutputError::ReadOnly(_))));
    }
}
