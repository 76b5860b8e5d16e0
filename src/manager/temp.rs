//! Scoped temporary artifact for the intelligent export path

use std::path::Path;
use tempfile::NamedTempFile;

/// An `atlas-*.json` file that is removed when the guard is dropped
#[derive(Debug)]
pub struct TempArtifact {
    file: NamedTempFile,
}

impl TempArtifact {
    /// Create a uniquely named, empty `atlas-*.json` inside `dir`
    pub fn new(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let file = tempfile::Builder::new()
            .prefix("atlas-")
            .suffix(".json")
            .tempfile_in(dir)?;
        tracing::debug!("Created {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let artifact = TempArtifact::new(dir.path()).unwrap();
            fs::write(artifact.path(), "{}").unwrap();
            assert!(artifact.path().exists());
            artifact.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = TempArtifact::new(dir.path()).unwrap();
        let b = TempArtifact::new(dir.path()).unwrap();
        assert_ne!(a.path(), b.path());
        let name = a.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("atlas-") && name.ends_with(".json"));
    }

    #[test]
    fn test_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("scratch/atlas");
        let artifact = TempArtifact::new(&nested).unwrap();
        assert_eq!(artifact.path().parent(), Some(nested.as_path()));
    }

    #[test]
    fn test_removed_during_unwind() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = dir.path().to_path_buf();
        let result = std::panic::catch_unwind(move || {
            let artifact = TempArtifact::new(&dir_path).unwrap();
            fs::write(artifact.path(), "{}").unwrap();
            panic!("render crashed");
        });
        assert!(result.is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
