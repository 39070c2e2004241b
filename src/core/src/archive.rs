//! Packs a raw build directory into an in-memory tar stream.

use std::path::Path;

use crate::error::{BuildError, Result};

/// Create a tar archive of everything under `dir`, rooted at `.`.
pub fn create_tar_stream(dir: &Path) -> Result<Vec<u8>> {
    let archive_error = |message: String| BuildError::ArchiveCreation {
        path: dir.display().to_string(),
        message,
    };

    if !dir.is_dir() {
        return Err(archive_error("no such directory".to_string()));
    }

    let mut builder = tar::Builder::new(Vec::new());
    builder
        .append_dir_all(".", dir)
        .map_err(|e| archive_error(e.to_string()))?;
    let data = builder
        .into_inner()
        .map_err(|e| archive_error(e.to_string()))?;

    tracing::debug!(path = %dir.display(), bytes = data.len(), "Created build archive");
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_create_tar_stream() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("Dockerfile"), "FROM alpine").unwrap();
        fs::create_dir(src.path().join("app")).unwrap();
        fs::write(src.path().join("app").join("main.sh"), "echo hi").unwrap();

        let data = create_tar_stream(src.path()).unwrap();
        assert!(!data.is_empty());

        let mut archive = tar::Archive::new(data.as_slice());
        let mut found = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().into_owned();
            if path.ends_with("main.sh") {
                let mut content = String::new();
                entry.read_to_string(&mut content).unwrap();
                assert_eq!(content, "echo hi");
            }
            found.push(path);
        }

        assert!(found.iter().any(|p| p.ends_with("Dockerfile")));
        assert!(found.iter().any(|p| p.ends_with("app/main.sh")));
    }

    #[test]
    fn test_create_tar_stream_missing_dir() {
        let src = TempDir::new().unwrap();
        let missing = src.path().join("nope");
        let result = create_tar_stream(&missing);
        assert!(matches!(result, Err(BuildError::ArchiveCreation { .. })));
    }

    #[test]
    fn test_create_tar_stream_file_path() {
        let src = TempDir::new().unwrap();
        let file = src.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(create_tar_stream(&file).is_err());
    }
}
