use std::path::Path;

use crate::{EarshotError, Result};

/// Check that a local audio file exists, is a regular file, and is non-empty.
pub fn validate_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(
            EarshotError::InvalidInput(format!("file does not exist: {}", path.display())).into(),
        );
    }

    if !path.is_file() {
        return Err(
            EarshotError::InvalidInput(format!("path is not a file: {}", path.display())).into(),
        );
    }

    let metadata = fs_err::metadata(path)
        .map_err(|e| EarshotError::FileError(format!("cannot access {}: {}", path.display(), e)))?;

    if metadata.len() == 0 {
        return Err(EarshotError::InvalidInput(format!("file is empty: {}", path.display())).into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_missing_file() {
        let err = validate_file(Path::new("/no/such/file.mp3")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_validate_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = validate_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_validate_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_file(dir.path()).unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }

    #[test]
    fn test_validate_regular_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"audio").unwrap();
        assert!(validate_file(file.path()).is_ok());
    }
}
