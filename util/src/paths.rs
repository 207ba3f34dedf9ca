use std::{fs, io, path::{Path, PathBuf}};

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

/// Ensure the parent directory of a *file path* exists (no-op if none).
pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_parent_dir_creates_missing_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("nested").join("deeper").join("db.sqlite");
        ensure_parent_dir(&file).unwrap();
        assert!(tmp.path().join("nested").join("deeper").is_dir());
    }

    #[test]
    fn ensure_dir_returns_the_created_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = ensure_dir(tmp.path().join("logs")).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn ensure_parent_dir_accepts_bare_file_names() {
        assert!(ensure_parent_dir("gamification.db").is_ok());
    }
}
