use std::io;
use std::path::Path;

/// Removes a socket file left behind by a previous run so the path can be
/// bound again. Returns whether a file was removed.
pub fn remove_stale_socket(path: impl AsRef<Path>) -> io::Result<bool> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::info!("Deleted the stale socket file {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("No stale socket file at {}", path.display());
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backend.sock");
        std::fs::write(&path, b"").unwrap();

        assert!(remove_stale_socket(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!remove_stale_socket(dir.path().join("absent.sock")).unwrap());
    }
}
