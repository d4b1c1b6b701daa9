//! Owner-only permissions for persisted state
//!
//! The persisted configuration carries the admin password in clear, so the
//! state file is kept at 0o600 and its directory at 0o700. On non-Unix
//! platforms these are no-ops and the platform ACLs apply.

use crate::error::{Error, Result};
use std::path::Path;

#[cfg(unix)]
fn restrict(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?
        .permissions();
    perms.set_mode(mode);

    std::fs::set_permissions(path, perms).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Restrict a state file to its owner (0o600)
#[cfg(unix)]
pub fn set_secure_file_permissions(path: &Path) -> Result<()> {
    restrict(path, 0o600)
}

/// Restrict a state directory to its owner (0o700)
#[cfg(unix)]
pub fn set_secure_dir_permissions(path: &Path) -> Result<()> {
    restrict(path, 0o700)
}

#[cfg(not(unix))]
pub fn set_secure_file_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(not(unix))]
pub fn set_secure_dir_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Create the state directory if needed and restrict it.
///
/// Existing directories are left as they are so a host-provided mount keeps
/// the permissions the host chose.
pub fn ensure_secure_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() || path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| Error::DirectoryCreate {
        path: path.to_path_buf(),
        source: e,
    })?;
    set_secure_dir_permissions(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    fn mode_of(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[test]
    fn test_new_state_dir_is_restricted() {
        let dir = tempdir().unwrap();
        let state_dir = dir.path().join("state/nested");

        ensure_secure_dir(&state_dir).unwrap();
        assert!(state_dir.is_dir());

        #[cfg(unix)]
        assert_eq!(mode_of(&state_dir), 0o700);
    }

    #[test]
    fn test_state_file_is_restricted() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("config.yaml");
        std::fs::write(&file, "version: 0.1.0.1").unwrap();

        set_secure_file_permissions(&file).unwrap();

        #[cfg(unix)]
        assert_eq!(mode_of(&file), 0o600);
    }

    #[test]
    fn test_missing_file_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        #[cfg(unix)]
        assert!(matches!(
            set_secure_file_permissions(&missing),
            Err(Error::FileRead { .. })
        ));
        #[cfg(not(unix))]
        let _ = missing;
    }
}
