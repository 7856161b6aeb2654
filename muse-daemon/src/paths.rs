use std::path::{Path, PathBuf};

use crate::error::DaemonError;

pub const SOCKET_NAME: &str = "muse-status.sock";
/// Under `$HOME` when there is no runtime directory.
pub const FALLBACK_DIR: &str = ".muse-status";

/// `$XDG_RUNTIME_DIR/muse-status.sock`, else `~/.muse-status/muse-status.sock`.
pub fn socket_path_at(runtime_dir: Option<&Path>, home: &Path) -> PathBuf {
    match runtime_dir {
        Some(dir) => dir.join(SOCKET_NAME),
        None => home.join(FALLBACK_DIR).join(SOCKET_NAME),
    }
}

pub fn default_socket_path() -> Result<PathBuf, DaemonError> {
    let home = dirs::home_dir().ok_or(DaemonError::NoSocketDir)?;
    Ok(socket_path_at(dirs::runtime_dir().as_deref(), &home))
}

/// The configured override, or the default location.
pub fn socket_path(configured: Option<&Path>) -> Result<PathBuf, DaemonError> {
    match configured {
        Some(path) => Ok(path.to_path_buf()),
        None => default_socket_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_runtime_dir() {
        let path = socket_path_at(Some(Path::new("/run/user/1000")), Path::new("/home/me"));
        assert_eq!(path, PathBuf::from("/run/user/1000/muse-status.sock"));
    }

    #[test]
    fn falls_back_to_home() {
        let path = socket_path_at(None, Path::new("/home/me"));
        assert_eq!(path, PathBuf::from("/home/me/.muse-status/muse-status.sock"));
    }

    #[test]
    fn override_wins() {
        let path = socket_path(Some(Path::new("/tmp/bar.sock"))).expect("path");
        assert_eq!(path, PathBuf::from("/tmp/bar.sock"));
    }
}
