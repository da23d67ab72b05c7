use crate::error::GuardrailCode;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "data";

/// Confines reads to `<workspace_root>/<data_dir>`.
///
/// Requests name paths relative to the workspace root (`data/sample.txt`).
/// Containment is checked structurally on path components, first on the
/// lexically normalized path and again after symlink resolution.
#[derive(Debug, Clone)]
pub struct DataDirGuard {
    workspace_root: PathBuf,
    data_root: PathBuf,
}

impl DataDirGuard {
    pub fn new(workspace_root: impl AsRef<Path>, data_dir: impl AsRef<Path>) -> io::Result<Self> {
        let workspace_root = fs::canonicalize(workspace_root)?;
        let lexical = normalize(&workspace_root.join(data_dir));
        // the data dir may be created after startup
        let data_root = fs::canonicalize(&lexical).unwrap_or(lexical);
        Ok(Self {
            workspace_root,
            data_root,
        })
    }

    /// The requested path with `.` and `..` resolved, before any symlink
    /// is followed.
    pub fn lexical(&self, relative: &str) -> PathBuf {
        normalize(&self.workspace_root.join(relative))
    }

    pub fn resolve(&self, relative: &str) -> Result<PathBuf, GuardrailCode> {
        let candidate = self.lexical(relative);
        if !candidate.starts_with(&self.data_root) {
            return Err(GuardrailCode::PathOutsideDataDir);
        }

        match fs::canonicalize(&candidate) {
            Ok(real) if real.starts_with(&self.data_root) => Ok(real),
            Ok(_) => Err(GuardrailCode::PathOutsideDataDir),
            // existence is reported by the caller
            Err(_) => Ok(candidate),
        }
    }
}

/// Resolves `.` and `..` without touching the filesystem. `..` never climbs
/// above the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str())
            }
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> (tempfile::TempDir, DataDirGuard) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data/nested")).unwrap();
        fs::write(dir.path().join("data/sample.txt"), "hello").unwrap();
        fs::write(dir.path().join("outside.txt"), "nope").unwrap();
        let guard = DataDirGuard::new(dir.path(), DEFAULT_DATA_DIR).unwrap();
        (dir, guard)
    }

    #[test]
    fn test_inside_data_dir() {
        let (_dir, guard) = workspace();
        let resolved = guard.resolve("data/sample.txt").unwrap();
        assert!(resolved.ends_with("data/sample.txt"));
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, guard) = workspace();
        assert_eq!(
            guard.resolve("../../etc/passwd"),
            Err(GuardrailCode::PathOutsideDataDir)
        );
        assert_eq!(
            guard.resolve("data/../outside.txt"),
            Err(GuardrailCode::PathOutsideDataDir)
        );
    }

    #[test]
    fn test_absolute_path_rejected() {
        let (_dir, guard) = workspace();
        assert_eq!(
            guard.resolve("/etc/passwd"),
            Err(GuardrailCode::PathOutsideDataDir)
        );
    }

    #[test]
    fn test_sibling_with_common_prefix_rejected() {
        let (dir, guard) = workspace();
        fs::create_dir_all(dir.path().join("database")).unwrap();
        fs::write(dir.path().join("database/x.txt"), "x").unwrap();
        assert_eq!(
            guard.resolve("database/x.txt"),
            Err(GuardrailCode::PathOutsideDataDir)
        );
    }

    #[test]
    fn test_missing_file_passes_containment() {
        let (_dir, guard) = workspace();
        assert!(guard.resolve("data/nested/missing.txt").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (dir, guard) = workspace();
        std::os::unix::fs::symlink(dir.path().join("outside.txt"), dir.path().join("data/link"))
            .unwrap();
        assert_eq!(
            guard.resolve("data/link"),
            Err(GuardrailCode::PathOutsideDataDir)
        );
    }

    #[test]
    fn test_lexical_drops_trailing_dot() {
        let (_dir, guard) = workspace();
        assert!(guard.lexical("data/sample.txt/.").ends_with("data/sample.txt"));
        assert!(guard.lexical("data/sample.txt/").ends_with("data/sample.txt"));
    }

    #[test]
    fn test_normalize_does_not_climb_past_root() {
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
    }
}
