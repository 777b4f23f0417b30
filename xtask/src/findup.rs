use std::path::{Path, PathBuf};

/// Walk from `start` towards the filesystem root and return the first
/// directory for which `is_root` holds.
fn find_upwards(start: &Path, is_root: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    let mut dir = if start.is_dir() {
        start.to_path_buf()
    } else {
        start.parent().unwrap_or(start).to_path_buf()
    };

    loop {
        if is_root(&dir) {
            return Some(dir);
        }

        if !dir.pop() {
            break;
        }
    }

    None
}

/// A directory whose `Cargo.toml` declares a `[workspace]`.
fn is_workspace_dir(dir: &Path) -> bool {
    std::fs::read_to_string(dir.join("Cargo.toml"))
        .map(|manifest| manifest.lines().any(|l| l.trim() == "[workspace]"))
        .unwrap_or(false)
}

pub fn workspace_root() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let start = std::env::current_dir()?;
    find_upwards(&start, is_workspace_dir)
        .or_else(|| find_upwards(Path::new(env!("CARGO_MANIFEST_DIR")), is_workspace_dir))
        .ok_or_else(|| "workspace Cargo.toml not found (run from within the repo or pass --config)".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_workspace_from_nested_dir() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(
            root.path().join("Cargo.toml"),
            "[workspace]\nmembers = [\"a\"]\n",
        )
        .unwrap();
        let nested = root.path().join("a/src");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join("a/Cargo.toml"), "[package]\nname = \"a\"\n").unwrap();

        let found = find_upwards(&nested, is_workspace_dir).unwrap();
        assert_eq!(found, root.path());
    }

    #[test]
    fn test_own_workspace_is_found() {
        let root = workspace_root().unwrap();
        assert!(root.join("sweep.yaml").exists());
    }
}
