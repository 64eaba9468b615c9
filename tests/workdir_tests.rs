//! Working directory provisioning and wiping

use gitpin::workdir::{WipeSummary, ensure_exists, is_empty_dir, wipe};
use tempfile::TempDir;

#[test]
fn test_ensure_exists_creates_nested_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a").join("b").join("work");

    ensure_exists(&path).unwrap();
    assert!(path.is_dir());

    // Already present is fine
    ensure_exists(&path).unwrap();
    assert!(is_empty_dir(&path));
}

#[cfg(unix)]
#[test]
fn test_ensure_exists_uses_group_readable_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("work");
    ensure_exists(&path).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    // The process umask can only clear bits
    assert_eq!(mode & !0o755, 0);
    assert_eq!(mode & 0o700, 0o700);
}

#[test]
fn test_ensure_exists_fails_on_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("work");
    std::fs::write(&path, "not a dir").unwrap();

    assert!(ensure_exists(&path).is_err());
}

#[test]
fn test_wipe_removes_nested_tree_and_root() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("work");
    std::fs::create_dir_all(root.join(".git").join("objects")).unwrap();
    std::fs::write(root.join(".git").join("objects").join("pack"), b"half").unwrap();
    std::fs::write(root.join("README"), "hello").unwrap();

    let summary = wipe(&root);

    // root, .git, objects, pack, README
    assert_eq!(summary, WipeSummary { removed: 5, failed: 0 });
    assert!(summary.is_clean());
    assert!(!root.exists());
    assert!(dir.path().exists());
}

#[test]
fn test_wipe_missing_path_is_a_no_op() {
    let dir = TempDir::new().unwrap();

    let summary = wipe(&dir.path().join("never-created"));

    assert_eq!(summary, WipeSummary::default());
    assert!(summary.is_clean());
}

#[test]
fn test_wipe_single_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stray");
    std::fs::write(&path, "x").unwrap();

    assert_eq!(wipe(&path).removed, 1);
    assert!(!path.exists());
}

#[test]
fn test_is_empty_dir() {
    let dir = TempDir::new().unwrap();
    let work = dir.path().join("work");

    assert!(is_empty_dir(&work), "missing path counts as empty");

    std::fs::create_dir(&work).unwrap();
    assert!(is_empty_dir(&work));

    std::fs::write(work.join(".hidden"), "").unwrap();
    assert!(!is_empty_dir(&work));

    let file = dir.path().join("file");
    std::fs::write(&file, "x").unwrap();
    assert!(!is_empty_dir(&file), "a file is not an empty directory");
}
