//! Filesystem primitives shared by every writer of the report tree.
//!
//! Several runner workers may write the same tree at once. Directories are
//! created with `create_dir_all` (tolerates existing paths) and whole files are
//! replaced with write-then-rename, so a reader sees either the old or the new
//! file and concurrent writers resolve to last-writer-wins.
//!
//! Screenshot relocation is the exception: it must never replace a file, so
//! [`copy_no_clobber`] and [`move_no_clobber`] let the filesystem refuse an
//! existing destination instead of checking for it first.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use uuid::Uuid;

/// Create `dir` and its parents; existing directories are fine.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Replace `path` with `bytes` through a hidden sibling temp file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_dir(parent)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "out".to_string());
    let tmp_path = parent.join(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

    fs::write(&tmp_path, bytes)?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    Ok(())
}

/// Copy `src` to a new file at `dest`.
///
/// Fails with `AlreadyExists` when `dest` is present, including one created
/// by another worker mid-copy. A partial `dest` is removed on error.
pub fn copy_no_clobber(src: &Path, dest: &Path) -> io::Result<u64> {
    let mut reader = fs::File::open(src)?;
    let mut writer = OpenOptions::new().write(true).create_new(true).open(dest)?;
    io::copy(&mut reader, &mut writer).map_err(|err| {
        let _ = fs::remove_file(dest);
        err
    })
}

/// Move `src` to `dest` without replacing an existing `dest`.
///
/// Links first, which the filesystem refuses with `AlreadyExists`, then drops
/// the source. Filesystems without hard links fall back to check-then-rename.
pub fn move_no_clobber(src: &Path, dest: &Path) -> io::Result<()> {
    match fs::hard_link(src, dest) {
        Ok(()) => fs::remove_file(src),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Err(err),
        Err(_) if dest.exists() => Err(io::Error::from(io::ErrorKind::AlreadyExists)),
        Err(_) => fs::rename(src, dest),
    }
}

/// Whether a directory entry is a PNG capture
pub fn is_png(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_no_clobber_keeps_existing_target() {
        let tmp = TempDir::new().unwrap();
        let (src, dest) = (tmp.path().join("a.png"), tmp.path().join("b.png"));
        fs::write(&src, b"new").unwrap();
        fs::write(&dest, b"old").unwrap();

        let err = copy_no_clobber(&src, &dest).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&dest).unwrap(), b"old");

        let fresh = tmp.path().join("c.png");
        assert_eq!(copy_no_clobber(&src, &fresh).unwrap(), 3);
        assert!(src.is_file());
    }

    #[test]
    fn test_move_no_clobber_keeps_both_files_on_conflict() {
        let tmp = TempDir::new().unwrap();
        let (src, dest) = (tmp.path().join("a.png"), tmp.path().join("b.png"));
        fs::write(&src, b"new").unwrap();
        fs::write(&dest, b"old").unwrap();

        let err = move_no_clobber(&src, &dest).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&dest).unwrap(), b"old");
        assert_eq!(fs::read(&src).unwrap(), b"new");
    }

    #[test]
    fn test_move_no_clobber_moves() {
        let tmp = TempDir::new().unwrap();
        let (src, dest) = (tmp.path().join("a.png"), tmp.path().join("b.png"));
        fs::write(&src, b"png").unwrap();

        move_no_clobber(&src, &dest).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"png");
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a/b/c");
        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_write_atomic_replaces_and_leaves_no_temp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/index.html");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let leftovers: Vec<_> = fs::read_dir(tmp.path().join("nested"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_is_png() {
        assert!(is_png(Path::new("a/b.png")));
        assert!(is_png(Path::new("B.PNG")));
        assert!(!is_png(Path::new("b.jpg")));
        assert!(!is_png(Path::new("png")));
    }
}
