use crate::error::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelocateReport {
    pub moved: Vec<String>,
    /// Left in place because the destination already had a file of that name.
    pub skipped: Vec<String>,
}

/// Create `dir` (and parents). An existing directory is fine.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Move each named file from `from` into `to`, never overwriting.
pub fn relocate(files: &[String], from: &Path, to: &Path) -> Result<RelocateReport> {
    let mut report = RelocateReport::default();
    for name in files {
        let src = from.join(name);
        let dst = to.join(name);
        if dst.exists() {
            tracing::warn!(
                "cannot move {name}: {} already has it",
                to.display()
            );
            report.skipped.push(name.clone());
            continue;
        }
        fs::rename(&src, &dst)?;
        tracing::debug!("moved {} -> {}", src.display(), dst.display());
        report.moved.push(name.clone());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dir_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let d = root.path().join("eingelegt");
        ensure_dir(&d).unwrap();
        ensure_dir(&d).unwrap();
        assert!(d.is_dir());
    }

    #[test]
    fn ensure_dir_fails_over_a_file() {
        let root = tempfile::tempdir().unwrap();
        let f = root.path().join("matfiles");
        fs::write(&f, b"x").unwrap();
        assert!(ensure_dir(&f).is_err());
    }

    #[test]
    fn relocate_skips_existing_destinations() {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("matfiles");
        ensure_dir(&dest).unwrap();
        fs::write(root.path().join("a.mat"), b"new").unwrap();
        fs::write(root.path().join("b.mat"), b"new").unwrap();
        fs::write(dest.join("a.mat"), b"old").unwrap();

        let files = vec!["a.mat".to_string(), "b.mat".to_string()];
        let report = relocate(&files, root.path(), &dest).unwrap();
        assert_eq!(report.moved, vec!["b.mat"]);
        assert_eq!(report.skipped, vec!["a.mat"]);
        assert_eq!(fs::read(dest.join("a.mat")).unwrap(), b"old");
        assert!(root.path().join("a.mat").exists());
        assert!(!root.path().join("b.mat").exists());
    }
}
