use crate::error::{ConvError, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_POLL: Duration = Duration::from_millis(100);

/// True when the file name of `path` mentions `octave` (`octave.exe`,
/// `octave-cli`, `octave-cli-7.2.0`, ...).
pub fn looks_like_octave(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.to_ascii_lowercase().contains("octave"))
}

/// Resolve `path` to an existing file. Bare names are looked up on `PATH`.
fn resolve(path: &Path) -> Option<PathBuf> {
    let bare = path.components().count() == 1 && !path.is_absolute();
    if bare {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        let search = env::var_os("PATH")?;
        return env::split_paths(&search)
            .flat_map(|dir| candidates(&dir, path))
            .find(|p| p.is_file());
    }
    path.is_file().then(|| path.to_path_buf())
}

fn candidates(dir: &Path, name: &Path) -> Vec<PathBuf> {
    let plain = dir.join(name);
    if cfg!(windows) && plain.extension().is_none() {
        vec![plain.with_extension("exe"), plain]
    } else {
        vec![plain]
    }
}

/// Wait until `path` names an existing Octave executable.
///
/// A missing file is retried every `poll` until `timeout`. A name that is not
/// Octave fails straight away.
pub fn wait_for_executable(path: &Path, timeout: Duration, poll: Duration) -> Result<PathBuf> {
    if !looks_like_octave(path) {
        return Err(ConvError::NotOctave(path.to_path_buf()));
    }
    let t0 = Instant::now();
    loop {
        if let Some(found) = resolve(path) {
            tracing::debug!(
                "octave executable {} found after {:?}",
                found.display(),
                t0.elapsed()
            );
            return Ok(found);
        }
        if t0.elapsed() >= timeout {
            return Err(ConvError::ExecutableNotFound {
                path: path.to_path_buf(),
                waited_secs: timeout.as_secs(),
            });
        }
        thread::sleep(poll.min(timeout.saturating_sub(t0.elapsed())));
    }
}
