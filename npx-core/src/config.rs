//! Run configuration.
//!
//! The Octave executable is resolved in this order:
//! 1. command-line argument
//! 2. `NPX_OCTAVE`, then `OCTAVE_EXECUTABLE` environment variables
//! 3. `octave_executable` in the TOML config file
//! 4. the Octave bundled next to the binary

use crate::error::{ConvError, Result};
use crate::octave::EXECUTABLE_ENV;
use crate::octave::locate::DEFAULT_TIMEOUT;
use crate::snapshot::SnapshotFormat;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const OCTAVE_ENV: &str = "NPX_OCTAVE";
pub const CONFIG_FILE_NAME: &str = "npxconv.toml";
pub const DEFAULT_RECORDS_DIR: &str = "eingelegt";
pub const DEFAULT_MATFILES_DIR: &str = "matfiles";
pub const SCRIPTS_DIR_NAME: &str = "matlab_scripts";

/// Optional settings read from `npxconv.toml`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub octave_executable: Option<PathBuf>,
    pub scripts_dir: Option<PathBuf>,
    pub records_dir: Option<String>,
    pub matfiles_dir: Option<String>,
    pub format: Option<SnapshotFormat>,
    pub locate_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConvError::Config(e.to_string()))
    }

    /// Load `explicit` if given (must exist), else `<workdir>/npxconv.toml`
    /// if present, else defaults.
    pub fn load(explicit: Option<&Path>, workdir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let p = workdir.join(CONFIG_FILE_NAME);
                if !p.is_file() {
                    return Ok(Self::default());
                }
                p
            }
        };
        let text = fs::read_to_string(&path)
            .map_err(|e| ConvError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!("loaded config {}", path.display());
        Self::parse(&text).map_err(|e| match e {
            ConvError::Config(msg) => ConvError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }
}

/// Values given on the command line; `None` means "not given".
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub workdir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub octave: Option<PathBuf>,
    pub scripts: Option<PathBuf>,
    pub records_dir: Option<String>,
    pub matfiles_dir: Option<String>,
    pub format: Option<SnapshotFormat>,
    pub timeout_secs: Option<u64>,
    pub keep_going: bool,
}

/// Everything one pipeline run needs, fully resolved.
#[derive(Clone, Debug)]
pub struct ConvertConfig {
    pub workdir: PathBuf,
    pub octave: PathBuf,
    pub scripts_dir: PathBuf,
    pub records_dir: PathBuf,
    pub matfiles_dir: PathBuf,
    pub format: SnapshotFormat,
    pub locate_timeout: Duration,
    pub keep_going: bool,
}

impl ConvertConfig {
    /// Defaults for `workdir` with the bundled Octave layout under `install_dir`.
    pub fn with_defaults(workdir: PathBuf, install_dir: &Path) -> Self {
        Self {
            records_dir: workdir.join(DEFAULT_RECORDS_DIR),
            matfiles_dir: workdir.join(DEFAULT_MATFILES_DIR),
            octave: bundled_octave(install_dir),
            scripts_dir: install_dir.join(SCRIPTS_DIR_NAME),
            workdir,
            format: SnapshotFormat::default(),
            locate_timeout: DEFAULT_TIMEOUT,
            keep_going: false,
        }
    }

    pub fn resolve(ov: Overrides, install_dir: &Path) -> Result<Self> {
        // Octave runs inside the workdir and is also told to save there
        let workdir = match ov.workdir {
            Some(w) => std::path::absolute(w)?,
            None => env::current_dir()?,
        };
        let file = FileConfig::load(ov.config.as_deref(), &workdir)?;
        let mut cfg = Self::with_defaults(workdir, install_dir);

        cfg.octave = resolve_octave(ov.octave, &file, install_dir);
        if let Some(s) = ov.scripts.or(file.scripts_dir) {
            cfg.scripts_dir = s;
        }
        if let Some(d) = ov.records_dir.or(file.records_dir) {
            cfg.records_dir = cfg.workdir.join(d);
        }
        if let Some(d) = ov.matfiles_dir.or(file.matfiles_dir) {
            cfg.matfiles_dir = cfg.workdir.join(d);
        }
        if let Some(f) = ov.format.or(file.format) {
            cfg.format = f;
        }
        if let Some(secs) = ov.timeout_secs.or(file.locate_timeout_secs) {
            cfg.locate_timeout = Duration::from_secs(secs);
        }
        cfg.keep_going = ov.keep_going;
        Ok(cfg)
    }
}

pub fn resolve_octave(cli: Option<PathBuf>, file: &FileConfig, install_dir: &Path) -> PathBuf {
    if let Some(p) = cli {
        return p;
    }
    for var in [OCTAVE_ENV, EXECUTABLE_ENV] {
        if let Some(p) = env::var_os(var).filter(|v| !v.is_empty()) {
            return PathBuf::from(p);
        }
    }
    if let Some(p) = &file.octave_executable {
        return p.clone();
    }
    bundled_octave(install_dir)
}

/// `<install>/octave/mingw64/bin/octave-cli[.exe]`
pub fn bundled_octave(install_dir: &Path) -> PathBuf {
    let exe = if cfg!(windows) {
        "octave-cli.exe"
    } else {
        "octave-cli"
    };
    install_dir
        .join("octave")
        .join("mingw64")
        .join("bin")
        .join(exe)
}

/// Directory of the running binary, falling back to the current directory.
pub fn install_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let cfg = FileConfig::parse(
            r#"
            octave_executable = "/opt/octave/bin/octave-cli"
            scripts_dir = "/opt/npx/matlab_scripts"
            records_dir = "records"
            matfiles_dir = "mats"
            format = "cbor"
            locate_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.format, Some(SnapshotFormat::Cbor));
        assert_eq!(cfg.locate_timeout_secs, Some(5));
        assert_eq!(cfg.records_dir.as_deref(), Some("records"));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_format() {
        assert!(FileConfig::parse("octave = \"x\"").is_err());
        assert!(FileConfig::parse("format = \"pickle\"").is_err());
    }

    #[test]
    fn missing_default_file_is_fine_missing_explicit_is_not() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            FileConfig::load(None, dir.path()).unwrap(),
            FileConfig::default()
        );
        let missing = dir.path().join("nope.toml");
        let err = FileConfig::load(Some(missing.as_path()), dir.path()).unwrap_err();
        assert!(matches!(err, ConvError::Config(_)));
    }

    #[test]
    fn parse_errors_name_the_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "format = [").unwrap();
        let err = FileConfig::load(None, dir.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(&path.display().to_string()), "{msg}");
        assert_eq!(msg.matches("Config error").count(), 1, "{msg}");
    }

    #[test]
    fn bundled_layout() {
        let p = bundled_octave(Path::new("/opt/npx"));
        assert!(p.starts_with("/opt/npx/octave/mingw64/bin"));
        assert!(crate::octave::looks_like_octave(&p));
    }
}
