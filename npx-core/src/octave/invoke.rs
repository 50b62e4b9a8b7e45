use super::locate::{DEFAULT_POLL, wait_for_executable};
use super::{CONVERT_ROUTINE, Converter, EXECUTABLE_ENV};
use crate::config::ConvertConfig;
use crate::error::{ConvError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Runs the conversion routine in a fresh `octave-cli` child per file.
#[derive(Clone, Debug)]
pub struct OctaveConverter {
    pub executable: PathBuf,
    /// Directory holding `loadEEG.m` and its helpers.
    pub scripts_dir: PathBuf,
    pub routine: String,
}

impl OctaveConverter {
    pub fn new(executable: PathBuf, scripts_dir: PathBuf) -> Self {
        Self {
            executable,
            scripts_dir,
            routine: CONVERT_ROUTINE.to_owned(),
        }
    }

    /// Wait for the configured executable, then build a converter around it.
    pub fn from_config(cfg: &ConvertConfig) -> Result<Self> {
        let executable = wait_for_executable(&cfg.octave, cfg.locate_timeout, DEFAULT_POLL)?;
        if !cfg.scripts_dir.is_dir() {
            tracing::warn!(
                "scripts directory {} does not exist; {CONVERT_ROUTINE} must be on the Octave path",
                cfg.scripts_dir.display()
            );
        }
        Ok(Self::new(executable, cfg.scripts_dir.clone()))
    }

    /// The Octave program passed to `--eval`.
    pub fn script(&self, raw_file: &Path, workdir: &Path) -> String {
        format!(
            "addpath({}); savepath = {}; {}({}); exit(0);",
            octave_quote(&self.scripts_dir.to_string_lossy()),
            octave_quote(&workdir.to_string_lossy()),
            self.routine,
            octave_quote(&raw_file.to_string_lossy()),
        )
    }

    /// `workdir` is made absolute: it is both the child's cwd and the save path.
    pub fn command(&self, raw_file: &Path, workdir: &Path) -> Result<Command> {
        let workdir = std::path::absolute(workdir)?;
        let mut cmd = Command::new(&self.executable);
        cmd.args(["--quiet", "--no-init-file", "--no-window-system", "--eval"])
            .arg(self.script(raw_file, &workdir))
            .current_dir(&workdir)
            .env(EXECUTABLE_ENV, &self.executable)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Ok(cmd)
    }
}

impl Converter for OctaveConverter {
    fn convert(&self, raw_file: &Path, workdir: &Path) -> Result<()> {
        tracing::info!(
            "octave {}('{}') in {}",
            self.routine,
            raw_file.display(),
            workdir.display()
        );
        let output = self
            .command(raw_file, workdir)?
            .output()
            .map_err(|source| ConvError::Spawn {
                program: self.executable.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            tracing::debug!(target: "npx_core::octave", "{line}");
        }

        if !output.status.success() {
            return Err(ConvError::Octave {
                file: raw_file.display().to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(())
    }
}

/// Single-quoted Octave string literal; embedded quotes are doubled.
pub fn octave_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_single_quotes() {
        assert_eq!(octave_quote("a.EEG"), "'a.EEG'");
        assert_eq!(octave_quote("O'Brien.EEG"), "'O''Brien.EEG'");
        assert_eq!(octave_quote(""), "''");
    }

    #[test]
    fn script_sets_save_path_and_calls_routine() {
        let conv = OctaveConverter::new("octave-cli".into(), "/opt/npx/matlab_scripts".into());
        let s = conv.script(Path::new("20211014163742.EEG"), Path::new("/data/run"));
        assert_eq!(
            s,
            "addpath('/opt/npx/matlab_scripts'); savepath = '/data/run'; \
             loadEEG('20211014163742.EEG'); exit(0);"
        );
    }

    #[test]
    fn command_carries_executable_env() {
        let conv = OctaveConverter::new("/usr/bin/octave-cli".into(), "/s".into());
        let cmd = conv.command(Path::new("a.EEG"), Path::new("/w")).unwrap();
        assert_eq!(cmd.get_program(), "/usr/bin/octave-cli");
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/w")));
        let env: Vec<_> = cmd.get_envs().collect();
        assert!(env.iter().any(|(k, v)| *k == EXECUTABLE_ENV
            && *v == Some(std::ffi::OsStr::new("/usr/bin/octave-cli"))));
    }

    #[test]
    fn relative_workdir_is_anchored_at_cwd() {
        let conv = OctaveConverter::new("octave-cli".into(), "/s".into());
        let cmd = conv.command(Path::new("a.EEG"), Path::new("data")).unwrap();
        let expected = std::env::current_dir().unwrap().join("data");
        assert_eq!(cmd.get_current_dir(), Some(expected.as_path()));
        let script = cmd.get_args().last().unwrap().to_string_lossy().into_owned();
        assert!(
            script.contains(&format!("savepath = '{}'", expected.display())),
            "{script}"
        );
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let conv = OctaveConverter::new(dir.path().join("octave-cli"), dir.path().into());
        let err = conv.convert(Path::new("a.EEG"), dir.path()).unwrap_err();
        assert!(matches!(err, ConvError::Spawn { .. }));
    }
}
