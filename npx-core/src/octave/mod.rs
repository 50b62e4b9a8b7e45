use crate::error::Result;
use std::path::Path;

/// Name of the vendor routine that turns one raw recording into MAT files.
pub const CONVERT_ROUTINE: &str = "loadEEG";

/// Environment variable Octave-aware tooling reads the executable from.
pub const EXECUTABLE_ENV: &str = "OCTAVE_EXECUTABLE";

/// Turns a raw recording into `<stem>_NP_{info,data,marker}.mat` inside `workdir`.
pub trait Converter {
    fn convert(&self, raw_file: &Path, workdir: &Path) -> Result<()>;
}

pub mod invoke;
pub mod locate;

pub use invoke::OctaveConverter;
pub use locate::{looks_like_octave, wait_for_executable};
