use crate::error::Result;
use std::path::Path;
use walkdir::WalkDir;

pub const RAW_SUFFIX: &str = ".EEG";
pub const COMPANION_SUFFIX: &str = ".EE_";
pub const MAT_SUFFIX: &str = ".mat";

/// Marker the conversion routine appends to a recording stem.
pub const STUDY_MARKER: &str = "_NP_";

/// File names found directly inside a working directory, split by suffix.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Collected {
    pub eeg: Vec<String>,
    pub ee_: Vec<String>,
    pub mats: Vec<String>,
}

impl Collected {
    pub fn total(&self) -> usize {
        self.eeg.len() + self.ee_.len() + self.mats.len()
    }

    /// `20211014163742.EEG` -> `20211014163742_NP_`
    pub fn study_prefix(raw: &str) -> String {
        let stem = raw.strip_suffix(RAW_SUFFIX).unwrap_or(raw);
        format!("{stem}{STUDY_MARKER}")
    }
}

/// Scan `dir` (non-recursive) for raw recordings, companions and MAT files.
pub fn collect_files(dir: &Path) -> Result<Collected> {
    let mut out = Collected::default();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            tracing::debug!("skipping non UTF-8 name {:?}", entry.file_name());
            continue;
        };
        if name.ends_with(RAW_SUFFIX) {
            out.eeg.push(name.to_owned());
        } else if name.ends_with(COMPANION_SUFFIX) {
            out.ee_.push(name.to_owned());
        } else if name.ends_with(MAT_SUFFIX) {
            out.mats.push(name.to_owned());
        }
    }
    out.eeg.sort();
    out.ee_.sort();
    out.mats.sort();
    tracing::debug!(
        eeg = out.eeg.len(),
        ee_ = out.ee_.len(),
        mats = out.mats.len(),
        "collected files in {}",
        dir.display()
    );
    Ok(out)
}
