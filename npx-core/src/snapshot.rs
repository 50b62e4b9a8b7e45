use crate::error::{ConvError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Suffix of the combined per-study snapshot (before the extension).
pub const COMBINED_SUFFIX: &str = "_info_data_marker";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Json,
    Cbor,
}

impl SnapshotFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SnapshotFormat::Json => "json",
            SnapshotFormat::Cbor => "cbor",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConvError::Format(format!("no snapshot extension on {path:?}")))?
            .parse()
    }
}

impl FromStr for SnapshotFormat {
    type Err = ConvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(SnapshotFormat::Json),
            "cbor" => Ok(SnapshotFormat::Cbor),
            other => Err(ConvError::Format(format!(
                "unknown snapshot format {other:?} (expected json or cbor)"
            ))),
        }
    }
}

impl fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `<dir>/<stem>.<ext>`
pub fn snapshot_path(dir: &Path, stem: &str, format: SnapshotFormat) -> PathBuf {
    dir.join(format!("{stem}.{}", format.extension()))
}

pub fn save_snapshot<T: Serialize>(path: &Path, value: &T, format: SnapshotFormat) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    match format {
        SnapshotFormat::Json => serde_json::to_writer_pretty(&mut w, value)?,
        SnapshotFormat::Cbor => ciborium::ser::into_writer(value, &mut w)
            .map_err(|e| ConvError::Cbor(format!("encode {}: {e}", path.display())))?,
    }
    w.flush()?;
    tracing::debug!("wrote snapshot {}", path.display());
    Ok(())
}

/// Load a snapshot, picking the decoder from the file extension.
pub fn load_snapshot<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = SnapshotFormat::from_path(path)?;
    let r = BufReader::new(File::open(path)?);
    match format {
        SnapshotFormat::Json => Ok(serde_json::from_reader(r)?),
        SnapshotFormat::Cbor => ciborium::de::from_reader(r)
            .map_err(|e| ConvError::Cbor(format!("decode {}: {e}", path.display()))),
    }
}

/// Snapshot files in `dir` whose names end with `suffix`, sorted.
pub fn snapshot_jar(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(suffix))
        {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}
