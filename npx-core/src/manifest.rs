use crate::error::{ConvError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StudyEntry {
    pub raw_file: String,
    /// BLAKE3 of the raw recording, hex.
    pub blake3: String,
    pub size: u64,
    /// Snapshot file names, relative to the records folder.
    pub snapshots: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RunManifest {
    pub tool: String,
    /// RFC 3339, UTC.
    pub created: String,
    pub studies: Vec<StudyEntry>,
}

impl RunManifest {
    pub fn new() -> Result<Self> {
        let created = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| ConvError::Format(format!("timestamp: {e}")))?;
        Ok(Self {
            tool: format!("npx-core {}", env!("CARGO_PKG_VERSION")),
            created,
            studies: Vec::new(),
        })
    }

    /// Record one converted study; `snapshots` are full paths.
    pub fn add_study(&mut self, raw: &Path, snapshots: &[impl AsRef<Path>]) -> Result<()> {
        let (blake3, size) = hash_file(raw)?;
        let raw_file = raw
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let snapshots = snapshots
            .iter()
            .filter_map(|p| p.as_ref().file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        self.studies.push(StudyEntry {
            raw_file,
            blake3,
            size,
            snapshots,
        });
        Ok(())
    }

    pub fn write_to(&self, records_dir: &Path) -> Result<()> {
        let path = records_dir.join(MANIFEST_FILE_NAME);
        let f = File::create(&path)?;
        serde_json::to_writer_pretty(f, self)?;
        tracing::debug!("wrote run manifest {}", path.display());
        Ok(())
    }

    pub fn read_from(records_dir: &Path) -> Result<Self> {
        let f = File::open(records_dir.join(MANIFEST_FILE_NAME))?;
        Ok(serde_json::from_reader(BufReader::new(f))?)
    }
}

/// Streaming BLAKE3 digest (hex) and size of a file.
pub fn hash_file(path: &Path) -> Result<(String, u64)> {
    let mut h = blake3::Hasher::new();
    let mut f = File::open(path)?;
    let n = io::copy(&mut f, &mut h)?;
    Ok((h.finalize().to_hex().to_string(), n))
}
