use crate::error::{ConvError, Result};
use crate::mat::{MatFile, MatValue};
use crate::snapshot::{COMBINED_SUFFIX, SnapshotFormat, save_snapshot, snapshot_path};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The three structures the conversion routine writes per recording.
pub const STRUCTURES: [&str; 3] = ["info", "data", "marker"];

/// Prefix of the variable name inside each MAT file (`NP_info`, ...).
pub const VARIABLE_PREFIX: &str = "NP_";

pub const CHANNELS_FIELD: &str = "channels";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    /// Channel labels lifted out of their cell array.
    Channels(Vec<String>),
    Value(MatValue),
}

impl Field {
    pub fn as_value(&self) -> Option<&MatValue> {
        match self {
            Field::Value(v) => Some(v),
            Field::Channels(_) => None,
        }
    }
}

/// Field name to value, for one structure.
pub type Record = BTreeMap<String, Field>;

/// Structure name (`info`, `data`, `marker`) to its record.
pub type StudyRecord = BTreeMap<String, Record>;

#[derive(Clone, Debug)]
pub struct StudyOutput {
    pub prefix: String,
    pub record: StudyRecord,
    /// Per-structure snapshots followed by the combined one.
    pub snapshots: Vec<PathBuf>,
}

/// `<dir>/<prefix><which>.mat`
pub fn mat_path(dir: &Path, prefix: &str, which: &str) -> PathBuf {
    dir.join(format!("{prefix}{which}.mat"))
}

/// Copy every field of element (0,0) of `NP_<which>` into a [`Record`].
pub fn flatten_structure(mat_file: &Path, which: &str) -> Result<Record> {
    let name = format!("{VARIABLE_PREFIX}{which}");
    let mat = MatFile::open(mat_file)?;
    let value = mat
        .into_variable(&name)
        .ok_or_else(|| ConvError::MissingVariable {
            name: name.clone(),
            path: mat_file.to_path_buf(),
        })?;
    flatten_value(&name, value)
}

pub fn flatten_value(name: &str, value: MatValue) -> Result<Record> {
    let MatValue::Struct { mut elements, .. } = value else {
        return Err(ConvError::NotAStruct {
            name: name.to_owned(),
        });
    };
    if elements.is_empty() {
        return Err(ConvError::NotAStruct {
            name: name.to_owned(),
        });
    }
    let first = elements.swap_remove(0);

    let mut record = Record::new();
    for (key, value) in first {
        let field = if key == CHANNELS_FIELD {
            Field::Channels(unnest_channels(&value)?)
        } else {
            Field::Value(value)
        };
        record.insert(key, field);
    }
    Ok(record)
}

/// Channel labels arrive as a 1xN cell of char rows; a char matrix is accepted too.
pub fn unnest_channels(value: &MatValue) -> Result<Vec<String>> {
    match value {
        MatValue::Cell { cells, .. } => cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                cell.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| ConvError::FieldShape {
                        field: CHANNELS_FIELD.into(),
                        reason: format!("cell {i} is {:?}, expected char", cell.class()),
                    })
            })
            .collect(),
        MatValue::Char { rows, .. } => Ok(rows.iter().map(|r| r.trim_end().to_owned()).collect()),
        other => Err(ConvError::FieldShape {
            field: CHANNELS_FIELD.into(),
            reason: format!("expected cell of names, found {:?}", other.class()),
        }),
    }
}

/// Flatten the three MAT files of one study and write per-structure and
/// combined snapshots into `records_dir`.
pub fn flatten_study(
    mat_dir: &Path,
    prefix: &str,
    records_dir: &Path,
    format: SnapshotFormat,
) -> Result<StudyOutput> {
    let mut study = StudyRecord::new();
    let mut snapshots = Vec::with_capacity(STRUCTURES.len() + 1);

    for which in STRUCTURES {
        let record = flatten_structure(&mat_path(mat_dir, prefix, which), which)?;
        tracing::debug!(fields = record.len(), "flattened {prefix}{which}");
        let path = snapshot_path(records_dir, &format!("{prefix}_{which}"), format);
        save_snapshot(&path, &record, format)?;
        snapshots.push(path);
        study.insert(which.to_owned(), record);
    }

    let combined = snapshot_path(records_dir, &format!("{prefix}{COMBINED_SUFFIX}"), format);
    save_snapshot(&combined, &study, format)?;
    snapshots.push(combined);

    Ok(StudyOutput {
        prefix: prefix.to_owned(),
        record: study,
        snapshots,
    })
}
