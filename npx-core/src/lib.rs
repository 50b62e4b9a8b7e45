#![forbid(unsafe_code)]

pub mod collect;
pub mod config;
pub mod error;
pub mod flatten;
pub mod manifest;
pub mod mat;
pub mod octave;
pub mod organize;
pub mod pipeline;
pub mod snapshot;

// Re-exports: stable API surface
pub use collect::{Collected, collect_files};
pub use config::{ConvertConfig, FileConfig, Overrides};
pub use flatten::{Field, Record, StudyRecord, flatten_structure, flatten_study};
pub use mat::{MatFile, MatValue};
pub use octave::{Converter, OctaveConverter};
pub use pipeline::{Progress, RunSummary, run, run_with};
pub use snapshot::{SnapshotFormat, load_snapshot, save_snapshot, snapshot_jar};
