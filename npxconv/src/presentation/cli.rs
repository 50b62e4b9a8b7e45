use clap::{Args, Parser, Subcommand};
use npx_core::SnapshotFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Convert NeuroPrax EEG recordings into flattened snapshots",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub convert: ConvertArgs,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ConvertArgs {
    /// Directory holding the .EEG/.EE_ recordings (defaults to the current directory)
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// TOML config file (defaults to <workdir>/npxconv.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Octave executable (overrides NPX_OCTAVE / OCTAVE_EXECUTABLE)
    #[arg(long)]
    pub octave: Option<PathBuf>,

    /// Directory containing loadEEG.m
    #[arg(long)]
    pub scripts: Option<PathBuf>,

    /// Snapshot format: json or cbor
    #[arg(long)]
    pub format: Option<SnapshotFormat>,

    /// Records folder name under the working directory
    #[arg(long = "records-dir")]
    pub records_dir: Option<String>,

    /// MAT file folder name under the working directory
    #[arg(long = "matfiles-dir")]
    pub matfiles_dir: Option<String>,

    /// Seconds to wait for the Octave executable to appear
    #[arg(long = "timeout")]
    pub timeout_secs: Option<u64>,

    /// Record failing recordings and continue with the rest
    #[arg(long = "keep-going")]
    pub keep_going: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full conversion (the default when no subcommand is given)
    Convert(ConvertArgs),

    /// List snapshot files in a folder
    Jar {
        /// Folder to scan (defaults to the records folder)
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long, default_value = "_NP__info_data_marker.json")]
        suffix: String,
    },

    /// Load a combined snapshot and print its structures and fields
    Show { snapshot: PathBuf },
}
