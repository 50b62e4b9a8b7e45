use crate::collect::{Collected, collect_files};
use crate::config::ConvertConfig;
use crate::error::Result;
use crate::flatten::{StudyOutput, flatten_study};
use crate::manifest::{MANIFEST_FILE_NAME, RunManifest};
use crate::octave::Converter;
use crate::organize::{RelocateReport, ensure_dir, relocate};
use std::path::{Path, PathBuf};

/// Milestones reported while a run progresses.
#[derive(Debug)]
pub enum Progress<'a> {
    Collected(&'a Collected),
    Converting {
        index: usize,
        total: usize,
        file: &'a str,
    },
    Converted(&'a StudyOutput),
    Failed {
        file: &'a str,
        error: &'a str,
    },
    Relocated(&'a RelocateReport),
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub collected: Collected,
    /// Raw files whose snapshots were written.
    pub converted: Vec<String>,
    /// Raw file and error, only filled when `keep_going` is set.
    pub failed: Vec<(String, String)>,
    pub relocation: RelocateReport,
    pub manifest: PathBuf,
}

pub fn run(cfg: &ConvertConfig, converter: &dyn Converter) -> Result<RunSummary> {
    run_with(cfg, converter, |_| {})
}

/// collect -> convert + flatten each recording -> relocate MAT files.
pub fn run_with(
    cfg: &ConvertConfig,
    converter: &dyn Converter,
    mut on_progress: impl FnMut(Progress<'_>),
) -> Result<RunSummary> {
    let collected = collect_files(&cfg.workdir)?;
    tracing::info!(
        recordings = collected.eeg.len(),
        companions = collected.ee_.len(),
        "collected files in {}",
        cfg.workdir.display()
    );
    on_progress(Progress::Collected(&collected));

    ensure_dir(&cfg.records_dir)?;
    let mut manifest = RunManifest::new()?;
    let mut summary = RunSummary::default();

    let total = collected.eeg.len();
    for (i, raw) in collected.eeg.iter().enumerate() {
        on_progress(Progress::Converting {
            index: i + 1,
            total,
            file: raw,
        });
        match convert_one(cfg, converter, raw, &mut manifest) {
            Ok(out) => {
                on_progress(Progress::Converted(&out));
                summary.converted.push(raw.clone());
            }
            Err(e) if cfg.keep_going => {
                let msg = e.to_string();
                tracing::warn!("{raw} failed, continuing: {msg}");
                on_progress(Progress::Failed {
                    file: raw,
                    error: &msg,
                });
                summary.failed.push((raw.clone(), msg));
            }
            Err(e) => return Err(e),
        }
    }

    let mats = collect_files(&cfg.workdir)?.mats;
    ensure_dir(&cfg.matfiles_dir)?;
    summary.relocation = relocate(&mats, &cfg.workdir, &cfg.matfiles_dir)?;
    on_progress(Progress::Relocated(&summary.relocation));

    manifest.write_to(&cfg.records_dir)?;
    summary.manifest = cfg.records_dir.join(MANIFEST_FILE_NAME);
    summary.collected = collected;
    tracing::info!(
        converted = summary.converted.len(),
        failed = summary.failed.len(),
        moved = summary.relocation.moved.len(),
        "run finished"
    );
    Ok(summary)
}

/// Convert, flatten and record one recording in the manifest.
fn convert_one(
    cfg: &ConvertConfig,
    converter: &dyn Converter,
    raw: &str,
    manifest: &mut RunManifest,
) -> Result<StudyOutput> {
    converter.convert(Path::new(raw), &cfg.workdir)?;
    let prefix = Collected::study_prefix(raw);
    let out = flatten_study(&cfg.workdir, &prefix, &cfg.records_dir, cfg.format)?;
    manifest.add_study(&cfg.workdir.join(raw), &out.snapshots)?;
    Ok(out)
}
