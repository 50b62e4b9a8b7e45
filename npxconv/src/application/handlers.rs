use std::path::PathBuf;

use crate::presentation::cli::ConvertArgs;
use npx_core::config::{ConvertConfig, Overrides, install_dir};
use npx_core::error::Result;
use npx_core::flatten::{Field, Record, StudyRecord};
use npx_core::mat::{MatValue, Numbers};
use npx_core::{OctaveConverter, Progress, load_snapshot, run_with, snapshot_jar};

fn config_from_args(args: ConvertArgs) -> Result<ConvertConfig> {
    let overrides = Overrides {
        workdir: args.workdir,
        config: args.config,
        octave: args.octave,
        scripts: args.scripts,
        records_dir: args.records_dir,
        matfiles_dir: args.matfiles_dir,
        format: args.format,
        timeout_secs: args.timeout_secs,
        keep_going: args.keep_going,
    };
    ConvertConfig::resolve(overrides, &install_dir())
}

pub fn handle_convert(args: ConvertArgs) -> Result<()> {
    let cfg = config_from_args(args)?;
    let converter = OctaveConverter::from_config(&cfg)?;
    println!("Using Octave at {}", converter.executable.display());

    let summary = run_with(&cfg, &converter, |p| match p {
        Progress::Collected(c) => println!(
            "Collected files: {} recordings, {} companions, {} mat",
            c.eeg.len(),
            c.ee_.len(),
            c.mats.len()
        ),
        Progress::Converting { index, total, file } => {
            println!("[{index}/{total}] {file}")
        }
        Progress::Converted(out) => {
            println!("        {} snapshots for {}", out.snapshots.len(), out.prefix)
        }
        Progress::Failed { file, error } => println!("        {file} failed: {error}"),
        Progress::Relocated(r) => {
            if !r.skipped.is_empty() {
                println!(
                    "Cannot move {} .mat files, the destination already has them",
                    r.skipped.len()
                );
            }
        }
    })?;

    println!(
        "Finished: {} converted, {} failed, {} .mat files moved. Records in {}",
        summary.converted.len(),
        summary.failed.len(),
        summary.relocation.moved.len(),
        cfg.records_dir.display()
    );
    Ok(())
}

pub fn handle_jar(args: ConvertArgs, dir: Option<PathBuf>, suffix: String) -> Result<()> {
    let dir = match dir {
        Some(d) => d,
        None => config_from_args(args)?.records_dir,
    };
    let jar = snapshot_jar(&dir, &suffix)?;
    if jar.is_empty() {
        eprintln!("no snapshots ending in {suffix} under {}", dir.display());
    }
    for p in jar {
        println!("{}", p.display());
    }
    Ok(())
}

pub fn handle_show(snapshot: PathBuf) -> Result<()> {
    // combined snapshots nest one level deeper than per-structure ones
    match load_snapshot::<StudyRecord>(&snapshot) {
        Ok(study) => {
            for (which, record) in &study {
                println!("{which}:");
                print_record(record, "  ");
            }
        }
        Err(_) => {
            let record: Record = load_snapshot(&snapshot)?;
            print_record(&record, "");
        }
    }
    Ok(())
}

fn print_record(record: &Record, indent: &str) {
    for (name, field) in record {
        println!("{indent}{name:<16} {}", describe_field(field));
    }
}

pub fn describe_field(field: &Field) -> String {
    match field {
        Field::Channels(names) => format!("{} channels [{}]", names.len(), names.join(", ")),
        Field::Value(v) => describe_value(v),
    }
}

fn shape(dims: &[usize]) -> String {
    dims.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("x")
}

fn describe_value(v: &MatValue) -> String {
    match v {
        MatValue::Numeric {
            class,
            dims,
            real,
            imag,
        } => {
            let kind = format!("{class:?}").to_lowercase();
            let cplx = if imag.is_some() { " complex" } else { "" };
            match (real.len(), real) {
                (1, Numbers::F64(x)) => format!("{kind}{cplx} = {}", x[0]),
                (1, Numbers::I64(x)) => format!("{kind}{cplx} = {}", x[0]),
                (1, Numbers::U64(x)) => format!("{kind}{cplx} = {}", x[0]),
                _ => format!("{kind}{cplx} {}", shape(dims)),
            }
        }
        MatValue::Logical { dims, .. } => format!("logical {}", shape(dims)),
        MatValue::Char { dims, rows } => match rows.as_slice() {
            [one] => format!("char {one:?}"),
            _ => format!("char {}", shape(dims)),
        },
        MatValue::Cell { dims, .. } => format!("cell {}", shape(dims)),
        MatValue::Struct {
            dims,
            class_name,
            fields,
            ..
        } => match class_name {
            Some(c) => format!("object {c} {} ({} fields)", shape(dims), fields.len()),
            None => format!("struct {} ({} fields)", shape(dims), fields.len()),
        },
    }
}
