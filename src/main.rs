extern crate sapgen;

use anyhow::{bail, Context};
use clap::Parser;
use itertools::Itertools;
use sapgen::errors::CompileError;
use sapgen::lookups::Lookups;
use sapgen::output::{write_compiled_unit, FileOutput, Output, SinkOutput};
use sapgen::read_unit_sheet::sheet_from_csv;
use sapgen::sheet::Sheet;
use sapgen::{compile_sheets, CompiledUnit};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::fmt::format::FmtSpan;

/// Sheets in an input directory are picked up when their file stem contains this marker.
const UNIT_SHEET_MARKER: &str = "Unit";
const SHEET_EXTENSION: &str = "csv";

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct SapgenArgs {
    #[arg(
        required = true,
        help = "Unit sheets (CSV) to compile, or directories holding them"
    )]
    inputs: Vec<PathBuf>,
    #[arg(
        long,
        short,
        default_value = ".",
        help = "Directory the compiled documents are written to"
    )]
    output_dir: PathBuf,
    #[arg(long, help = "JSON file overriding the built-in lookup tables")]
    lookups: Option<PathBuf>,
    #[arg(long, default_value_t = false, help = "Stop at the first unit that fails")]
    fail_fast: bool,
    #[arg(
        long,
        default_value_t = false,
        help = "Compile and validate the sheets without writing any documents"
    )]
    dry_run: bool,
    #[arg(long, default_value_t = false, help = "Log when tracing spans close")]
    log_spans: bool,
}

fn main() -> anyhow::Result<()> {
    let args = SapgenArgs::parse();

    // set up basic tracing
    let tracing_subscriber = {
        let mut builder = tracing_subscriber::fmt::fmt().with_max_level(tracing::Level::INFO);

        if args.log_spans {
            builder = builder.with_span_events(FmtSpan::CLOSE);
        }

        builder.finish()
    };
    tracing::subscriber::set_global_default(tracing_subscriber)
        .context("setting tracing subscriber failed")?;

    let lookups = match &args.lookups {
        Some(path) => Lookups::from_json(BufReader::new(
            File::open(path).with_context(|| format!("could not open {}", path.display()))?,
        ))?,
        None => Lookups::default(),
    };

    let sheets = sheet_paths(&args.inputs)?
        .iter()
        .map(|path| read_sheet(path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    if sheets.is_empty() {
        bail!("no unit sheets found in the given inputs");
    }

    let results = compile_sheets(&sheets, &lookups);
    let failures = if args.dry_run {
        report(&SinkOutput, &sheets, results, args.fail_fast)?
    } else {
        fs::create_dir_all(&args.output_dir)
            .with_context(|| format!("could not create {}", args.output_dir.display()))?;
        let output = FileOutput::new(args.output_dir.clone(), "{}.xml".to_string());
        report(&output, &sheets, results, args.fail_fast)?
    };

    if failures > 0 {
        bail!("{failures} of {} unit sheets failed to compile", sheets.len());
    }

    Ok(())
}

/// Writes each compiled unit and logs each failure, in sheet order. Returns the number
/// of failed units seen.
fn report(
    output: &impl Output,
    sheets: &[Sheet],
    results: Vec<Result<CompiledUnit, CompileError>>,
    fail_fast: bool,
) -> anyhow::Result<usize> {
    let mut failures = 0;
    for (sheet, result) in sheets.iter().zip(results) {
        match result {
            Ok(unit) => {
                write_compiled_unit(output, &unit)?;
                info!(sheet = sheet.name(), unit = %unit.reference, "compiled");
            }
            Err(err) => {
                error!(sheet = sheet.name(), "{err}");
                failures += 1;
                if fail_fast {
                    break;
                }
            }
        }
    }

    Ok(failures)
}

/// Expands directories into the unit sheets they contain, sorted by path.
fn sheet_paths(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = vec![];

    for input in inputs {
        if input.is_dir() {
            let entries = fs::read_dir(input)
                .with_context(|| format!("could not read directory {}", input.display()))?;
            for entry in entries {
                let path = entry?.path();
                if is_unit_sheet(&path) {
                    paths.push(path);
                } else {
                    debug!(path = %path.display(), "skipping file that is not a unit sheet");
                }
            }
        } else {
            paths.push(input.clone());
        }
    }

    Ok(paths.into_iter().sorted().dedup().collect())
}

fn is_unit_sheet(path: &Path) -> bool {
    path.is_file()
        && path.extension().and_then(OsStr::to_str) == Some(SHEET_EXTENSION)
        && path
            .file_stem()
            .and_then(OsStr::to_str)
            .is_some_and(|stem| stem.contains(UNIT_SHEET_MARKER))
}

fn read_sheet(path: &Path) -> anyhow::Result<Sheet> {
    let name = path
        .file_stem()
        .and_then(OsStr::to_str)
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;

    sheet_from_csv(name, BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;

    fn compiled(sheet_name: &str) -> Result<CompiledUnit, CompileError> {
        Ok(CompiledUnit {
            sheet_name: sheet_name.to_string(),
            reference: "Flat 1".to_string(),
            markup: "<AssessmentFull/>\n".to_string(),
        })
    }

    fn failed() -> Result<CompiledUnit, CompileError> {
        Err(CompileError::AssemblyFailure {
            unit: "Flat 2".to_string(),
        })
    }

    #[test]
    fn should_count_failures_without_writing_on_dry_run() {
        let sheets = vec![
            Sheet::new("Unit 1"),
            Sheet::new("Unit 2"),
            Sheet::new("Unit 3"),
        ];
        let results = vec![compiled("Unit 1"), failed(), failed()];

        assert_eq!(report(&SinkOutput, &sheets, results, false).unwrap(), 2);
    }

    #[test]
    fn should_stop_at_first_failure_when_failing_fast() {
        let sheets = vec![
            Sheet::new("Unit 1"),
            Sheet::new("Unit 2"),
            Sheet::new("Unit 3"),
        ];
        let results = vec![failed(), compiled("Unit 2"), failed()];

        assert_eq!(report(&SinkOutput, &sheets, results, true).unwrap(), 1);
    }

    #[test]
    fn should_write_successful_units_to_files() {
        let directory = env::temp_dir().join(format!("sapgen-report-{}", std::process::id()));
        fs::create_dir_all(&directory).unwrap();
        let output = FileOutput::new(directory.clone(), "{}.xml".to_string());
        let sheets = vec![Sheet::new("Unit 1"), Sheet::new("Unit 2")];
        let results = vec![compiled("Unit 1"), failed()];

        let failures = report(&output, &sheets, results, false).unwrap();

        assert_eq!(failures, 1);
        assert!(directory.join("Unit 1.xml").exists());
        assert!(!directory.join("Unit 2.xml").exists());
        fs::remove_dir_all(directory).unwrap();
    }

    #[test]
    fn should_only_pick_up_unit_csv_files() {
        assert!(!is_unit_sheet(Path::new("does-not-exist/Unit 1.csv")));
        assert!(!is_unit_sheet(&env::temp_dir()));
    }
}
