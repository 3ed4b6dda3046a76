//! Implementation of the 'bulk' subcommand.
//!
//! Encodes every video in a directory, one after another, with the same
//! profile. A failed file is reported and the remaining files still run;
//! the command fails at the end if any file failed.

use crate::cli::BulkArgs;
use crate::config::{FileConfig, build_core_config, build_profile};
use crate::error::CliResult;

use log::{error, info};
use std::path::PathBuf;

use vidplan_core::external::{FfprobeCli, SidecarSpawner};
use vidplan_core::{CoreError, TranscodeOutcome, find_processable_files, pipeline, terminal};

use super::{print_json, report_outcome};

/// Per-file results of a bulk run.
#[derive(Debug, Default, serde::Serialize)]
pub struct BulkReport {
    pub outcomes: Vec<TranscodeOutcome>,
    pub failures: Vec<(PathBuf, String)>,
}

/// Runs the bulk command.
pub fn run_bulk(args: &BulkArgs, file: &FileConfig, json: bool) -> CliResult<()> {
    let profile = build_profile(file, &args.run, &args.profile)?;
    let config = build_core_config(file, &args.run);
    config.validate()?;

    let files = find_processable_files(&args.input_dir)?;
    if !json {
        terminal::print_section("Bulk");
        terminal::print_status("Files", &files.len().to_string(), true);
        for path in &files {
            terminal::print_detail(&path.display().to_string());
        }
    }

    let prober = FfprobeCli::new(config.tools().ffprobe);
    let mut report = BulkReport::default();
    for (index, path) in files.iter().enumerate() {
        info!("");
        terminal::print_processing(&format!(
            "[{}/{}] {}",
            index + 1,
            files.len(),
            path.display()
        ));
        match pipeline::run(&prober, &SidecarSpawner, &config, &profile, path) {
            Ok(outcome) => {
                if !json {
                    report_outcome(&outcome);
                }
                report.outcomes.push(outcome);
            }
            Err(e) => {
                error!("{}: {e}", path.display());
                report.failures.push((path.clone(), e.to_string()));
            }
        }
    }

    if json {
        print_json(&report)?;
    }

    if report.failures.is_empty() {
        terminal::print_success(&format!("Processed {} files", report.outcomes.len()));
        Ok(())
    } else {
        Err(CoreError::OperationFailed(format!(
            "{} of {} files failed",
            report.failures.len(),
            files.len()
        )))
    }
}
