//! Implementation of the 'encode' subcommand.
//!
//! Builds the run settings and the profile from the config file, the preset
//! and the flags, then hands one file to the core pipeline.

use crate::cli::EncodeArgs;
use crate::config::{FileConfig, build_core_config, build_profile};
use crate::error::CliResult;

use vidplan_core::external::{FfprobeCli, SidecarSpawner};
use vidplan_core::{pipeline, terminal};

use super::{print_json, report_outcome};

/// Runs the encode command.
pub fn run_encode(args: &EncodeArgs, file: &FileConfig, json: bool) -> CliResult<()> {
    let profile = build_profile(file, &args.run, &args.profile)?;
    let config = build_core_config(file, &args.run);
    config.validate()?;

    if !json {
        terminal::print_section("Plan");
        terminal::print_status("Input", &args.input.display().to_string(), false);
        terminal::print_status("Output dir", &config.output_dir.display().to_string(), false);
    }

    let prober = FfprobeCli::new(config.tools().ffprobe);
    let outcome = pipeline::run(&prober, &SidecarSpawner, &config, &profile, &args.input)?;

    if json {
        print_json(&outcome)
    } else {
        report_outcome(&outcome);
        Ok(())
    }
}
