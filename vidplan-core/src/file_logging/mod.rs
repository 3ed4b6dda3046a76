//! Log file output.
//!
//! The CLI logs to the terminal through `fern`; when a log file is requested
//! `log4rs` takes over and writes to both the terminal and the file. [`log_plan`] writes the
//! resolved plan and the assembled command lines so a log file alone is
//! enough to reproduce an encode.

pub mod setup;

pub use setup::{CONSOLE_LOG_PATTERN, FILE_LOG_PATTERN, file_logging_config, setup_file_logging};

use log::{debug, info};

use crate::command::EncodeCommand;
use crate::media::Video;
use crate::resolver::ResolvedPlan;

/// Records a resolved plan and its commands at info/debug level.
pub fn log_plan(source: &Video, plan: &ResolvedPlan, command: &EncodeCommand) {
    let target = &plan.target;
    info!("Planning {}", source.file.display());
    info!(
        "Source: {}x{} {} {} ({:.1}s)",
        source.width, source.height, source.codec, source.color_transfer, source.duration
    );
    info!(
        "Target: {}x{} {} {} ({:.1}s from {:.1}s)",
        target.width, target.height, target.codec, target.color_transfer, target.duration, target.seek
    );
    if !target.crop.is_empty() {
        info!(
            "Crop: top {} bottom {} left {} right {}",
            target.crop.top, target.crop.bottom, target.crop.left, target.crop.right
        );
    }
    debug!("Decoder: {}, color transform: {:?}", plan.decoder, plan.color);
    if let Some(padding) = &plan.padding {
        debug!(
            "Padding {}x{} to {}x{}",
            padding.content_width, padding.content_height, padding.padded_width, padding.padded_height
        );
    }
    for (index, pass) in command.passes.iter().enumerate() {
        info!("Pass {}: ffmpeg {}", index + 1, pass.join(" "));
    }
    info!("Output: {}", command.output_path.display());
}
