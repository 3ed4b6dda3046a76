//! Terminal output styling for vidplan.
//!
//! Everything is written through the `log` facade at info level so the CLI
//! logger decides where it lands. Colors come from `console` and are
//! disabled when `NO_COLOR` is set.

use console::style;
use log::info;

use crate::command::EncodeCommand;
use crate::media::Video;
use crate::resolver::{ColorTransform, ResolvedPlan};
use crate::utils::format_duration;

/// Represents the visual hierarchy levels in the CLI output
#[derive(Debug, Clone, Copy)]
pub enum OutputLevel {
    /// Main sections (===== SECTION =====)
    Section,
    /// Subsections and major operations (» Operation)
    Subsection,
    /// Key-value status information
    Status,
    /// Additional details
    Detail,
}

impl OutputLevel {
    fn indent(self) -> &'static str {
        match self {
            OutputLevel::Section => "",
            OutputLevel::Subsection => "  ",
            OutputLevel::Status => "    ",
            OutputLevel::Detail => "      ",
        }
    }
}

const LABEL_WIDTH: usize = 15;

/// Check if color should be used (respects NO_COLOR environment variable)
fn should_use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Print a section header for major workflow phases
pub fn print_section(title: &str) {
    info!("");
    if should_use_color() {
        info!("===== {} =====", style(title.to_uppercase()).cyan());
    } else {
        info!("===== {} =====", title.to_uppercase());
    }
    info!("");
}

/// Print a subsection or processing step
pub fn print_processing(message: &str) {
    let indent = OutputLevel::Subsection.indent();
    if should_use_color() {
        info!("{indent}» {}", style(message).bold());
    } else {
        info!("{indent}» {message}");
    }
}

/// Formats a status line with the label padded to a fixed column.
pub fn format_status(label: &str, value: &str) -> String {
    let padding = LABEL_WIDTH.saturating_sub(label.chars().count()).max(1);
    format!(
        "{}{}:{}{}",
        OutputLevel::Status.indent(),
        label,
        " ".repeat(padding),
        value
    )
}

/// Print a status line (key-value pair)
pub fn print_status(label: &str, value: &str, highlight: bool) {
    if highlight && should_use_color() {
        let value = style(value).bold().to_string();
        info!("{}", format_status(label, &value));
    } else {
        info!("{}", format_status(label, value));
    }
}

/// Print a detail line below a status line
pub fn print_detail(message: &str) {
    info!("{}{message}", OutputLevel::Detail.indent());
}

/// Print a success message
pub fn print_success(message: &str) {
    info!("");
    if should_use_color() {
        info!("  ✓ {}", style(message).green());
    } else {
        info!("  ✓ {message}");
    }
}

/// Print a warning message
pub fn print_warning(message: &str) {
    if should_use_color() {
        info!("  ⚠ {}", style(message).yellow());
    } else {
        info!("  ⚠ {message}");
    }
}

/// Print an error message
pub fn print_error(title: &str, message: &str, suggestion: Option<&str>) {
    if should_use_color() {
        info!("✗ {}", style(title).red().bold());
    } else {
        info!("✗ {title}");
    }

    info!("");
    info!("  Message:  {message}");

    if let Some(suggestion_text) = suggestion {
        info!("");
        info!("  Suggestion: {suggestion_text}");
    }

    info!("");
}

fn dimensions(video: &Video) -> String {
    if video.width == 0 || video.height == 0 {
        return "unknown".to_string();
    }
    format!("{}x{}", video.width, video.height)
}

fn audio_summary(video: &Video) -> String {
    match video.audio_stream {
        None => "none".to_string(),
        Some(stream) => {
            let mut text = format!("#{stream} {}", video.audio_codec);
            if video.audio_channels > 0 {
                text.push_str(&format!(" {}ch", video.audio_channels));
            }
            if video.audio_rate > 0 {
                text.push_str(&format!(" {}k", video.audio_rate));
            }
            text
        }
    }
}

fn compare(label: &str, source: &str, target: &str) -> String {
    if source == target {
        format_status(label, source)
    } else {
        format_status(label, &format!("{source} → {target}"))
    }
}

/// Lines comparing a source with its resolved target, one per attribute.
pub fn plan_lines(source: &Video, plan: &ResolvedPlan) -> Vec<String> {
    let target = &plan.target;
    let mut lines = vec![
        compare("Resolution", &dimensions(source), &dimensions(target)),
        compare("Video codec", &source.codec, &target.codec),
        format_status("Decoder", &plan.decoder),
        compare(
            "Duration",
            &format_duration(source.duration),
            &format_duration(target.duration),
        ),
        compare("Audio", &audio_summary(source), &audio_summary(target)),
    ];
    if target.seek > 0.0 {
        lines.push(format_status("Start", &format_duration(target.seek)));
    }
    if !target.crop.is_empty() {
        let crop = target.crop;
        lines.push(format_status(
            "Crop",
            &format!("{} {} {} {}", crop.top, crop.bottom, crop.left, crop.right),
        ));
    }
    if let Some(padding) = &plan.padding {
        lines.push(format_status(
            "Padding",
            &format!("{}x{}", padding.padded_width, padding.padded_height),
        ));
    }
    if plan.color != ColorTransform::None {
        lines.push(compare(
            "Transfer",
            &source.color_transfer,
            &target.color_transfer,
        ));
    }
    if let Some(quality) = target.quality {
        lines.push(format_status("Quality", &quality.to_args().join(" ")));
    }
    if target.rate > 0 {
        lines.push(format_status("Bitrate", &format!("{}k", target.rate)));
    }
    if !target.volume.is_empty() {
        lines.push(format_status("Volume", &target.volume));
    }
    lines
}

/// Prints the source/target comparison and the command lines of a plan.
pub fn print_plan(source: &Video, plan: &ResolvedPlan, command: &EncodeCommand) {
    print_section(&source.display_title());
    for line in plan_lines(source, plan) {
        info!("{line}");
    }
    info!("");
    for (index, pass) in command.passes.iter().enumerate() {
        print_processing(&format!("Pass {}", index + 1));
        print_detail(&format!("ffmpeg {}", pass.join(" ")));
    }
    print_status("Output", &command.output_path.display().to_string(), true);
}
