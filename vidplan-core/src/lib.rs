//! Core library for planning and running ffmpeg transcodes.
//!
//! Given an input file and a target [`Profile`], the crate probes the source
//! streams, optionally detects black bars and peak volume, resolves a target
//! descriptor (size, codec, timing, color handling, audio, bitrate), builds
//! the ffmpeg filter graph and assembles the encoder command lines.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use vidplan_core::external::{FfprobeCli, SidecarSpawner};
//! use vidplan_core::profile::resolve_preset;
//! use vidplan_core::{CoreConfigBuilder, pipeline};
//! use std::path::{Path, PathBuf};
//!
//! let config = CoreConfigBuilder::new()
//!     .output_dir(PathBuf::from("/srv/encoded"))
//!     .dry_run(true)
//!     .build();
//! let profile = resolve_preset("telegram")?.build()?;
//! let prober = FfprobeCli::new(config.tools().ffprobe);
//!
//! let outcome = pipeline::run(
//!     &prober,
//!     &SidecarSpawner,
//!     &config,
//!     &profile,
//!     Path::new("/media/Movie.2010.mkv"),
//! )?;
//! for pass in &outcome.passes {
//!     println!("ffmpeg {}", pass.join(" "));
//! }
//! # Ok::<(), vidplan_core::CoreError>(())
//! ```

pub mod command;
pub mod config;
pub mod detection;
pub mod discovery;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod filter_graph;
pub mod media;
pub mod pipeline;
pub mod policy;
pub mod profile;
pub mod progress;
pub mod resolver;
pub mod terminal;
pub mod utils;

// Re-exports for public API
pub use command::{EncodeCommand, assemble_command};
pub use config::{CoreConfig, CoreConfigBuilder};
pub use discovery::find_processable_files;
pub use error::{CoreError, CoreResult};
pub use filter_graph::{FilterGraph, build_filter_graph};
pub use media::{ProbeResult, Video};
pub use pipeline::TranscodeOutcome;
pub use profile::{Profile, ProfileOverrides};
pub use resolver::{ResolvedPlan, resolve};
pub use utils::{format_duration, parse_ffmpeg_time, parse_timecode};
