// ============================================================================
// vidplan-core/src/command.rs
// ============================================================================
//
// COMMAND ASSEMBLER: Resolved plan + filter graph -> ffmpeg arguments
//
// Argument order:
//
//   global flags, decoder options, inputs (source, watermark, shifted audio),
//   metadata, seek/duration, filter devices, color output options, video map
//   or filter graph, encoder, quality, bitrate, audio, tune/level, output
//
// A two-pass libx265 encode becomes two invocations; the first discards its
// output to the null device and the second reads the first pass's stats.

use std::path::{Path, PathBuf};

use crate::external::null_device;
use crate::filter_graph::{FilterGraph, X265ParamsBuilder};
use crate::media::{COPY, Video, collision_free_path, output_file_path};
use crate::policy::VideoEncoder;
use crate::profile::Profile;
use crate::resolver::ResolvedPlan;

/// One or two ffmpeg invocations producing `output_path`.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeCommand {
    /// Argument lists, run in order. Each excludes the program name.
    pub passes: Vec<Vec<String>>,
    pub output_path: PathBuf,
}

impl EncodeCommand {
    #[must_use]
    pub fn is_two_pass(&self) -> bool {
        self.passes.len() > 1
    }
}

/// A `.srt` next to the source with the same base name.
#[must_use]
pub fn locate_sidecar_subtitle(source: &Video) -> Option<PathBuf> {
    let candidate = source.file.with_extension("srt");
    (candidate != source.file && candidate.is_file()).then_some(candidate)
}

/// `<output_dir>/<base>.<size>.<ext>`, moved aside from existing files.
#[must_use]
pub fn resolve_output_path(target: &Video, output_dir: &Path) -> PathBuf {
    collision_free_path(&output_file_path(
        output_dir,
        &target.base_name,
        &target.size_tag(),
        &target.extension,
    ))
}

fn push_all<const N: usize>(args: &mut Vec<String>, values: [&str; N]) {
    args.extend(values.map(String::from));
}

/// Encoder selection and its fixed tuning.
fn encoder_args(encoder: &VideoEncoder) -> Vec<String> {
    let mut args = Vec::new();
    match encoder {
        VideoEncoder::H264Nvenc => push_all(
            &mut args,
            [
                "-c:v",
                "h264_nvenc",
                "-preset:v",
                "p7",
                "-rc:v",
                "vbr",
                "-bf:v",
                "4",
                "-b_ref_mode:v",
                "middle",
                "-rc-lookahead:v",
                "32",
                "-bufsize:v",
                "16M",
                "-max_muxing_queue_size",
                "800",
            ],
        ),
        VideoEncoder::HevcNvenc => push_all(
            &mut args,
            [
                "-c:v",
                "hevc_nvenc",
                "-preset:v",
                "p7",
                "-level:v",
                "4.1",
                "-rc:v",
                "vbr",
                "-rc-lookahead:v",
                "32",
                "-bf:v",
                "4",
                "-bufsize:v",
                "16M",
                "-max_muxing_queue_size",
                "800",
            ],
        ),
        VideoEncoder::Libx264 | VideoEncoder::Libx265 => {
            push_all(&mut args, ["-c:v", encoder.name(), "-preset:v", "slow"]);
        }
        VideoEncoder::Copy => push_all(&mut args, ["-c:v", COPY]),
        VideoEncoder::PassThrough(name) if name.is_empty() => {}
        VideoEncoder::PassThrough(name) => push_all(&mut args, ["-c:v", name.as_str()]),
    }
    args
}

/// A single `-x265-params` option, or nothing when there are no params.
fn x265_args(base: &X265ParamsBuilder, extra: &[(&str, &str)]) -> Vec<String> {
    let params = extra
        .iter()
        .fold(base.clone(), |params, (key, value)| params.add_param(key, value));
    if params.is_empty() {
        Vec::new()
    } else {
        vec!["-x265-params".to_string(), params.build()]
    }
}

fn audio_args(source: &Video, target: &Video) -> Vec<String> {
    let Some(stream) = target.audio_stream.filter(|_| source.has_audio()) else {
        return Vec::new();
    };
    let mut args = vec![
        "-map".to_string(),
        format!("{}:a:{stream}", target.audio_input),
        "-c:a".to_string(),
        target.audio_codec.clone(),
    ];
    if target.audio_codec != COPY {
        if target.audio_rate > 0 {
            args.push("-b:a".into());
            args.push(format!("{}k", target.audio_rate));
        }
        if target.audio_channels > 0 {
            args.push("-ac".into());
            args.push(target.audio_channels.to_string());
        }
        if !target.volume.is_empty() {
            args.push("-filter:a".into());
            args.push(format!("volume={}", target.volume.replace(' ', "")));
        }
    }
    args
}

/// Serializes a resolved plan into ffmpeg invocations.
#[must_use]
pub fn assemble_command(
    source: &Video,
    plan: &ResolvedPlan,
    graph: &FilterGraph,
    profile: &Profile,
    output_dir: &Path,
) -> EncodeCommand {
    let target = &plan.target;
    let encoder = plan.encoder();
    let copy = plan.is_copy();
    let two_pass = profile.two_pass && encoder == VideoEncoder::Libx265;

    let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into()];
    args.extend(graph.input_args.iter().cloned());
    args.push("-i".into());
    args.push(source.file.to_string_lossy().into_owned());

    if let Some(watermark) = profile.watermark.as_ref().filter(|_| !copy) {
        args.push("-i".into());
        args.push(watermark.to_string_lossy().into_owned());
    }
    if target.audio_input > 0 {
        args.push("-itsoffset".into());
        args.push(target.audio_delay.to_string());
        args.push("-i".into());
        args.push(source.file.to_string_lossy().into_owned());
    }

    if profile.strip_metadata {
        push_all(&mut args, ["-map_metadata", "-1"]);
    }
    if target.seek > 0.0 {
        args.push("-ss".into());
        args.push(target.seek.to_string());
    }
    if target.duration > 0.0 {
        args.push("-t".into());
        args.push(target.duration.to_string());
    }

    args.extend(graph.device_args.iter().cloned());
    args.extend(graph.output_args.iter().cloned());

    if let Some(filter_complex) = graph.filter_complex() {
        args.push("-filter_complex".into());
        args.push(filter_complex);
    }
    args.push("-map".into());
    args.push(graph.video_map());

    args.extend(encoder_args(&encoder));
    if let Some(quality) = target.quality {
        args.extend(quality.to_args());
    }
    if target.rate > 0 {
        args.push("-b:v".into());
        args.push(format!("{}k", target.rate));
        if !two_pass {
            args.push("-maxrate:v".into());
            args.push(format!("{}k", target.rate));
        }
    }

    args.extend(audio_args(source, target));

    if let Some(tune) = &profile.tune {
        args.push("-tune".into());
        args.push(tune.clone());
    }
    if let Some(level) = &profile.level {
        args.push("-level:v".into());
        args.push(level.clone());
    }

    let output_path = resolve_output_path(target, output_dir);
    let output = output_path.to_string_lossy().into_owned();
    let passes = if two_pass {
        let mut first = args.clone();
        first.extend(x265_args(
            &graph.x265_params,
            &[("no-slow-firstpass", "1"), ("pass", "1")],
        ));
        first.extend(["-an", "-f", "null", null_device()].map(String::from));

        let mut second = args;
        second.extend(x265_args(&graph.x265_params, &[("pass", "2")]));
        second.push(output);
        vec![first, second]
    } else {
        let mut single = args;
        single.extend(x265_args(&graph.x265_params, &[]));
        single.push(output);
        vec![single]
    };

    EncodeCommand {
        passes,
        output_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_graph::build_filter_graph;
    use crate::media::QualityControl;
    use crate::policy::SizeTier;
    use crate::resolver::resolve;
    use std::fs;
    use tempfile::tempdir;

    fn source() -> Video {
        let mut video = Video::new(Path::new("/media/movie.mkv"));
        video.width = 1920;
        video.height = 1080;
        video.size = Some(SizeTier::P1080);
        video.duration = 600.0;
        video.codec = "h264".into();
        video.pixel_format = "yuv420p".into();
        video.color_transfer = "bt709".into();
        video.audio_codec = "ac3".into();
        video.audio_rate = 640;
        video.audio_channels = 6;
        video
    }

    fn assemble(source: &Video, profile: &Profile, dir: &Path) -> EncodeCommand {
        let plan = resolve(source, profile);
        let graph = build_filter_graph(source, &plan, profile, None);
        assemble_command(source, &plan, &graph, profile, dir)
    }

    fn joined(args: &[String]) -> String {
        args.join(" ")
    }

    #[test]
    fn plain_software_encode() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let profile = Profile {
            codec: Some("libx264".into()),
            quality: Some(QualityControl::ConstantRateFactor(23)),
            extension: Some("mp4".into()),
            ..Profile::default()
        };
        let command = assemble(&source(), &profile, dir.path());
        let expected_output = dir.path().join("movie.1080p.mp4");

        assert_eq!(command.passes.len(), 1);
        assert_eq!(command.output_path, expected_output);
        assert_eq!(
            joined(&command.passes[0]),
            format!(
                "-y -hide_banner -c:v h264 -i /media/movie.mkv -t 600 -map 0:v:0 \
                 -c:v libx264 -preset:v slow -crf:v 23 -map 0:a:0 -c:a copy {}",
                expected_output.display()
            )
        );
        Ok(())
    }

    #[test]
    fn nvenc_with_file_size_and_audio() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let profile = Profile {
            codec: Some("h264_nvenc".into()),
            size: Some(SizeTier::P720),
            file_size: 500.0,
            audio_rate: 144,
            audio_channels: 2,
            strip_metadata: true,
            seek: 10.0,
            duration: 60.0,
            ..Profile::default()
        };
        let mut src = source();
        src.codec = "h264_cuvid".into();
        let args = joined(&assemble(&src, &profile, dir.path()).passes[0]);

        assert!(args.starts_with(
            "-y -hide_banner -hwaccel cuda -hwaccel_output_format cuda -c:v h264_cuvid \
             -resize 1280x720 -i /media/movie.mkv -map_metadata -1 -ss 10 -t 60 -map 0:v:0 \
             -c:v h264_nvenc -preset:v p7 -rc:v vbr -bf:v 4 -b_ref_mode:v middle"
        ));
        // 500 * 8192 / 60 - 144
        assert!(args.contains("-b:v 68122k -maxrate:v 68122k"));
        assert!(args.contains("-map 0:a:0 -c:a aac -b:a 144k -ac 2"));
        assert!(args.ends_with("movie.720p.mkv"));
        Ok(())
    }

    #[test]
    fn two_pass_x265() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let profile = Profile {
            codec: Some("libx265".into()),
            rate: 2500,
            two_pass: true,
            ..Profile::default()
        };
        let command = assemble(&source(), &profile, dir.path());
        assert!(command.is_two_pass());

        let first = joined(&command.passes[0]);
        let second = joined(&command.passes[1]);
        assert!(first.contains("-b:v 2500k -map"));
        assert!(!first.contains("-maxrate"));
        assert!(first.ends_with(&format!(
            "-x265-params no-slow-firstpass=1:pass=1 -an -f null {}",
            null_device()
        )));
        assert!(second.contains("-x265-params pass=2"));
        assert!(second.ends_with(&command.output_path.to_string_lossy().into_owned()));
        Ok(())
    }

    #[test]
    fn two_pass_only_applies_to_x265() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let profile = Profile {
            codec: Some("libx264".into()),
            rate: 2500,
            two_pass: true,
            ..Profile::default()
        };
        let command = assemble(&source(), &profile, dir.path());
        assert!(!command.is_two_pass());
        assert!(joined(&command.passes[0]).contains("-maxrate:v 2500k"));
        Ok(())
    }

    #[test]
    fn pq_params_merge_with_pass() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let profile = Profile {
            codec: Some("libx265".into()),
            color_transfer: Some("smpte2084".into()),
            two_pass: true,
            ..Profile::default()
        };
        let command = assemble(&source(), &profile, dir.path());
        let second = joined(&command.passes[1]);
        assert!(second.contains(
            "-x265-params hdr-opt=1:repeat-headers=1:colorprim=bt2020:transfer=smpte2084:\
             colormatrix=bt2020nc:pass=2"
        ));
        assert!(second.contains("-pix_fmt yuv420p10le"));
        assert_eq!(second.matches("-x265-params").count(), 1);
        Ok(())
    }

    #[test]
    fn stream_copy_bypasses_graph() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let profile = Profile {
            codec: Some("copy".into()),
            quality: Some(QualityControl::ConstantQuality(20)),
            denoise: true,
            watermark: Some(PathBuf::from("logo.png")),
            ..Profile::default()
        };
        let args = joined(&assemble(&source(), &profile, dir.path()).passes[0]);
        assert!(args.starts_with("-y -hide_banner -i /media/movie.mkv -t 600 -map 0:v:0 -c:v copy -map 0:a:0 -c:a copy"));
        assert!(!args.contains("-filter_complex"));
        assert!(!args.contains("-cq:v"));
        assert!(!args.contains("logo.png"));
        Ok(())
    }

    #[test]
    fn inputs_and_filter_graph_are_ordered() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let profile = Profile {
            codec: Some("libx264".into()),
            watermark: Some(PathBuf::from("logo.png")),
            audio_delay: 0.3,
            detect_volume: true,
            tune: Some("film".into()),
            level: Some("4.1".into()),
            ..Profile::default()
        };
        let mut src = source();
        src.apply_volume("-2.5 dB");
        let args = joined(&assemble(&src, &profile, dir.path()).passes[0]);

        assert!(args.contains(
            "-i /media/movie.mkv -i logo.png -itsoffset 0.3 -i /media/movie.mkv -t 600 \
             -filter_complex [0:v:0]format=nv12[v];[v][1:v:0]overlay=W-w-48:48[v] -map [v]"
        ));
        assert!(args.contains("-map 2:a:0 -c:a ac3 -b:a 640k -ac 6 -filter:a volume=2.5dB -tune film -level:v 4.1"));
        Ok(())
    }

    #[test]
    fn no_audio_maps_video_only() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let mut src = source();
        src.audio_stream = None;
        let args = joined(&assemble(&src, &Profile::default(), dir.path()).passes[0]);
        assert!(!args.contains("-c:a"));
        assert!(!args.contains(":a:"));
        Ok(())
    }

    #[test]
    fn existing_outputs_are_not_overwritten() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let mut target = Video::new(Path::new("/media/movie.mkv"));
        target.size = Some(SizeTier::P720);
        target.extension = "mp4".into();

        let first = resolve_output_path(&target, dir.path());
        assert_eq!(first, dir.path().join("movie.720p.mp4"));
        fs::write(&first, b"")?;
        let second = resolve_output_path(&target, dir.path());
        assert_eq!(second, dir.path().join("movie.720p.1.mp4"));
        fs::write(&second, b"")?;
        assert_eq!(
            resolve_output_path(&target, dir.path()),
            dir.path().join("movie.720p.2.mp4")
        );
        Ok(())
    }

    #[test]
    fn sidecar_subtitle_is_found() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let file = dir.path().join("movie.mkv");
        fs::write(&file, b"")?;
        let video = Video::new(&file);
        assert_eq!(locate_sidecar_subtitle(&video), None);

        fs::write(dir.path().join("movie.srt"), b"1\n")?;
        assert_eq!(locate_sidecar_subtitle(&video), Some(dir.path().join("movie.srt")));
        Ok(())
    }
}
