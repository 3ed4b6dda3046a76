// ============================================================================
// vidplan-core/src/filter_graph.rs
// ============================================================================
//
// FILTER GRAPH BUILDER: Video stages between the decoder and the encoder
//
// On a hardware decode path, crop and resize are decoder options and frames
// stay in device memory. As soon as any software stage or a software
// encoder is involved, the frames are downloaded first and, for a hardware
// encoder, uploaded again at the end. On a software decode path crop and scale are ordinary filters.
//
// Stage order is fixed:
//
//   [hwdownload] crop scale format denoise color   (unlabeled chain)
//   pad -> drawtext -> subtitles -> watermark -> hwupload_cuda
//
// The unlabeled chain reads the selected video stream and writes `[v]`; every
// later stage reads and writes `[v]`.
//
// KEY COMPONENTS:
// - FilterGraph: Graph text plus the options it implies on the command line
// - VideoFilterChain: Comma-joined software chain
// - X265ParamsBuilder: Colon-joined `-x265-params` value

use std::path::Path;

use crate::media::Video;
use crate::policy::is_ten_bit_pixel_format;
use crate::profile::Profile;
use crate::resolver::{ColorTransform, ResolvedPlan};

/// Tonemap curve when the profile leaves it empty.
pub const DEFAULT_TONEMAP: &str = "mobius";

/// Label threaded through every stage.
pub const VIDEO_LABEL: &str = "[v]";

const DENOISE_FILTER: &str = "nlmeans=s=1:p=7:pc=5:r=5:rc=5";
const SUBTITLE_STYLE: &str = "Fontname=Arial,Shadow=0,Fontsize=16";

// Title card phases, seconds.
const TITLE_FADE_IN: i64 = 0;
const TITLE_DISPLAY: i64 = 2;
const TITLE_FADE_OUT: i64 = 1;

/// Builder for the unlabeled software chain.
#[derive(Debug, Default)]
pub struct VideoFilterChain {
    filters: Vec<String>,
}

impl VideoFilterChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter; empty strings are ignored.
    #[must_use]
    pub fn add_filter(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        if !filter.is_empty() {
            self.filters.push(filter);
        }
        self
    }

    /// Appends every filter of `other`.
    #[must_use]
    pub fn append(mut self, other: VideoFilterChain) -> Self {
        self.filters.extend(other.filters);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Joins the chain, or `None` when nothing was added.
    #[must_use]
    pub fn build(self) -> Option<String> {
        if self.filters.is_empty() {
            None
        } else {
            Some(self.filters.join(","))
        }
    }
}

/// Builder for `-x265-params`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct X265ParamsBuilder {
    params: Vec<(String, String)>,
}

impl X265ParamsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add_param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// HDR10 signalling for a PQ encode.
    #[must_use]
    pub fn with_hdr10(self) -> Self {
        self.add_param("hdr-opt", "1")
            .add_param("repeat-headers", "1")
            .add_param("colorprim", "bt2020")
            .add_param("transfer", "smpte2084")
            .add_param("colormatrix", "bt2020nc")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[must_use]
    pub fn build(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// A built filter graph and the command-line options it depends on.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FilterGraph {
    /// Decoder options placed before the primary `-i`.
    pub input_args: Vec<String>,
    /// Filter device setup placed after the inputs.
    pub device_args: Vec<String>,
    /// Output options required by the color stage.
    pub output_args: Vec<String>,
    pub x265_params: X265ParamsBuilder,
    /// Filter chains in stage order.
    pub chains: Vec<String>,
    /// Source stream specifier, e.g. `0:v:0`.
    pub video_stream: String,
}

impl FilterGraph {
    /// The `-filter_complex` value, or `None` when no stage is needed.
    #[must_use]
    pub fn filter_complex(&self) -> Option<String> {
        if self.chains.is_empty() {
            None
        } else {
            Some(self.chains.join(";"))
        }
    }

    /// What the output maps as its video stream.
    #[must_use]
    pub fn video_map(&self) -> String {
        if self.chains.is_empty() {
            self.video_stream.clone()
        } else {
            VIDEO_LABEL.to_string()
        }
    }
}

/// Builds the filter graph for a resolved plan.
///
/// `sidecar_subtitle` is a text subtitle file found next to the source; it
/// replaces the embedded stream for burn-in.
#[must_use]
pub fn build_filter_graph(
    source: &Video,
    plan: &ResolvedPlan,
    profile: &Profile,
    sidecar_subtitle: Option<&Path>,
) -> FilterGraph {
    let mut graph = FilterGraph {
        video_stream: format!("0:v:{}", source.video_stream),
        ..FilterGraph::default()
    };
    if plan.is_copy() {
        return graph;
    }

    let target = &plan.target;
    let hardware = plan.hardware_decode();
    let crop = source.crop;
    let resize = source.width != plan.decoded_width || source.height != plan.decoded_height;

    if hardware {
        graph.input_args.extend(
            ["-hwaccel", "cuda", "-hwaccel_output_format", "cuda"].map(String::from),
        );
    }
    if !plan.decoder.is_empty() {
        graph.input_args.push("-c:v".into());
        graph.input_args.push(plan.decoder.clone());
    }

    let mut geometry = VideoFilterChain::new();
    if hardware {
        if !crop.is_empty() {
            graph.input_args.push("-crop".into());
            graph.input_args.push(format!(
                "{}x{}x{}x{}",
                crop.top, crop.bottom, crop.left, crop.right
            ));
        }
        if resize {
            graph.input_args.push("-resize".into());
            graph
                .input_args
                .push(format!("{}x{}", plan.decoded_width, plan.decoded_height));
        }
    } else {
        if !crop.is_empty() {
            geometry = geometry.add_filter(format!(
                "crop={}:{}:{}:{}",
                source.width, source.height, crop.left, crop.top
            ));
        }
        if resize {
            geometry =
                geometry.add_filter(format!("scale={}:{}", plan.decoded_width, plan.decoded_height));
        }
    }

    let mut effects = VideoFilterChain::new();
    if profile.denoise {
        effects = effects.add_filter(DENOISE_FILTER);
    }
    effects = add_color_stage(effects, &mut graph, plan);

    let mut labeled = Vec::new();
    if let Some(pad) = plan.padding {
        labeled.push(format!(
            "{VIDEO_LABEL}pad={}:{}:{}:{},setsar=1{VIDEO_LABEL}",
            pad.padded_width, pad.padded_height, pad.x, pad.y
        ));
    }
    if profile.draw_title {
        let title = profile
            .title
            .clone()
            .unwrap_or_else(|| source.display_title());
        labeled.push(drawtext_stage(&title, target.seek, profile.font_file.as_deref()));
    }
    if profile.burn_subtitles {
        labeled.push(match sidecar_subtitle {
            Some(file) => subtitles_stage(file, 0),
            None => subtitles_stage(&source.file, profile.subtitle_stream),
        });
    } else if profile.burn_image_subtitles {
        labeled.push(format!(
            "[0:s:{}]scale={}:{}[s]",
            profile.subtitle_stream, target.width, target.height
        ));
        labeled.push(format!("{VIDEO_LABEL}[s]overlay{VIDEO_LABEL}"));
    }
    if profile.watermark.is_some() {
        labeled.push(format!(
            "{VIDEO_LABEL}[1:v:0]overlay={}{VIDEO_LABEL}",
            profile.watermark_position
        ));
    }

    // a software encoder cannot read device frames
    let download_only = hardware && !plan.encoder().is_hardware();
    if geometry.is_empty() && effects.is_empty() && labeled.is_empty() && !download_only {
        return graph;
    }

    let format = if is_ten_bit_pixel_format(&source.pixel_format) {
        "format=p010le"
    } else {
        "format=nv12"
    };
    let mut head = VideoFilterChain::new();
    if hardware {
        head = head.add_filter("hwdownload");
    }
    let head = head.append(geometry).add_filter(format).append(effects);

    if let Some(chain) = head.build() {
        graph
            .chains
            .push(format!("[{}]{chain}{VIDEO_LABEL}", graph.video_stream));
    }
    graph.chains.extend(labeled);
    if hardware && plan.encoder().is_hardware() {
        graph
            .chains
            .push(format!("{VIDEO_LABEL}hwupload_cuda{VIDEO_LABEL}"));
    }

    log::debug!("Filter graph: {}", graph.chains.join(";"));
    graph
}

fn add_color_stage(
    chain: VideoFilterChain,
    graph: &mut FilterGraph,
    plan: &ResolvedPlan,
) -> VideoFilterChain {
    let target = &plan.target;
    match plan.color {
        ColorTransform::None => chain,
        ColorTransform::FormatFix => chain.add_filter("format=yuv420p"),
        ColorTransform::ColorMatrix => chain.add_filter("colormatrix=bt601:bt709"),
        ColorTransform::Tonemap => {
            let curve = if target.tonemap.is_empty() {
                DEFAULT_TONEMAP
            } else {
                target.tonemap.as_str()
            };
            graph.device_args.extend(
                ["-init_hw_device", "opencl=gpu:0.0", "-filter_hw_device", "gpu"]
                    .map(String::from),
            );
            chain.add_filter(format!(
                "hwupload,tonemap_opencl=tonemap={curve}:param=0.01:desat=0.0:range=tv:\
                 primaries=bt709:transfer=bt709:matrix=bt709:format=nv12,hwdownload,format=nv12"
            ))
        }
        ColorTransform::PqUpconvert => match target.codec.as_str() {
            "libx265" => {
                graph
                    .output_args
                    .extend(["-pix_fmt", "yuv420p10le"].map(String::from));
                graph.x265_params = std::mem::take(&mut graph.x265_params).with_hdr10();
                chain.add_filter("zscale=transfer=smpte2084")
            }
            _ => chain.add_filter("zscale=transfer=smpte2084,format=p010le"),
        },
    }
}

/// Title card with a piecewise-linear fade.
fn drawtext_stage(title: &str, seek: f64, font_file: Option<&Path>) -> String {
    let start = seek.max(0.0).trunc() as i64;
    let display_start = start + TITLE_FADE_IN;
    let fade_out_start = display_start + TITLE_DISPLAY;
    let end = fade_out_start + TITLE_FADE_OUT;

    let font = font_file
        .map(|f| format!(":fontfile={}", escape_filter_path(f)))
        .unwrap_or_default();
    format!(
        "{VIDEO_LABEL}drawtext=enable='between(t,{start},{end})'{font}:text='{text}':fontsize=(w/17):\
         fontcolor=ffffff:alpha='if(lt(t,{start}),0,if(lt(t,{display_start}),(t-{start})/{fade_in},\
         if(lt(t,{fade_out_start}),1,if(lt(t,{end}),({fade_out}-(t-{fade_out_start}))/{fade_out},0))))':\
         x=(w-text_w)/2:y=(h-text_h)/2{VIDEO_LABEL}",
        text = escape_drawtext(title),
        fade_in = TITLE_FADE_IN,
        fade_out = TITLE_FADE_OUT,
    )
}

fn subtitles_stage(file: &Path, stream_index: u32) -> String {
    format!(
        "{VIDEO_LABEL}subtitles='{}':stream_index={stream_index}:force_style='{SUBTITLE_STYLE}'{VIDEO_LABEL}",
        escape_filter_path(file)
    )
}

/// Forward slashes, and the drive colon escaped for the filter parser.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(":/", "\\:/")
}

fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "'\\''")
        .replace(':', "\\:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::Crop;
    use crate::policy::SizeTier;
    use crate::resolver::resolve;
    use std::path::PathBuf;

    fn source(codec: &str) -> Video {
        let mut video = Video::new(Path::new("/media/Movie.2010.mkv"));
        video.width = 1920;
        video.height = 1080;
        video.size = Some(SizeTier::P1080);
        video.duration = 600.0;
        video.codec = codec.into();
        video.pixel_format = "yuv420p".into();
        video.color_transfer = "bt709".into();
        video.audio_codec = "aac".into();
        video.audio_rate = 128;
        video.audio_channels = 2;
        video
    }

    fn graph_for(source: &Video, profile: &Profile) -> FilterGraph {
        let plan = resolve(source, profile);
        build_filter_graph(source, &plan, profile, None)
    }

    #[test]
    fn filter_chain_builder() {
        assert_eq!(VideoFilterChain::new().build(), None);
        let chain = VideoFilterChain::new()
            .add_filter("crop=1920:800:0:140")
            .add_filter("")
            .add_filter("format=nv12");
        assert_eq!(chain.build().as_deref(), Some("crop=1920:800:0:140,format=nv12"));
    }

    #[test]
    fn x265_params_builder() {
        let params = X265ParamsBuilder::new().with_hdr10().add_param("pass", "2");
        assert_eq!(
            params.build(),
            "hdr-opt=1:repeat-headers=1:colorprim=bt2020:transfer=smpte2084:colormatrix=bt2020nc:pass=2"
        );
    }

    #[test]
    fn untouched_software_source_maps_stream() {
        let graph = graph_for(&source("h264"), &Profile::default());
        assert_eq!(graph.filter_complex(), None);
        assert_eq!(graph.video_map(), "0:v:0");
        assert_eq!(graph.input_args, vec!["-c:v", "h264"]);
    }

    #[test]
    fn hardware_path_keeps_crop_and_resize_on_decoder() {
        let mut src = source("h264_cuvid");
        src.width = 1920;
        src.height = 800;
        src.crop = Crop {
            top: 140,
            bottom: 140,
            left: 0,
            right: 0,
        };
        let profile = Profile {
            size: Some(SizeTier::P720),
            codec: Some("h264_nvenc".into()),
            ..Profile::default()
        };
        let plan = resolve(&src, &profile);
        let graph = build_filter_graph(&src, &plan, &profile, None);

        assert_eq!(
            graph.input_args,
            vec![
                "-hwaccel",
                "cuda",
                "-hwaccel_output_format",
                "cuda",
                "-c:v",
                "h264_cuvid",
                "-crop",
                "140x140x0x0",
                "-resize",
                "1280x534",
            ]
        );
        // pad to 544 needs software: download first, upload at the end
        assert_eq!(
            graph.chains,
            vec![
                "[0:v:0]hwdownload,format=nv12[v]".to_string(),
                "[v]pad=1280:544:0:5,setsar=1[v]".to_string(),
                "[v]hwupload_cuda[v]".to_string(),
            ]
        );
        assert_eq!(graph.video_map(), "[v]");
    }

    #[test]
    fn hardware_path_without_software_stages_stays_on_device() {
        let profile = Profile {
            size: Some(SizeTier::P720),
            codec: Some("hevc_nvenc".into()),
            ..Profile::default()
        };
        let graph = graph_for(&source("hevc_cuvid"), &profile);
        assert_eq!(graph.filter_complex(), None);
        assert!(graph.input_args.contains(&"1280x720".to_string()));
        assert!(!graph.input_args.contains(&"-crop".to_string()));
    }

    #[test]
    fn hardware_decode_into_software_encoder_downloads_frames() {
        let profile = Profile {
            codec: Some("libx264".into()),
            ..Profile::default()
        };
        let graph = graph_for(&source("h264_cuvid"), &profile);
        assert_eq!(graph.chains, vec!["[0:v:0]hwdownload,format=nv12[v]".to_string()]);
        assert_eq!(graph.video_map(), "[v]");
        assert!(graph.input_args.contains(&"h264_cuvid".to_string()));
    }

    #[test]
    fn ten_bit_hardware_decode_downloads_as_p010() {
        let mut src = source("hevc_cuvid");
        src.pixel_format = "yuv420p10le".into();
        let profile = Profile {
            codec: Some("libx265".into()),
            ..Profile::default()
        };
        let graph = graph_for(&src, &profile);
        assert_eq!(graph.filter_complex().as_deref(), Some("[0:v:0]hwdownload,format=p010le[v]"));
    }

    #[test]
    fn software_path_crops_and_scales_in_graph() {
        let mut src = source("h264");
        src.width = 1920;
        src.height = 800;
        src.crop = Crop {
            top: 140,
            bottom: 140,
            left: 0,
            right: 0,
        };
        let profile = Profile {
            size: Some(SizeTier::P720),
            codec: Some("libx264".into()),
            denoise: true,
            ..Profile::default()
        };
        let graph = graph_for(&src, &profile);
        assert_eq!(
            graph.chains[0],
            "[0:v:0]crop=1920:800:0:140,scale=1280:534,format=nv12,nlmeans=s=1:p=7:pc=5:r=5:rc=5[v]"
        );
        assert_eq!(graph.chains[1], "[v]pad=1280:544:0:5,setsar=1[v]");
        assert_eq!(graph.chains.len(), 2);
    }

    #[test]
    fn hdr_source_is_tonemapped_on_opencl() {
        let mut src = source("hevc_cuvid");
        src.width = 3840;
        src.height = 2160;
        src.pixel_format = "yuv420p10le".into();
        src.color_transfer = "smpte2084".into();
        let profile = Profile {
            size: Some(SizeTier::P1080),
            color_transfer: Some("bt709".into()),
            codec: Some("h264_nvenc".into()),
            ..Profile::default()
        };
        let graph = graph_for(&src, &profile);

        assert_eq!(
            graph.device_args,
            vec!["-init_hw_device", "opencl=gpu:0.0", "-filter_hw_device", "gpu"]
        );
        assert_eq!(
            graph.chains[0],
            "[0:v:0]hwdownload,format=p010le,hwupload,tonemap_opencl=tonemap=mobius:param=0.01:\
             desat=0.0:range=tv:primaries=bt709:transfer=bt709:matrix=bt709:format=nv12,\
             hwdownload,format=nv12[v]"
        );
        assert_eq!(graph.chains.last().map(String::as_str), Some("[v]hwupload_cuda[v]"));
    }

    #[test]
    fn tonemap_curve_follows_profile() {
        let mut src = source("hevc");
        src.color_transfer = "arib-std-b67".into();
        let profile = Profile {
            color_transfer: Some("bt709".into()),
            tonemap: "hable".into(),
            ..Profile::default()
        };
        let graph = graph_for(&src, &profile);
        assert!(graph.chains[0].contains("tonemap=hable:"));
    }

    #[test]
    fn legacy_transfer_gets_color_matrix() {
        let mut src = source("mpeg2video");
        src.color_transfer = "unknown".into();
        let profile = Profile {
            color_transfer: Some("bt709".into()),
            ..Profile::default()
        };
        let graph = graph_for(&src, &profile);
        assert_eq!(graph.chains[0], "[0:v:0]format=nv12,colormatrix=bt601:bt709[v]");
    }

    #[test]
    fn pq_upconvert_for_x265() {
        let profile = Profile {
            color_transfer: Some("smpte2084".into()),
            codec: Some("libx265".into()),
            ..Profile::default()
        };
        let graph = graph_for(&source("h264"), &profile);
        assert_eq!(graph.chains[0], "[0:v:0]format=nv12,zscale=transfer=smpte2084[v]");
        assert_eq!(graph.output_args, vec!["-pix_fmt", "yuv420p10le"]);
        assert!(graph.x265_params.build().starts_with("hdr-opt=1"));

        let nvenc = graph_for(
            &source("h264"),
            &Profile {
                codec: Some("hevc_nvenc".into()),
                ..profile
            },
        );
        assert!(nvenc.chains[0].contains("zscale=transfer=smpte2084,format=p010le"));
        assert!(nvenc.x265_params.is_empty());
    }

    #[test]
    fn title_card_fades_from_seek() {
        let profile = Profile {
            draw_title: true,
            seek: 30.7,
            font_file: Some(PathBuf::from("/fonts/Arial.ttf")),
            ..Profile::default()
        };
        let graph = graph_for(&source("h264"), &profile);
        assert_eq!(graph.chains[0], "[0:v:0]format=nv12[v]");
        assert_eq!(
            graph.chains[1],
            "[v]drawtext=enable='between(t,30,33)':fontfile=/fonts/Arial.ttf:text='MOVIE 2010':\
             fontsize=(w/17):fontcolor=ffffff:alpha='if(lt(t,30),0,if(lt(t,30),(t-30)/0,\
             if(lt(t,32),1,if(lt(t,33),(1-(t-32))/1,0))))':x=(w-text_w)/2:y=(h-text_h)/2[v]"
        );
    }

    #[test]
    fn explicit_title_is_escaped() {
        let profile = Profile {
            draw_title: true,
            title: Some("Part 2: Don't".into()),
            ..Profile::default()
        };
        let graph = graph_for(&source("h264"), &profile);
        assert!(graph.chains[1].contains(r"text='Part 2\: Don'\''t'"));
    }

    #[test]
    fn subtitle_burn_in() {
        let profile = Profile {
            burn_subtitles: true,
            subtitle_stream: 2,
            ..Profile::default()
        };
        let src = source("h264");
        let plan = resolve(&src, &profile);

        let embedded = build_filter_graph(&src, &plan, &profile, None);
        assert_eq!(
            embedded.chains[1],
            "[v]subtitles='/media/Movie.2010.mkv':stream_index=2:\
             force_style='Fontname=Arial,Shadow=0,Fontsize=16'[v]"
        );

        let sidecar = build_filter_graph(&src, &plan, &profile, Some(Path::new(r"C:\media\Movie.2010.srt")));
        assert!(sidecar.chains[1].starts_with(r"[v]subtitles='C\:/media/Movie.2010.srt':stream_index=0:"));
    }

    #[test]
    fn image_subtitles_and_watermark() {
        let profile = Profile {
            burn_image_subtitles: true,
            subtitle_stream: 1,
            watermark: Some(PathBuf::from("logo.png")),
            watermark_position: "48:H-h-48".into(),
            ..Profile::default()
        };
        let graph = graph_for(&source("h264"), &profile);
        assert_eq!(
            &graph.chains[1..],
            &[
                "[0:s:1]scale=1920:1080[s]".to_string(),
                "[v][s]overlay[v]".to_string(),
                "[v][1:v:0]overlay=48:H-h-48[v]".to_string(),
            ]
        );
    }

    #[test]
    fn copy_has_no_graph() {
        let profile = Profile {
            codec: Some("copy".into()),
            draw_title: true,
            ..Profile::default()
        };
        let graph = graph_for(&source("h264_cuvid"), &profile);
        assert!(graph.chains.is_empty());
        assert!(graph.input_args.is_empty());
        assert_eq!(graph.video_map(), "0:v:0");
    }
}
