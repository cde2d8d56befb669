//! ffmpeg-backed compositor.

use crate::capabilities::base::{
    CapabilityError, Compositor, TranscriptSegment, TARGET_HEIGHT, TARGET_WIDTH,
};
use crate::capabilities::runner::CommandRunner;
use crate::subtitles::{render_ass, SubtitleStyle};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const OUTPUT_FPS: u32 = 30;

/// Read a media file's duration with ffprobe.
pub async fn probe_duration(ffprobe: &str, path: &Path) -> Result<Duration, String> {
    let args: [&OsStr; 7] = [
        OsStr::new("-v"),
        OsStr::new("error"),
        OsStr::new("-show_entries"),
        OsStr::new("format=duration"),
        OsStr::new("-of"),
        OsStr::new("default=noprint_wrappers=1:nokey=1"),
        path.as_os_str(),
    ];
    let output = CommandRunner::run(ffprobe, args, None)
        .await
        .map_err(|e| e.to_string())?;

    parse_probe_duration(&output.stdout)
}

fn parse_probe_duration(stdout: &str) -> Result<Duration, String> {
    let raw = stdout.trim();
    let secs: f64 = raw
        .parse()
        .map_err(|_| format!("Unexpected ffprobe duration: '{raw}'"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("Invalid duration {secs}: {e}"))
}

/// Video filter that fills the 9:16 frame: scale up until both sides cover
/// it, then crop the overflow around the centre.
fn fill_frame_filter() -> String {
    format!(
        "scale={TARGET_WIDTH}:{TARGET_HEIGHT}:force_original_aspect_ratio=increase,crop={TARGET_WIDTH}:{TARGET_HEIGHT},setsar=1,fps={OUTPUT_FPS}"
    )
}

/// Filter graph normalising `count` inputs and joining them in order.
fn concat_filter(count: usize) -> String {
    let fill = fill_frame_filter();
    let mut graph = String::new();
    for i in 0..count {
        graph.push_str(&format!("[{i}:v]{fill}[v{i}];"));
    }
    for i in 0..count {
        graph.push_str(&format!("[v{i}]"));
    }
    graph.push_str(&format!("concat=n={count}:v=1:a=0[out]"));
    graph
}

fn absolute(path: &Path) -> Result<PathBuf, CapabilityError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| CapabilityError::Composition(e.to_string()))
}

pub struct FfmpegCompositor {
    ffmpeg: String,
    ffprobe: String,
    style: SubtitleStyle,
}

impl FfmpegCompositor {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            style: SubtitleStyle::default(),
        }
    }

    pub fn with_style(mut self, style: SubtitleStyle) -> Self {
        self.style = style;
        self
    }

    async fn ffmpeg(
        &self,
        args: Vec<String>,
        working_dir: Option<&Path>,
    ) -> Result<(), CapabilityError> {
        CommandRunner::run(&self.ffmpeg, &args, working_dir)
            .await
            .map(|_| ())
            .map_err(|e| CapabilityError::Composition(e.to_string()))
    }
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[async_trait]
impl Compositor for FfmpegCompositor {
    async fn concatenate(
        &self,
        videos: &[PathBuf],
        dest: &Path,
    ) -> Result<PathBuf, CapabilityError> {
        if videos.is_empty() {
            return Err(CapabilityError::Composition(
                "No videos to concatenate".to_string(),
            ));
        }

        let mut args = vec!["-y".to_string(), "-hide_banner".to_string()];
        for video in videos {
            args.push("-i".to_string());
            args.push(arg(video));
        }
        args.extend([
            "-filter_complex".to_string(),
            concat_filter(videos.len()),
            "-map".to_string(),
            "[out]".to_string(),
            "-an".to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            arg(dest),
        ]);

        debug!(clips = videos.len(), dest = %dest.display(), "Concatenating clips");
        self.ffmpeg(args, None).await?;
        Ok(dest.to_path_buf())
    }

    async fn compose(
        &self,
        video: &Path,
        audio: &Path,
        dest: &Path,
    ) -> Result<PathBuf, CapabilityError> {
        let audio_duration = probe_duration(&self.ffprobe, audio)
            .await
            .map_err(CapabilityError::Composition)?;

        let args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-i".to_string(),
            arg(video),
            "-i".to_string(),
            arg(audio),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-vf".to_string(),
            fill_frame_filter(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-t".to_string(),
            format!("{:.3}", audio_duration.as_secs_f64()),
            "-shortest".to_string(),
            arg(dest),
        ];

        debug!(
            audio_secs = audio_duration.as_secs_f64(),
            dest = %dest.display(),
            "Composing video"
        );
        self.ffmpeg(args, None).await?;
        Ok(dest.to_path_buf())
    }

    async fn burn_subtitles(
        &self,
        video: &Path,
        segments: &[TranscriptSegment],
        dest: &Path,
    ) -> Result<PathBuf, CapabilityError> {
        let video = absolute(video)?;
        let dest = absolute(dest)?;
        let ass_path = dest.with_extension("ass");
        let work_dir = ass_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| CapabilityError::Composition("Destination has no parent".to_string()))?;
        let ass_name = ass_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| CapabilityError::Composition("Invalid subtitle path".to_string()))?;

        tokio::fs::write(&ass_path, render_ass(segments, &self.style))
            .await
            .map_err(|e| CapabilityError::Composition(e.to_string()))?;

        // The filter is given a bare file name and run from its directory,
        // which sidesteps filter-graph path escaping.
        let args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-i".to_string(),
            arg(&video),
            "-vf".to_string(),
            format!("ass={ass_name}"),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
            arg(&dest),
        ];

        debug!(segments = segments.len(), dest = %dest.display(), "Burning subtitles");
        self.ffmpeg(args, Some(&work_dir)).await?;
        Ok(dest)
    }
}
