//! Subtitle generation from transcripts.
//!
//! SRT is written alongside the intermediate files as the human-readable
//! transcript; ASS drives the burn-in, since it can pin each line to a fixed
//! point of the frame.

use crate::capabilities::base::{TranscriptSegment, TARGET_HEIGHT, TARGET_WIDTH};
use std::cmp::Ordering;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// Vertical anchor of burned-in subtitles, as a fraction of frame height.
pub const SUBTITLE_VERTICAL_POSITION: f64 = 0.70;

/// Clean up raw transcriber output for display.
///
/// Drops blank or inverted segments, orders by start time and clamps each
/// end to the following start, so at most one segment is visible at a time.
pub fn normalize_segments(segments: &[TranscriptSegment]) -> Vec<TranscriptSegment> {
    let mut cleaned: Vec<TranscriptSegment> = segments
        .iter()
        .filter(|s| s.start.is_finite() && s.end.is_finite())
        .filter(|s| s.start >= 0.0 && s.end > s.start)
        .filter(|s| !s.text.trim().is_empty())
        .map(|s| TranscriptSegment::new(s.start, s.end, s.text.trim()))
        .collect();

    cleaned.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));

    for i in 1..cleaned.len() {
        let next_start = cleaned[i].start;
        let prev = &mut cleaned[i - 1];
        if prev.end > next_start {
            prev.end = next_start;
        }
    }

    cleaned.retain(|s| s.end > s.start);
    cleaned
}

/// The segment on screen at time `t`, if any.
pub fn active_segment_at(segments: &[TranscriptSegment], t: f64) -> Option<&TranscriptSegment> {
    segments.iter().find(|s| s.contains(t))
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
pub fn format_srt_time(seconds: f64) -> String {
    let ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// Format seconds as an ASS timestamp (`H:MM:SS.cc`).
pub fn format_ass_time(seconds: f64) -> String {
    let cs = (seconds.max(0.0) * 100.0).round() as u64;
    let hours = cs / 360_000;
    let minutes = (cs % 360_000) / 6000;
    let secs = (cs % 6000) / 100;
    let centis = cs % 100;
    format!("{hours}:{minutes:02}:{secs:02}.{centis:02}")
}

/// Render segments as an SRT document.
pub fn render_srt(segments: &[TranscriptSegment]) -> String {
    let mut output = String::new();

    for (i, segment) in segments.iter().enumerate() {
        let _ = writeln!(output, "{}", i + 1);
        let _ = writeln!(
            output,
            "{} --> {}",
            format_srt_time(segment.start),
            format_srt_time(segment.end)
        );
        let _ = writeln!(output, "{}", segment.text.trim());
        let _ = writeln!(output);
    }

    output
}

/// Write an SRT document to `path`.
pub async fn write_srt(path: &Path, segments: &[TranscriptSegment]) -> std::io::Result<()> {
    tokio::fs::write(path, render_srt(segments)).await
}

/// Style configuration for burned-in subtitles.
#[derive(Debug, Clone)]
pub struct SubtitleStyle {
    pub font_name: String,
    pub font_size: u32,
    /// Primary color (AABBGGRR format for ASS)
    pub primary_color: String,
    pub outline_color: String,
    pub outline: f32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_name: "Impact".to_string(),
            font_size: 52,
            primary_color: "&H00FFFFFF".to_string(), // White
            outline_color: "&H00000000".to_string(), // Black
            outline: 3.0,
        }
    }
}

impl SubtitleStyle {
    fn to_ass_line(&self) -> String {
        format!(
            "Style: Default,{},{},{},&H000000FF,{},&H00000000,0,0,0,0,100,100,0,0,1,{},0,8,40,40,0,1",
            self.font_name, self.font_size, self.primary_color, self.outline_color, self.outline
        )
    }
}

/// Render segments as an ASS document for a 1080x1920 frame.
///
/// Each line is centred horizontally with its top edge at
/// [`SUBTITLE_VERTICAL_POSITION`] of the frame height.
pub fn render_ass(segments: &[TranscriptSegment], style: &SubtitleStyle) -> String {
    let x = TARGET_WIDTH / 2;
    let y = (f64::from(TARGET_HEIGHT) * SUBTITLE_VERTICAL_POSITION).round() as u32;

    let mut output = String::new();
    let _ = writeln!(output, "[Script Info]");
    let _ = writeln!(output, "ScriptType: v4.00+");
    let _ = writeln!(output, "PlayResX: {TARGET_WIDTH}");
    let _ = writeln!(output, "PlayResY: {TARGET_HEIGHT}");
    let _ = writeln!(output, "WrapStyle: 0");
    let _ = writeln!(output, "ScaledBorderAndShadow: yes");
    let _ = writeln!(output);

    let _ = writeln!(output, "[V4+ Styles]");
    let _ = writeln!(
        output,
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
    );
    let _ = writeln!(output, "{}", style.to_ass_line());
    let _ = writeln!(output);

    let _ = writeln!(output, "[Events]");
    let _ = writeln!(
        output,
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
    );
    for segment in segments {
        let _ = writeln!(
            output,
            "Dialogue: 0,{},{},Default,,0,0,0,,{{\\an8\\pos({x},{y})}}{}",
            format_ass_time(segment.start),
            format_ass_time(segment.end),
            escape_ass_text(&segment.text)
        );
    }

    output
}

/// Keep transcript text from being read as ASS override blocks.
fn escape_ass_text(text: &str) -> String {
    text.trim()
        .replace('{', "(")
        .replace('}', ")")
        .replace('\n', "\\N")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(3.5), "00:00:03,500");
        assert_eq!(format_srt_time(3661.0014), "01:01:01,001");
    }

    #[test]
    fn test_format_ass_time() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(65.456), "0:01:05.46");
        assert_eq!(format_ass_time(3600.0), "1:00:00.00");
    }

    #[test]
    fn test_render_srt() {
        let segments = vec![
            TranscriptSegment::new(0.0, 1.5, " Hello there. "),
            TranscriptSegment::new(1.5, 3.0, "General Kenobi."),
        ];

        let srt = render_srt(&segments);
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:01,500\nHello there.\n\n2\n00:00:01,500 --> 00:00:03,000\nGeneral Kenobi.\n\n"
        );
    }

    #[test]
    fn test_normalize_clamps_overlaps() {
        let segments = vec![
            TranscriptSegment::new(2.0, 4.0, "second"),
            TranscriptSegment::new(0.0, 2.5, "first"),
            TranscriptSegment::new(4.0, 4.0, "zero length"),
            TranscriptSegment::new(4.5, 6.0, "   "),
        ];

        let normalized = normalize_segments(&segments);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0], TranscriptSegment::new(0.0, 2.0, "first"));
        assert_eq!(normalized[1], TranscriptSegment::new(2.0, 4.0, "second"));
    }

    #[test]
    fn test_never_two_segments_visible() {
        let segments = normalize_segments(&[
            TranscriptSegment::new(0.0, 1.2, "a"),
            TranscriptSegment::new(1.0, 2.0, "b"),
            TranscriptSegment::new(1.9, 3.0, "c"),
        ]);

        let mut t = 0.0;
        while t < 3.5 {
            let visible = segments.iter().filter(|s| s.contains(t)).count();
            assert!(visible <= 1, "{visible} segments visible at {t}");
            t += 0.05;
        }
    }

    #[test]
    fn test_active_segment_window() {
        let segments = vec![
            TranscriptSegment::new(0.0, 1.0, "a"),
            TranscriptSegment::new(1.0, 2.0, "b"),
        ];

        assert_eq!(active_segment_at(&segments, 0.0).map(|s| s.text.as_str()), Some("a"));
        assert_eq!(active_segment_at(&segments, 1.0).map(|s| s.text.as_str()), Some("b"));
        assert!(active_segment_at(&segments, 2.0).is_none());
    }

    #[test]
    fn test_render_ass_positions_at_seventy_percent() {
        let segments = vec![TranscriptSegment::new(0.5, 1.25, "Hi {there}")];
        let ass = render_ass(&segments, &SubtitleStyle::default());

        assert!(ass.contains("PlayResX: 1080"));
        assert!(ass.contains("PlayResY: 1920"));
        assert!(ass.contains("Style: Default,Impact,52,"));
        assert!(ass.contains(
            "Dialogue: 0,0:00:00.50,0:00:01.25,Default,,0,0,0,,{\\an8\\pos(540,1344)}Hi (there)"
        ));
    }
}
