//! Media playlist rendering.
//!
//! Renders a chunklist snapshot into the two wire variants of the live
//! playlist: the full listing (`EXT-X-VERSION:6`) and the skip-capable
//! listing (`EXT-X-VERSION:9`), which may elide a prefix of old segments
//! behind an `EXT-X-SKIP` marker. Rendering is a pure function of the
//! snapshot and the static config; it takes no locks.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;
use std::sync::Arc;

use crate::config::{ChunklistConfig, MediaType};
use crate::segment::Segment;

/// Parts are listed only for this many of the newest segments.
const PART_WINDOW: i64 = 4;

/// Skip elision is only considered once the window is this deep.
const SKIP_MIN_SEGMENTS: usize = 10;

/// Both playlist variants, rendered together from one snapshot.
#[derive(Debug, Clone, Default)]
pub struct PlaylistPair {
    /// Full listing, `EXT-X-VERSION:6`.
    pub full: String,
    /// Skip-capable listing, `EXT-X-VERSION:9`.
    pub skip: String,
}

/// Render both playlist variants from a chunklist snapshot.
///
/// An empty snapshot renders both variants as the empty string.
pub fn render_variants(config: &ChunklistConfig, segments: &[Arc<Segment>]) -> PlaylistPair {
    if segments.is_empty() {
        return PlaylistPair::default();
    }

    // Elision is computed for deep windows but not applied yet.
    let (_can_skip_until, _skipped_segments) =
        skip_horizon(config.target_duration, segments.len());
    let (can_skip_until, skipped_segments) = (0.0, 0);

    PlaylistPair {
        full: render_variant(config, segments, false, can_skip_until, skipped_segments),
        skip: render_variant(config, segments, true, can_skip_until, skipped_segments),
    }
}

/// Skip horizon for a window: `(CAN-SKIP-UNTIL seconds, segments to elide)`.
///
/// Elision only kicks in once the window holds at least ten segments, and
/// then covers roughly the oldest third.
fn skip_horizon(target_duration: f64, window: usize) -> (f64, usize) {
    if window >= SKIP_MIN_SEGMENTS {
        let skipped = window / 3;
        (target_duration * skipped as f64, skipped)
    } else {
        (0.0, 0)
    }
}

fn render_variant(
    config: &ChunklistConfig,
    segments: &[Arc<Segment>],
    skip: bool,
    can_skip_until: f64,
    skipped_segments: usize,
) -> String {
    let mut out = String::new();

    writeln!(out, "#EXTM3U").unwrap();
    // Since protocol version 6, TARGETDURATION is the maximum segment
    // duration rounded to the nearest integer number of seconds.
    writeln!(
        out,
        "#EXT-X-TARGETDURATION:{}",
        config.target_duration.round() as u32
    )
    .unwrap();

    write!(
        out,
        "#EXT-X-SERVER-CONTROL:CAN-BLOCK-RELOAD=YES,PART-HOLD-BACK={:.1}",
        config.part_target_duration * 3.0
    )
    .unwrap();
    if skip && can_skip_until > 0.0 {
        write!(out, ",CAN-SKIP-UNTIL={:.1}", can_skip_until).unwrap();
    }
    writeln!(out).unwrap();

    writeln!(out, "#EXT-X-VERSION:{}", if skip { 9 } else { 6 }).unwrap();
    writeln!(
        out,
        "#EXT-X-PART-INF:PART-TARGET={:.6}",
        config.part_target_duration
    )
    .unwrap();
    writeln!(out, "#EXT-X-MEDIA-SEQUENCE:{}", segments[0].sequence).unwrap();
    writeln!(out, "#EXT-X-MAP:URI=\"{}\"", config.map_uri).unwrap();

    let last_index = segments.len() - 1;
    let newest_sequence = segments[last_index].sequence;
    let mut skip_count = 0;

    for (index, segment) in segments.iter().enumerate() {
        if skip && skip_count < skipped_segments {
            if skip_count == 0 {
                writeln!(out, "#EXT-X-SKIP:SKIPPED-SEGMENTS={}", skipped_segments).unwrap();
            }
            skip_count += 1;
            continue;
        }

        writeln!(
            out,
            "#EXT-X-PROGRAM-DATE-TIME:{}",
            program_date_time(segment.effective_start_time_ms())
        )
        .unwrap();

        // Parts are only listed for the newest few segments.
        if segment.sequence > newest_sequence - PART_WINDOW {
            for (part_index, part) in segment.parts.iter().enumerate() {
                write!(
                    out,
                    "#EXT-X-PART:DURATION={:.3},URI=\"{}\"",
                    part.duration_secs, part.url
                )
                .unwrap();
                if config.media_type == MediaType::Video && part.is_independent {
                    write!(out, ",INDEPENDENT=YES").unwrap();
                }
                writeln!(out).unwrap();

                // The newest part advertises where the next one will appear.
                if index == last_index && part_index == segment.parts.len() - 1 {
                    writeln!(
                        out,
                        "#EXT-X-PRELOAD-HINT:TYPE=PART,URI=\"{}\"",
                        part.next_url
                    )
                    .unwrap();
                }
            }
        }

        // Incomplete segments contribute only their parts.
        if segment.completed {
            writeln!(out, "#EXTINF:{:.3},", segment.duration_secs).unwrap();
            writeln!(out, "{}", segment.url).unwrap();
        }
    }

    out
}

/// ISO-8601 timestamp for `EXT-X-PROGRAM-DATE-TIME`, millisecond precision.
fn program_date_time(start_time_ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(start_time_ms as i64)
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_config() -> ChunklistConfig {
        ChunklistConfig {
            media_type: MediaType::Video,
            max_segments: 10,
            target_duration: 6.0,
            part_target_duration: 1.0,
            map_uri: "init.mp4".to_string(),
        }
    }

    #[test]
    fn test_skip_horizon_shallow_window() {
        assert_eq!(skip_horizon(6.0, 0), (0.0, 0));
        assert_eq!(skip_horizon(6.0, 9), (0.0, 0));
    }

    #[test]
    fn test_skip_horizon_deep_window() {
        assert_eq!(skip_horizon(6.0, 10), (18.0, 3));
        assert_eq!(skip_horizon(6.0, 12), (24.0, 4));
    }

    #[test]
    fn test_program_date_time_format() {
        assert_eq!(program_date_time(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(
            program_date_time(1_600_000_000_000),
            "2020-09-13T12:26:40.000Z"
        );
    }

    #[test]
    fn test_empty_snapshot_renders_empty() {
        let pair = render_variants(&video_config(), &[]);
        assert!(pair.full.is_empty());
        assert!(pair.skip.is_empty());
    }

    #[test]
    fn test_header_block() {
        let segments = vec![Arc::new({
            let mut segment = Segment::new(0, 0, 6.0, 1_000, "seg0.m4s", "", true);
            segment.completed = true;
            segment
        })];

        let pair = render_variants(&video_config(), &segments);

        assert!(pair.full.starts_with("#EXTM3U\n#EXT-X-TARGETDURATION:6\n"));
        assert!(pair
            .full
            .contains("#EXT-X-SERVER-CONTROL:CAN-BLOCK-RELOAD=YES,PART-HOLD-BACK=3.0\n"));
        assert!(pair.full.contains("#EXT-X-VERSION:6\n"));
        assert!(pair.skip.contains("#EXT-X-VERSION:9\n"));
        assert!(pair.full.contains("#EXT-X-PART-INF:PART-TARGET=1.000000\n"));
        assert!(pair.full.contains("#EXT-X-MEDIA-SEQUENCE:0\n"));
        assert!(pair.full.contains("#EXT-X-MAP:URI=\"init.mp4\"\n"));
    }
}
