//! Subtitle-style timed text parsing
//!
//! Transcription runs emit an SRT-like file next to the plain transcript:
//!
//! ```text
//! 1
//! 00:00:00,000 --> 00:00:02,500
//! Bonjour et bienvenue
//! sur Station TV
//!
//! 2
//! 00:00:02,500 --> 00:00:04,000
//! Voici les titres
//! ```
//!
//! Each blank-line separated block becomes one [`Segment`]: the first line
//! is the index, the second the time range, everything after is the cue
//! text joined with single spaces. Neither the index nor the timecodes are
//! validated; they are carried through untouched for display.
//!
//! Blocks with fewer than three non-empty lines are not cues (stray
//! numbering, trailing garbage) and are dropped without complaint.

use crate::error::{read_text, ReportError};
use crate::model::Segment;
use std::path::Path;
use tracing::{debug, warn};

/// Minimum lines for a block to count as a cue: index, time range, text.
const MIN_BLOCK_LINES: usize = 3;

/// Parse timed text already loaded in memory.
pub fn parse(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    // `lines()` strips both `\n` and `\r\n`
    for line in content.lines().map(str::trim) {
        if line.is_empty() {
            push_block(&mut segments, &block);
            block.clear();
        } else {
            block.push(line);
        }
    }
    push_block(&mut segments, &block);

    segments
}

fn push_block(segments: &mut Vec<Segment>, block: &[&str]) {
    if block.len() < MIN_BLOCK_LINES {
        return;
    }
    segments.push(Segment {
        index: block[0].to_string(),
        time_range: block[1].to_string(),
        text: block[2..].join(" "),
    });
}

/// Read and parse a timed-text file.
pub fn read<P: AsRef<Path>>(path: P) -> Result<Vec<Segment>, ReportError> {
    let path = path.as_ref();
    let content = read_text(path)?;
    // A leading BOM would otherwise end up glued to the first index
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    Ok(parse(content))
}

/// Read a timed-text file, treating any failure as "no segments".
///
/// The failure is logged; a report without segments is still a valid
/// report.
pub fn load<P: AsRef<Path>>(path: P) -> Vec<Segment> {
    let path = path.as_ref();
    match read(path) {
        Ok(segments) => {
            debug!(path = %path.display(), count = segments.len(), "parsed timed text");
            segments
        }
        Err(e) => {
            warn!(error = %e, "could not parse timed text, continuing without segments");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // BLOCK SPLITTING TESTS
    // ==========================================================================
    //
    // A cue is any run of non-blank lines with at least three entries.
    // Everything else between blank lines is noise.
    // ==========================================================================

    const SAMPLE: &str = "1\n00:00:00,000 --> 00:00:02,500\nBonjour et bienvenue\nsur Station TV\n\n2\n00:00:02,500 --> 00:00:04,000\nVoici les titres\n";

    #[test]
    fn test_parse_two_cues_in_order() {
        let segments = parse(SAMPLE);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].index, "1");
        assert_eq!(segments[0].time_range, "00:00:00,000 --> 00:00:02,500");
        assert_eq!(segments[0].text, "Bonjour et bienvenue sur Station TV");
        assert_eq!(segments[1].index, "2");
        assert_eq!(segments[1].text, "Voici les titres");
    }

    #[test]
    fn test_short_blocks_are_dropped() {
        let content = "1\n00:00:00,000 --> 00:00:01,000\n\n2\n00:00:01,000 --> 00:00:02,000\nkept\n\norphan\n";
        let segments = parse(content);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].index, "2");
        assert_eq!(segments[0].text, "kept");
    }

    #[test]
    fn test_no_qualifying_blocks_is_empty_not_error() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n\n").is_empty());
        assert!(parse("1\n2\n\n3\n").is_empty());
    }

    #[test]
    fn test_crlf_and_extra_blank_lines() {
        let content = "\r\n\r\n1\r\n00:00 --> 00:01\r\nhello\r\n\r\n\r\n\r\n2\r\n00:01 --> 00:02\r\nworld\r\n";
        let segments = parse(content);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "hello");
        assert_eq!(segments[1].time_range, "00:01 --> 00:02");
    }

    #[test]
    fn test_whitespace_only_lines_separate_blocks() {
        let content = "1\n00:00 --> 00:01\na\n   \t\n2\n00:01 --> 00:02\nb\n";
        assert_eq!(parse(content).len(), 2);
    }

    #[test]
    fn test_lines_are_trimmed_before_joining() {
        let content = "  7  \n  00:00 --> 00:01 \n  first  \n second\n";
        let segments = parse(content);

        assert_eq!(segments[0].index, "7");
        assert_eq!(segments[0].time_range, "00:00 --> 00:01");
        assert_eq!(segments[0].text, "first second");
    }

    #[test]
    fn test_timecodes_are_not_validated() {
        // Whatever sits on line two is passed through as-is
        let segments = parse("A\nsometime later\ntext\n");
        assert_eq!(segments[0].index, "A");
        assert_eq!(segments[0].time_range, "sometime later");
    }

    #[test]
    fn test_segment_count_matches_block_count() {
        let mut content = String::new();
        for i in 1..=25 {
            content.push_str(&format!("{i}\n00:00 --> 00:01\nline {i}\n\n"));
        }
        let segments = parse(&content);

        assert_eq!(segments.len(), 25);
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(seg.index, (i + 1).to_string());
            assert_eq!(seg.text, format!("line {}", i + 1));
        }
    }

    // ==========================================================================
    // FILE BOUNDARY TESTS
    // ==========================================================================

    #[test]
    fn test_read_missing_file() {
        let err = read("/definitely/not/here.srt").unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        assert!(load("/definitely/not/here.srt").is_empty());
    }

    #[test]
    fn test_load_undecodable_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.srt");
        std::fs::write(&path, [0xff, 0xff, 0x0a, 0xff]).unwrap();

        assert!(load(&path).is_empty());
    }

    #[test]
    fn test_read_strips_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.srt");
        std::fs::write(&path, "\u{feff}1\n00:00 --> 00:01\nsalut\n").unwrap();

        let segments = read(&path).unwrap();
        assert_eq!(segments[0].index, "1");
    }
}
