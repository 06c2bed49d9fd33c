use std::fmt;

use serde::Serialize;

use crate::sanitize::clip_label;

/// A time position exactly as the user or the source tool wrote it ("MM:SS" or
/// "HH:MM:SS"). Never parsed or re-normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TimeOffset(String);

impl TimeOffset {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Position handed to the cutter: the raw text behind an hour field of `00:`.
    ///
    /// Only correct for "MM:SS" input. An "HH:MM:SS" value (such as a duration of
    /// `1:02:03`) ends up with two hour fields and the cut fails.
    pub fn cut_position(&self) -> String {
        format!("00:{}", self.0)
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TimeOffset {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// One non-blank line of timestamp text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampLine {
    pub start: TimeOffset,
    pub label: String,
}

impl TimestampLine {
    /// Split a line into its leading time token and the label words after it.
    /// Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let start = tokens.next()?;
        let label = tokens.collect::<Vec<_>>().join(" ");
        Some(Self {
            start: TimeOffset::new(start),
            label,
        })
    }
}

/// A named time range of the source track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub index: usize,
    pub label: String,
    pub start: TimeOffset,
    pub end: TimeOffset,
}

impl Segment {
    /// `NN-label.ext`, with the 1-based index padded to two digits.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{:02}-{}.{}", self.index, self.label, extension)
    }
}

pub fn parse_timestamp_lines(timestamp_text: &str) -> Vec<TimestampLine> {
    timestamp_text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(TimestampLine::parse)
        .collect()
}

/// Turn timestamp text into consecutive segments ending at `total_duration`.
///
/// Lines are kept in input order; each segment ends where the next one starts and the
/// last one ends at `total_duration`. Empty or blank text yields no segments, meaning
/// the whole track is a single output.
pub fn compute_segments(timestamp_text: &str, total_duration: &TimeOffset) -> Vec<Segment> {
    let lines = parse_timestamp_lines(timestamp_text);

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let end = lines
                .get(i + 1)
                .map(|next| next.start.clone())
                .unwrap_or_else(|| total_duration.clone());
            Segment {
                index: i + 1,
                label: clip_label(&line.label),
                start: line.start.clone(),
                end,
            }
        })
        .collect()
}
