use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{CompileError, CompileResult};

/// Inclusive frame span `[start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameSpan {
    /// First frame (inclusive).
    pub start: i64,
    /// Last frame (inclusive).
    pub end: i64,
}

impl FrameSpan {
    /// Create a validated span with `start <= end`.
    pub fn new(start: i64, end: i64) -> CompileResult<Self> {
        if start > end {
            return Err(CompileError::invalid_range(format!(
                "span start {start} must be <= end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Span covering exactly one frame.
    pub fn single(frame: i64) -> Self {
        Self {
            start: frame,
            end: frame,
        }
    }

    /// Number of frames in the span.
    ///
    /// `None` when `start > end`, or when the span covers every `i64` and the count does not fit
    /// in a `u64`.
    pub fn len_frames(self) -> Option<u64> {
        if self.start > self.end {
            return None;
        }
        self.end.abs_diff(self.start).checked_add(1)
    }

    /// Return `true` when `frame` lies inside the span.
    pub fn contains(self, frame: i64) -> bool {
        self.start <= frame && frame <= self.end
    }

    /// Render with a custom separator between bounds (`"-"` for chunk names, `".."` for Blender).
    pub fn display_with(self, sep: &str) -> String {
        if self.start == self.end {
            self.start.to_string()
        } else {
            format!("{}{sep}{}", self.start, self.end)
        }
    }
}

impl fmt::Display for FrameSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_with("-"))
    }
}

/// Ordered, disjoint set of frame spans parsed from a range specification such as
/// `"1-10,20,30-40"`.
///
/// Spans are strictly increasing and never adjacent: `"1-5,6-10"` is stored as `1-10`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameSet {
    spans: Vec<FrameSpan>,
    total: u64,
}

impl FrameSet {
    /// Parse a range specification.
    ///
    /// Items are separated by `,` and are either `N` or `A-B`. Bounds may be negative
    /// (`-5--1`). Items must increase and must not overlap.
    pub fn parse(spec: &str) -> CompileResult<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(CompileError::invalid_range("frame range must not be empty"));
        }

        let mut spans = Vec::<FrameSpan>::new();
        for item in spec.split(',') {
            let span = parse_item(item.trim())
                .map_err(|e| CompileError::invalid_range(format!("{spec:?}: {e}")))?;
            push_span(&mut spans, span)
                .map_err(|e| CompileError::invalid_range(format!("{spec:?}: {e}")))?;
        }
        let total = count_frames(&spans)
            .map_err(|e| CompileError::invalid_range(format!("{spec:?}: {e}")))?;
        Ok(Self { spans, total })
    }

    /// Build a set from already-ordered spans, merging adjacent ones.
    pub fn from_spans(input: impl IntoIterator<Item = FrameSpan>) -> CompileResult<Self> {
        let mut spans = Vec::new();
        for span in input {
            FrameSpan::new(span.start, span.end)?;
            push_span(&mut spans, span).map_err(CompileError::invalid_range)?;
        }
        if spans.is_empty() {
            return Err(CompileError::invalid_range("frame range must not be empty"));
        }
        let total = count_frames(&spans).map_err(CompileError::invalid_range)?;
        Ok(Self { spans, total })
    }

    /// Disjoint spans in increasing order.
    pub fn spans(&self) -> &[FrameSpan] {
        &self.spans
    }

    /// Total number of frames; at least 1.
    pub fn len_frames(&self) -> u64 {
        self.total
    }

    /// First frame of the set.
    pub fn first(&self) -> i64 {
        self.spans[0].start
    }

    /// Last frame of the set.
    pub fn last(&self) -> i64 {
        self.spans[self.spans.len() - 1].end
    }

    /// Return `true` when `frame` is part of the set.
    pub fn contains(&self, frame: i64) -> bool {
        self.spans.iter().any(|s| s.contains(frame))
    }

    /// Every frame of the set, in increasing order.
    pub fn frames(&self) -> impl Iterator<Item = i64> + '_ {
        self.spans.iter().flat_map(|s| s.start..=s.end)
    }

    /// Render spans joined by `,` using `sep` between span bounds.
    pub fn display_with(&self, sep: &str) -> String {
        join_spans(&self.spans, sep)
    }
}

impl fmt::Display for FrameSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_with("-"))
    }
}

impl FromStr for FrameSet {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

pub(crate) fn join_spans(spans: &[FrameSpan], sep: &str) -> String {
    spans
        .iter()
        .map(|s| s.display_with(sep))
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_item(item: &str) -> Result<FrameSpan, String> {
    if item.is_empty() {
        return Err("empty range item".to_string());
    }

    // Skip index 0 so a leading minus sign is read as part of the first bound.
    let split = item
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '-')
        .map(|(i, _)| i);

    let (start, end) = match split {
        Some(i) => (parse_frame(&item[..i])?, parse_frame(&item[i + 1..])?),
        None => {
            let f = parse_frame(item)?;
            (f, f)
        }
    };
    if start > end {
        return Err(format!("item {item:?} has start after end"));
    }
    Ok(FrameSpan { start, end })
}

fn parse_frame(s: &str) -> Result<i64, String> {
    let s = s.trim();
    s.parse::<i64>()
        .map_err(|_| format!("{s:?} is not a frame number"))
}

/// Frames across all spans, rejecting sets too large to count in a `u64`.
fn count_frames(spans: &[FrameSpan]) -> Result<u64, String> {
    spans.iter().try_fold(0u64, |acc, span| {
        span.len_frames()
            .and_then(|n| acc.checked_add(n))
            .ok_or_else(|| "frame range has more frames than can be counted".to_string())
    })
}

fn push_span(spans: &mut Vec<FrameSpan>, span: FrameSpan) -> Result<(), String> {
    let Some(prev) = spans.last_mut() else {
        spans.push(span);
        return Ok(());
    };
    if span.start <= prev.end {
        return Err(format!(
            "item {span} does not start after previous item {prev} (ranges must be increasing)"
        ));
    }
    if prev.end.checked_add(1) == Some(span.start) {
        prev.end = span.end;
    } else {
        spans.push(span);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/frames/range.rs"]
mod tests;
