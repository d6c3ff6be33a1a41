//! Frame chunking: partition a [`FrameSet`] into consecutive, disjoint chunks, one per render
//! task.
//!
//! Whatever the sizing policy, chunks are emitted in increasing frame order, never overlap, and
//! together cover exactly the input set. The sequence is lazy and [`Clone`], so it can be
//! restarted, and it only depends on its input.

use std::fmt;

use smallvec::SmallVec;

use crate::foundation::error::{CompileError, CompileResult};
use crate::frames::range::{FrameSet, FrameSpan, join_spans};

/// One chunk of frames. A chunk may cover several input spans (`"0-12,34-40"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Chunk {
    spans: SmallVec<[FrameSpan; 2]>,
    len: u64,
}

impl Chunk {
    /// Spans of this chunk, increasing.
    pub fn spans(&self) -> &[FrameSpan] {
        &self.spans
    }

    /// Number of frames in this chunk.
    pub fn len_frames(&self) -> u64 {
        self.len
    }

    /// First frame of the chunk.
    pub fn first(&self) -> i64 {
        self.spans[0].start
    }

    /// Last frame of the chunk.
    pub fn last(&self) -> i64 {
        self.spans[self.spans.len() - 1].end
    }

    /// Frame argument for Blender's `--render-frame` (`"1..10,20"`).
    pub fn blender_arg(&self) -> String {
        join_spans(&self.spans, "..")
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_spans(&self.spans, "-"))
    }
}

/// Partition contract shared by every chunking policy.
pub trait FrameChunker {
    /// Lazily chunk an already parsed frame set.
    fn chunks(&self, frames: FrameSet) -> CompileResult<Chunks>;

    /// Parse `spec` and chunk it. Fails with `InvalidRange` on a bad specification.
    fn chunk(&self, spec: &str) -> CompileResult<Chunks> {
        self.chunks(FrameSet::parse(spec)?)
    }
}

/// Chunks of exactly `size` frames; the last one may be shorter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedSizeChunker {
    /// Frames per chunk, must be > 0.
    pub size: u64,
}

impl FrameChunker for FixedSizeChunker {
    fn chunks(&self, frames: FrameSet) -> CompileResult<Chunks> {
        if self.size == 0 {
            return Err(CompileError::invalid_range("chunk size must be > 0"));
        }
        Ok(Chunks::new(frames, Sizing::Fixed(self.size)))
    }
}

/// At most `count` chunks of near-equal size, larger chunks first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedCountChunker {
    /// Number of chunks to aim for, must be > 0.
    pub count: u64,
}

impl FrameChunker for FixedCountChunker {
    fn chunks(&self, frames: FrameSet) -> CompileResult<Chunks> {
        if self.count == 0 {
            return Err(CompileError::invalid_range("chunk count must be > 0"));
        }
        let total = frames.len_frames();
        let n = self.count.min(total);
        let (Some(base), Some(extra)) = (total.checked_div(n), total.checked_rem(n)) else {
            return Err(CompileError::invalid_range("cannot chunk an empty frame set"));
        };
        let sizing = Sizing::Even {
            base,
            extra,
            count: n,
        };
        Ok(Chunks::new(frames, sizing))
    }
}

/// Configurable chunking policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ChunkPolicy {
    /// See [`FixedSizeChunker`].
    FixedSize {
        /// Frames per chunk.
        size: u64,
    },
    /// See [`FixedCountChunker`].
    FixedCount {
        /// Number of chunks.
        count: u64,
    },
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self::FixedSize { size: 10 }
    }
}

impl FrameChunker for ChunkPolicy {
    fn chunks(&self, frames: FrameSet) -> CompileResult<Chunks> {
        match *self {
            Self::FixedSize { size } => FixedSizeChunker { size }.chunks(frames),
            Self::FixedCount { count } => FixedCountChunker { count }.chunks(frames),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Sizing {
    Fixed(u64),
    /// `count` chunks; the first `extra` get `base + 1` frames.
    Even { base: u64, extra: u64, count: u64 },
}

impl Sizing {
    fn size_of(self, index: u64) -> u64 {
        match self {
            Self::Fixed(size) => size,
            Self::Even { base, extra, .. } => base + u64::from(index < extra),
        }
    }
}

/// Lazy chunk sequence produced by a [`FrameChunker`].
#[derive(Clone, Debug)]
pub struct Chunks {
    frames: FrameSet,
    sizing: Sizing,
    emitted: u64,
    span_idx: usize,
    next_frame: i64,
    remaining: u64,
}

impl Chunks {
    fn new(frames: FrameSet, sizing: Sizing) -> Self {
        let next_frame = frames.first();
        let remaining = frames.len_frames();
        Self {
            frames,
            sizing,
            emitted: 0,
            span_idx: 0,
            next_frame,
            remaining,
        }
    }

    /// The frame set being chunked.
    pub fn frames(&self) -> &FrameSet {
        &self.frames
    }

    /// Number of chunks still to be emitted.
    pub fn remaining_chunks(&self) -> u64 {
        if self.remaining == 0 {
            return 0;
        }
        match self.sizing {
            Sizing::Fixed(size) => self.remaining.div_ceil(size),
            Sizing::Even { count, .. } => count - self.emitted,
        }
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.remaining == 0 {
            return None;
        }
        let len = self.sizing.size_of(self.emitted).min(self.remaining);
        let mut want = len;
        let mut spans = SmallVec::<[FrameSpan; 2]>::new();

        // Spans of a FrameSet are counted at construction, so none of these steps overflow.
        while want > 0 {
            let span = *self.frames.spans().get(self.span_idx)?;
            let avail = span.end.abs_diff(self.next_frame).checked_add(1)?;
            let take = avail.min(want);
            let end = self.next_frame.checked_add_unsigned(take - 1)?;
            spans.push(FrameSpan {
                start: self.next_frame,
                end,
            });
            want -= take;
            self.remaining -= take;

            if take == avail {
                self.span_idx += 1;
                if let Some(next) = self.frames.spans().get(self.span_idx) {
                    self.next_frame = next.start;
                }
            } else {
                self.next_frame = end.checked_add(1)?;
            }
        }

        self.emitted += 1;
        Some(Chunk { spans, len })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining_chunks()) {
            Ok(left) => (left, Some(left)),
            Err(_) => (usize::MAX, None),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frames/chunker.rs"]
mod tests;
