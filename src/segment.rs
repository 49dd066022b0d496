//! Segment and partial-segment records.
//!
//! A low-latency playlist deals in two kinds of spans: full segments and the
//! sub-segment "parts" published while a segment is still being produced.
//! Both are the same shape, a timed and addressable span of media, so one
//! record covers both, with parts nesting inside their parent segment.

use std::sync::Arc;

/// A span of media referenced by the playlist: a full segment or a part.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Sequence number. For a full segment this is its position in the
    /// chunklist numbering; for a part it is the part's own counter, which
    /// becomes the playlist's last partial sequence number.
    pub sequence: i64,
    /// Start time in milliseconds since the Unix epoch.
    pub start_time_ms: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Size in bytes (informational).
    pub size: u64,
    /// Address of this span's media data.
    pub url: String,
    /// Predicted address of the next part. Only meaningful on the most
    /// recent part, where it feeds the preload hint.
    pub next_url: String,
    /// Whether the span starts on a frame decodable without prior context.
    pub is_independent: bool,
    /// True once the full segment has been finalized. Parts never set this.
    pub completed: bool,
    /// Parts of this segment, in publish (= playback) order.
    pub parts: Vec<Arc<Segment>>,
}

impl Segment {
    /// Create a fully-described span.
    pub fn new(
        sequence: i64,
        start_time_ms: u64,
        duration_secs: f64,
        size: u64,
        url: impl Into<String>,
        next_url: impl Into<String>,
        is_independent: bool,
    ) -> Self {
        Self {
            sequence,
            start_time_ms,
            duration_secs,
            size,
            url: url.into(),
            next_url: next_url.into(),
            is_independent,
            completed: false,
            parts: Vec::new(),
        }
    }

    /// Create the empty placeholder a part append leaves behind until the
    /// full-segment metadata arrives.
    pub(crate) fn placeholder(sequence: i64) -> Self {
        Self {
            sequence,
            start_time_ms: 0,
            duration_secs: 0.0,
            size: 0,
            url: String::new(),
            next_url: String::new(),
            is_independent: false,
            completed: false,
            parts: Vec::new(),
        }
    }

    /// Effective start time: inherited from the first part when parts exist.
    pub fn effective_start_time_ms(&self) -> u64 {
        self.parts
            .first()
            .map_or(self.start_time_ms, |part| part.start_time_ms)
    }

    /// Overwrite the mutable metadata with a later full-segment append.
    /// Parts and sequence are untouched.
    pub(crate) fn update_info(
        &mut self,
        start_time_ms: u64,
        duration_secs: f64,
        size: u64,
        url: String,
        is_independent: bool,
    ) {
        self.start_time_ms = start_time_ms;
        self.duration_secs = duration_secs;
        self.size = size;
        self.url = url;
        self.is_independent = is_independent;
    }
}
