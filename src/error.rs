//! Error types for llhls.

use thiserror::Error;

/// Result type for llhls operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for llhls operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Append carried a sequence older than the current watermark.
    #[error("Stale sequence {sequence}: chunklist is already at {last}")]
    StaleSequence { sequence: i64, last: i64 },

    /// Full-segment append left a hole in the sequence numbering.
    #[error("Non-contiguous sequence {sequence}: expected {expected}")]
    NonContiguousSequence { sequence: i64, expected: i64 },

    /// Part append carried a part with no url.
    #[error("Part for segment {segment_sequence} has an empty url")]
    EmptyPartUrl { segment_sequence: i64 },
}
