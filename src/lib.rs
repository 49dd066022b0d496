//! llhls - Low-latency HLS chunklist state and media playlist rendering
//!
//! This crate keeps the rolling segment history for one track of a live
//! low-latency HLS session and renders it, on demand, into the live media
//! playlist and its gzipped encoding. It sits between the packager (which
//! appends segments and parts) and the HTTP layer (which reads playlists and
//! looks up segments); it performs no I/O of its own.
//!
//! # Modules
//!
//! - `chunklist` - The guarded segment ledger with lazy playlist caches
//! - `segment` - The segment/part record
//! - `render` - Pure playlist rendering over a ledger snapshot
//! - `config` - Static per-track configuration
//! - `error` - Crate error type
//!
//! # Architecture
//!
//! Producers append into a bounded, sequence-ordered window; the oldest
//! segment is evicted once the window exceeds its bound. Every append marks
//! two caches dirty: the rendered playlist text (both the full and the
//! skip-capable variant) and the gzipped copies of each. Readers rebuild a
//! stale cache lazily from a value snapshot of the window, so a playlist is
//! always internally consistent even while producers keep appending.

pub mod chunklist;
pub mod config;
pub mod error;
pub mod render;
pub mod segment;

pub use chunklist::Chunklist;
pub use config::{ChunklistConfig, MediaType};
pub use error::{Error, Result};
pub use render::{render_variants, PlaylistPair};
pub use segment::Segment;
