//! Live chunklist state for one track of a streaming session.
//!
//! The chunklist is a bounded, sequence-ordered ledger of [`Segment`]s fed by
//! the packaging side and read by playlist consumers. Reads are served from
//! two lazily rebuilt caches (the rendered playlist text and its gzipped
//! encoding), each invalidated by a dirty flag that every append sets.
//!
//! # Locking
//!
//! Three independent reader/writer locks guard the segment collection, the
//! text cache, and the gzip cache, so playlist readers never block on an
//! unrelated cache rebuild. The dirty flags are plain atomics: two readers
//! may both observe "dirty" and both rebuild, which is harmless because
//! rendering is a pure function of a consistent snapshot and the final cache
//! write is idempotent.

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ChunklistConfig;
use crate::error::{Error, Result};
use crate::render::{render_variants, PlaylistPair};
use crate::segment::Segment;

/// Segment window plus the counters that index into it. Kept under one lock
/// so the sequence pair is always read in a consistent view.
struct Ledger {
    segments: VecDeque<Arc<Segment>>,
    last_segment_sequence: i64,
    last_partial_sequence: i64,
    /// Count of evicted segments; translates sequence numbers to positions.
    deleted_segments: u64,
}

impl Ledger {
    fn new() -> Self {
        Self {
            segments: VecDeque::new(),
            last_segment_sequence: -1,
            last_partial_sequence: -1,
            deleted_segments: 0,
        }
    }

    /// Translate a sequence number to its position in the retained window.
    fn position(&self, sequence: i64) -> Option<usize> {
        let index = sequence - self.deleted_segments as i64;
        if index < 0 {
            // Already evicted.
            return None;
        }
        let index = index as usize;
        (index < self.segments.len()).then_some(index)
    }

    /// Evict the oldest segment once the window exceeds its bound. Every
    /// eviction advances `deleted_segments`, whichever append triggered it,
    /// so positional translation stays aligned with the window.
    fn evict_if_over(&mut self, max_segments: usize) {
        if self.segments.len() > max_segments {
            if let Some(evicted) = self.segments.pop_front() {
                self.deleted_segments += 1;
                tracing::debug!(sequence = evicted.sequence, "Evicted oldest segment");
            }
        }
    }
}

#[derive(Default)]
struct GzipPair {
    full: Bytes,
    skip: Bytes,
}

/// Rolling low-latency chunklist for a single track.
///
/// Append operations come from the packaging collaborator; text, gzip, and
/// point-lookup reads come from the serving collaborator. All operations are
/// synchronous and safe to call from any number of threads.
pub struct Chunklist {
    config: ChunklistConfig,

    ledger: RwLock<Ledger>,

    playlist_dirty: AtomicBool,
    playlist_cache: RwLock<PlaylistPair>,

    gzip_dirty: AtomicBool,
    gzip_cache: RwLock<GzipPair>,
}

impl Chunklist {
    /// Create an empty chunklist.
    pub fn new(config: ChunklistConfig) -> Self {
        Self {
            config,
            ledger: RwLock::new(Ledger::new()),
            playlist_dirty: AtomicBool::new(true),
            playlist_cache: RwLock::new(PlaylistPair::default()),
            gzip_dirty: AtomicBool::new(true),
            gzip_cache: RwLock::new(GzipPair::default()),
        }
    }

    /// The static configuration this chunklist renders with.
    pub fn config(&self) -> &ChunklistConfig {
        &self.config
    }

    /// Append a finalized full segment.
    ///
    /// The sequence must be exactly the next one, unless the segment was
    /// already created by a part append, in which case its metadata is
    /// updated in place. Either way the segment ends up completed. Rejected
    /// appends leave the chunklist untouched.
    pub fn append_segment(&self, info: Segment) -> Result<()> {
        let sequence = info.sequence;
        let mut ledger = self.ledger.write();

        if info.sequence < ledger.last_segment_sequence {
            tracing::debug!(
                sequence = info.sequence,
                last = ledger.last_segment_sequence,
                "Rejected stale segment append"
            );
            return Err(Error::StaleSequence {
                sequence: info.sequence,
                last: ledger.last_segment_sequence,
            });
        }

        match ledger.position(info.sequence) {
            Some(index) => {
                // Created earlier by a part append; fill in the metadata.
                let segment = Arc::make_mut(&mut ledger.segments[index]);
                segment.update_info(
                    info.start_time_ms,
                    info.duration_secs,
                    info.size,
                    info.url,
                    info.is_independent,
                );
                segment.completed = true;
            }
            None => {
                let expected = ledger.last_segment_sequence + 1;
                if info.sequence != expected {
                    tracing::debug!(
                        sequence = info.sequence,
                        expected,
                        "Rejected non-contiguous segment append"
                    );
                    return Err(Error::NonContiguousSequence {
                        sequence: info.sequence,
                        expected,
                    });
                }

                let mut segment = info;
                segment.completed = true;
                ledger.segments.push_back(Arc::new(segment));
                ledger.last_segment_sequence = expected;
                ledger.evict_if_over(self.config.max_segments);
            }
        }

        tracing::debug!(sequence, "Appended completed segment");
        drop(ledger);

        self.mark_dirty();
        Ok(())
    }

    /// Append a part to the segment at `segment_sequence`, creating that
    /// segment (incomplete) if it does not exist yet.
    ///
    /// Unlike full-segment appends, this path tolerates forward jumps in the
    /// segment numbering. The part's own sequence becomes the chunklist's
    /// last partial sequence number.
    pub fn append_part(&self, segment_sequence: i64, part: Segment) -> Result<()> {
        if part.url.is_empty() {
            return Err(Error::EmptyPartUrl { segment_sequence });
        }

        let mut ledger = self.ledger.write();

        if segment_sequence < ledger.last_segment_sequence {
            tracing::debug!(
                sequence = segment_sequence,
                last = ledger.last_segment_sequence,
                "Rejected stale part append"
            );
            return Err(Error::StaleSequence {
                sequence: segment_sequence,
                last: ledger.last_segment_sequence,
            });
        }

        let index = match ledger.position(segment_sequence) {
            Some(index) => index,
            None => {
                ledger
                    .segments
                    .push_back(Arc::new(Segment::placeholder(segment_sequence)));
                ledger.last_segment_sequence = segment_sequence;
                ledger.evict_if_over(self.config.max_segments);
                ledger.segments.len() - 1
            }
        };

        let part_sequence = part.sequence;
        let segment = Arc::make_mut(&mut ledger.segments[index]);
        segment.parts.push(Arc::new(part));
        ledger.last_partial_sequence = part_sequence;

        tracing::trace!(
            segment_sequence,
            part_sequence,
            "Appended partial segment"
        );
        drop(ledger);

        self.mark_dirty();
        Ok(())
    }

    /// Look up a segment by sequence number.
    ///
    /// Returns `None` for anything outside the retained window, including
    /// sequences already evicted. The returned handle is a stable snapshot:
    /// later appends will not mutate it.
    pub fn segment(&self, sequence: i64) -> Option<Arc<Segment>> {
        let ledger = self.ledger.read();
        let index = ledger.position(sequence)?;
        Some(Arc::clone(&ledger.segments[index]))
    }

    /// The `(media sequence, partial sequence)` watermark pair, read in one
    /// consistent view. Both are `-1` until the first matching append.
    pub fn last_sequence_numbers(&self) -> (i64, i64) {
        let ledger = self.ledger.read();
        (ledger.last_segment_sequence, ledger.last_partial_sequence)
    }

    /// Number of segments currently retained.
    pub fn segment_count(&self) -> usize {
        self.ledger.read().segments.len()
    }

    /// Whether no segments are retained.
    pub fn is_empty(&self) -> bool {
        self.ledger.read().segments.is_empty()
    }

    /// Rendered playlist text for the requested variant, rebuilt first if an
    /// append has invalidated the cache.
    pub fn playlist_text(&self, skip: bool) -> String {
        if self.playlist_dirty.load(Ordering::Acquire) {
            self.regenerate_text();
        }

        let cache = self.playlist_cache.read();
        if skip {
            cache.skip.clone()
        } else {
            cache.full.clone()
        }
    }

    /// Gzipped playlist for the requested variant. May rebuild the text
    /// cache as a side effect when both caches are stale.
    pub fn gzipped_playlist(&self, skip: bool) -> Bytes {
        if self.gzip_dirty.load(Ordering::Acquire) {
            // Clear first so an append racing this rebuild re-flags it.
            self.gzip_dirty.store(false, Ordering::Release);

            let full = self.playlist_text(false);
            let skipped = self.playlist_text(true);
            let pair = GzipPair {
                full: gzip(full.as_bytes()),
                skip: gzip(skipped.as_bytes()),
            };
            *self.gzip_cache.write() = pair;
        }

        let cache = self.gzip_cache.read();
        if skip {
            cache.skip.clone()
        } else {
            cache.full.clone()
        }
    }

    fn regenerate_text(&self) {
        // Clear first so an append racing this rebuild re-flags it.
        self.playlist_dirty.store(false, Ordering::Release);

        let snapshot: Vec<Arc<Segment>> = {
            let ledger = self.ledger.read();
            ledger.segments.iter().cloned().collect()
        };

        let pair = render_variants(&self.config, &snapshot);
        tracing::trace!(segments = snapshot.len(), "Rebuilt playlist variants");
        *self.playlist_cache.write() = pair;
    }

    fn mark_dirty(&self) {
        self.playlist_dirty.store(true, Ordering::Release);
        self.gzip_dirty.store(true, Ordering::Release);
    }
}

/// Gzip a rendered playlist.
fn gzip(input: &[u8]) -> Bytes {
    let mut encoder = GzEncoder::new(
        Vec::with_capacity(input.len() / 2 + 16),
        Compression::default(),
    );
    // Writing into a Vec cannot fail.
    encoder.write_all(input).expect("gzip write to Vec");
    Bytes::from(encoder.finish().expect("gzip finish to Vec"))
}
