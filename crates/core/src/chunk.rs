//! Chunk math for size-bounded batch writes.
//!
//! Membership fan-out touches every task and frame of a version, so the
//! propagation layer never issues a single write covering the whole id
//! list; it slices the list into chunks of [`MEMBERSHIP_CHUNK_LIMIT`]
//! ids and issues one write per chunk.

/// Maximum number of ids updated by a single membership write.
pub const MEMBERSHIP_CHUNK_LIMIT: usize = 100;

/// Number of writes needed to cover `len` ids at `limit` ids per write
/// (`ceil(len / limit)`; zero for an empty list).
pub fn chunk_count(len: usize, limit: usize) -> usize {
    len.div_ceil(limit)
}
