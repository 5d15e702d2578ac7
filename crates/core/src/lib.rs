//! Pure domain logic for the Annolab dataset split & versioning engine.
//!
//! Everything in this crate is I/O-free and deterministic:
//!
//! - [`split`] — the greedy training/validation/testing allocator.
//! - [`bucket`] — the [`BucketType`](bucket::BucketType) enum and the
//!   per-bucket result types.
//! - [`version`] — `major.minor.patch` version numbering with rollover.
//! - [`stats`] — label/attribute stat folding for recomputation.
//! - [`chunk`] — batched-write chunk math shared with the propagation
//!   layer.

pub mod bucket;
pub mod chunk;
pub mod error;
pub mod split;
pub mod stats;
pub mod types;
pub mod version;

pub use bucket::{BucketTasks, BucketType, SplitCount};
pub use error::CoreError;
pub use split::{allocate, SplitOutcome, SplitPercentages, TaskWeight};
pub use version::{CreationMode, VersionNumber, VersionType};
