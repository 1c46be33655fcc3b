//! Content classification and diffing for tree-mirror
//!
//! Both halves are pure functions over their inputs:
//!
//! - [`classify`] decides whether a raw buffer is text or binary and decodes it
//! - [`diff`] produces a unified sequence of line blocks with character-level
//!   refinement for modified lines

pub mod classify;
pub mod diff;

pub use classify::{BINARY_SNIFF_LEN, Classification, classify, looks_binary, normalize_lines};
pub use diff::{
    ChangeKind, CharChange, DiffBlock, DiffStats, FileDiff, LOOK_AHEAD, MAX_DIFF_BYTES, diff,
    diff_bytes,
};
