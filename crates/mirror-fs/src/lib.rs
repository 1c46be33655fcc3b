//! Filesystem primitives for tree-mirror
//!
//! Provides normalized path handling, the protected-subtree blocklist,
//! content checksums, and safe I/O for settings and state files.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;
pub mod protected;

pub use checksum::{compute_content_checksum, content_matches};
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::NormalizedPath;
pub use protected::{ProtectedPath, find_protected};
