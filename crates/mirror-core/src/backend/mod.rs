//! Filesystem backends consumed by the table and the sync engine
//!
//! Two seams exist: [`VirtualFs`] is the mutable project filesystem the
//! [`VirtualFileTable`](crate::VirtualFileTable) writes through, and
//! [`HostDirectory`] is the externally owned mirror target. Both come in a
//! local-disk flavor and an in-memory flavor.

mod host;
mod virtual_fs;

pub use host::{HostDirectory, LocalHostDirectory, MemoryHostDirectory, read_relative, write_relative};
pub use virtual_fs::{LocalFs, MemoryFs, VirtualFs};
