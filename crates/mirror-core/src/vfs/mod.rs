//! In-memory mirror of the project tree

mod entry;
mod events;
mod pump;
mod table;

pub use entry::FileEntry;
pub use events::WatcherEvent;
pub use pump::spawn_event_pump;
pub use table::VirtualFileTable;
