//! Path → entry table kept consistent with the project filesystem

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use mirror_content::FileDiff;
use mirror_fs::{NormalizedPath, find_protected};

use super::{FileEntry, WatcherEvent};
use crate::backend::VirtualFs;
use crate::{Error, Result};

/// In-memory mirror of the project tree.
///
/// Keys are absolute normalized paths. Watcher events update the table
/// directly; explicit mutators (`save`, `create_file`, `create_folder`,
/// `delete`, `rename`) validate first, write through the [`VirtualFs`],
/// and only then update memory, so the table never claims a write that
/// did not happen.
///
/// The modified set maps a path to the content it had before its first
/// save since the last [`reset_modifications`](Self::reset_modifications).
pub struct VirtualFileTable {
    root: NormalizedPath,
    fs: Arc<dyn VirtualFs>,
    entries: BTreeMap<String, FileEntry>,
    originals: HashMap<String, String>,
    file_count: usize,
}

impl std::fmt::Debug for VirtualFileTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualFileTable")
            .field("root", &self.root)
            .field("entries", &self.entries.len())
            .field("modified", &self.originals.len())
            .field("file_count", &self.file_count)
            .finish()
    }
}

/// A validated path: absolute key plus its root-relative form.
struct Resolved {
    key: String,
    relative: String,
}

impl VirtualFileTable {
    pub fn new(root: impl Into<NormalizedPath>, fs: Arc<dyn VirtualFs>) -> Self {
        Self {
            root: root.into(),
            fs,
            entries: BTreeMap::new(),
            originals: HashMap::new(),
            file_count: 0,
        }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.entries.get(NormalizedPath::new(path).as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn entries(&self) -> &BTreeMap<String, FileEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Files added by the watcher or created through the table, minus
    /// removals.
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Non-binary files under the root, as `(relative path, content)`.
    pub fn text_files(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.entries.iter().filter_map(|(key, entry)| {
            let content = entry.text_content()?;
            let relative = NormalizedPath::new(key).relative_to(&self.root)?;
            Some((relative, content))
        })
    }

    // ---- watcher events ----

    /// Apply a batch of watcher events in order. Returns how many changed
    /// the table.
    pub fn apply_events(&mut self, events: impl IntoIterator<Item = WatcherEvent>) -> usize {
        events
            .into_iter()
            .filter(|event| self.apply_event(event))
            .count()
    }

    /// Apply one watcher event. Returns false for ignored events.
    pub fn apply_event(&mut self, event: &WatcherEvent) -> bool {
        let key = NormalizedPath::new(event.path()).as_str().to_string();
        match event {
            WatcherEvent::AddDir { .. } => {
                self.entries.insert(key, FileEntry::Folder);
            }
            WatcherEvent::RemoveDir { .. } => {
                let removed = self.remove_subtree(&key);
                tracing::debug!(path = %key, removed, "removed directory");
            }
            WatcherEvent::AddFile { buffer, .. } => {
                let entry = FileEntry::from_buffer(buffer.as_deref().unwrap_or_default());
                if !self.entries.get(&key).is_some_and(FileEntry::is_file) {
                    self.file_count += 1;
                }
                self.entries.insert(key, entry);
            }
            WatcherEvent::Change { buffer, .. } => {
                let entry = FileEntry::from_buffer(buffer.as_deref().unwrap_or_default());
                self.entries.insert(key, entry);
            }
            WatcherEvent::RemoveFile { .. } => {
                if self.entries.remove(&key).is_some_and(|e| e.is_file()) {
                    self.file_count = self.file_count.saturating_sub(1);
                }
                self.originals.remove(&key);
            }
            WatcherEvent::UpdateDirectory { .. } => {
                tracing::trace!(path = %key, "ignoring update_directory event");
                return false;
            }
        }
        true
    }

    /// Remove `key` and every descendant. Returns the number of entries
    /// removed.
    fn remove_subtree(&mut self, key: &str) -> usize {
        let prefix = format!("{}/", key.trim_end_matches('/'));
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|k| k.as_str() == key || k.starts_with(&prefix))
            .cloned()
            .collect();

        for path in &doomed {
            if self.entries.remove(path).is_some_and(|e| e.is_file()) {
                self.file_count = self.file_count.saturating_sub(1);
            }
            self.originals.remove(path);
        }
        doomed.len()
    }

    // ---- validated mutators ----

    fn resolve(&self, path: &str) -> Result<Resolved> {
        let normalized = if NormalizedPath::new(path).is_absolute() {
            NormalizedPath::new(path)
        } else {
            self.root.join(path)
        };
        let relative = normalized
            .relative_to(&self.root)
            .ok_or_else(|| Error::InvalidPath {
                path: path.to_string(),
            })?;
        Ok(Resolved {
            key: normalized.as_str().to_string(),
            relative,
        })
    }

    fn check_protected(resolved: &Resolved) -> Result<()> {
        match find_protected(&resolved.relative) {
            Some(subtree) => {
                tracing::warn!(path = %resolved.key, %subtree, "operation blocked");
                Err(Error::OperationBlocked {
                    path: resolved.key.clone(),
                    subtree,
                })
            }
            None => Ok(()),
        }
    }

    fn io_error(resolved: &Resolved) -> impl FnOnce(std::io::Error) -> Error + '_ {
        move |source| Error::io(resolved.key.clone(), source)
    }

    /// Insert folder entries for every missing ancestor below the root.
    fn insert_ancestors(&mut self, key: &str) {
        let mut current = NormalizedPath::new(key).parent();
        while let Some(dir) = current {
            if !dir.is_descendant_of(&self.root) {
                break;
            }
            self.entries
                .entry(dir.as_str().to_string())
                .or_insert(FileEntry::Folder);
            current = dir.parent();
        }
    }

    /// Save new content for a file.
    ///
    /// The backing write happens first. On the first save since the last
    /// reset the previous content is recorded as the original; a save that
    /// brings the content back to the original drops the path from the
    /// modified set. Saving a path with no entry creates it.
    pub async fn save(&mut self, path: &str, content: &str) -> Result<()> {
        let resolved = self.resolve(path)?;
        let previous = match self.entries.get(&resolved.key) {
            Some(FileEntry::Folder) => {
                return Err(Error::NotAFile { path: resolved.key });
            }
            Some(entry) => Some(entry.text_content().unwrap_or_default().to_string()),
            None => None,
        };

        self.fs
            .write_file(&resolved.relative, content.as_bytes())
            .await
            .map_err(Self::io_error(&resolved))?;

        if previous.is_none() {
            self.file_count += 1;
            self.insert_ancestors(&resolved.key);
        }
        let original = self
            .originals
            .entry(resolved.key.clone())
            .or_insert_with(|| previous.unwrap_or_default());
        if original.as_str() == content {
            self.originals.remove(&resolved.key);
        }
        tracing::debug!(path = %resolved.key, bytes = content.len(), "saved");
        self.entries
            .insert(resolved.key, FileEntry::text(content));
        Ok(())
    }

    /// Create a new file. Fails with `AlreadyExists` if anything is at
    /// `path`.
    pub async fn create_file(&mut self, path: &str, content: &str) -> Result<()> {
        let resolved = self.resolve(path)?;
        Self::check_protected(&resolved)?;
        if self.entries.contains_key(&resolved.key) {
            return Err(Error::AlreadyExists { path: resolved.key });
        }

        self.fs
            .write_file(&resolved.relative, content.as_bytes())
            .await
            .map_err(Self::io_error(&resolved))?;

        self.insert_ancestors(&resolved.key);
        self.file_count += 1;
        tracing::debug!(path = %resolved.key, "created file");
        self.entries.insert(resolved.key, FileEntry::text(content));
        Ok(())
    }

    /// Create a folder and any missing parents.
    pub async fn create_folder(&mut self, path: &str) -> Result<()> {
        let resolved = self.resolve(path)?;
        Self::check_protected(&resolved)?;
        if self.entries.contains_key(&resolved.key) {
            return Err(Error::AlreadyExists { path: resolved.key });
        }

        self.fs
            .mkdir(&resolved.relative, true)
            .await
            .map_err(Self::io_error(&resolved))?;

        self.insert_ancestors(&resolved.key);
        tracing::debug!(path = %resolved.key, "created folder");
        self.entries.insert(resolved.key, FileEntry::Folder);
        Ok(())
    }

    /// Delete a file, or a folder with everything below it.
    pub async fn delete(&mut self, path: &str) -> Result<()> {
        let resolved = self.resolve(path)?;
        Self::check_protected(&resolved)?;
        let is_folder = match self.entries.get(&resolved.key) {
            Some(entry) => entry.is_folder(),
            None => return Err(Error::NotFound { path: resolved.key }),
        };

        self.fs
            .rm(&resolved.relative, is_folder)
            .await
            .map_err(Self::io_error(&resolved))?;

        let removed = self.remove_subtree(&resolved.key);
        tracing::debug!(path = %resolved.key, removed, "deleted");
        Ok(())
    }

    /// Rename a file or folder. Entries below a renamed folder move with
    /// it, as do their modification originals.
    pub async fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        Self::check_protected(&source)?;
        Self::check_protected(&target)?;
        if !self.entries.contains_key(&source.key) {
            return Err(Error::NotFound { path: source.key });
        }
        if self.entries.contains_key(&target.key) {
            return Err(Error::AlreadyExists { path: target.key });
        }
        let source_prefix = format!("{}/", source.key);
        if target.key.starts_with(&source_prefix) {
            return Err(Error::InvalidPath { path: target.key });
        }

        self.fs
            .rename(&source.relative, &target.relative)
            .await
            .map_err(Self::io_error(&source))?;

        let moved: Vec<String> = self
            .entries
            .keys()
            .filter(|k| **k == source.key || k.starts_with(&source_prefix))
            .cloned()
            .collect();
        for old_key in moved {
            let new_key = format!("{}{}", target.key, &old_key[source.key.len()..]);
            if let Some(entry) = self.entries.remove(&old_key) {
                self.entries.insert(new_key.clone(), entry);
            }
            if let Some(original) = self.originals.remove(&old_key) {
                self.originals.insert(new_key, original);
            }
        }
        self.insert_ancestors(&target.key);
        tracing::debug!(from = %source.key, to = %target.key, "renamed");
        Ok(())
    }

    // ---- modification tracking ----

    /// Paths whose current content differs from their recorded original.
    ///
    /// Paths that reverted through watcher events are filtered out here
    /// even though they remain in the modified set.
    pub fn modified_files(&self) -> BTreeMap<String, FileEntry> {
        self.originals
            .iter()
            .filter_map(|(path, original)| {
                let entry = self.entries.get(path)?;
                match entry {
                    FileEntry::File { content, .. } if content != original => {
                        Some((path.clone(), entry.clone()))
                    }
                    _ => None,
                }
            })
            .collect()
    }

    /// Content recorded before the first save, if the path is tracked.
    pub fn original(&self, path: &str) -> Option<&str> {
        self.originals
            .get(NormalizedPath::new(path).as_str())
            .map(String::as_str)
    }

    /// Forget every recorded original without touching content.
    pub fn reset_modifications(&mut self) {
        tracing::debug!(cleared = self.originals.len(), "reset modifications");
        self.originals.clear();
    }

    /// Diff a file's current content against its recorded original.
    ///
    /// An unmodified file is diffed against itself.
    pub fn diff_file(&self, path: &str) -> Result<FileDiff> {
        let key = NormalizedPath::new(path).as_str().to_string();
        let content = match self.entries.get(&key) {
            None => return Err(Error::NotFound { path: key }),
            Some(FileEntry::Folder) => return Err(Error::NotAFile { path: key }),
            Some(FileEntry::File { is_binary: true, .. }) => {
                return Err(Error::BinaryUnsupported { path: key });
            }
            Some(FileEntry::File { content, .. }) => content,
        };
        let original = self.originals.get(&key).unwrap_or(content);
        let result = mirror_content::diff(original, content);
        if result.is_binary {
            return Err(Error::BinaryUnsupported { path: key });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryFs;

    fn table() -> VirtualFileTable {
        VirtualFileTable::new("/workspace", Arc::new(MemoryFs::new()))
    }

    #[test]
    fn resolve_accepts_relative_and_absolute() {
        let table = table();
        let abs = table.resolve("/workspace/src/a.rs").unwrap();
        let rel = table.resolve("src/a.rs").unwrap();
        assert_eq!(abs.key, rel.key);
        assert_eq!(abs.relative, "src/a.rs");
    }

    #[test]
    fn resolve_rejects_escapes_and_root() {
        let table = table();
        assert!(matches!(table.resolve("/etc/passwd"), Err(Error::InvalidPath { .. })));
        assert!(matches!(table.resolve("../outside"), Err(Error::InvalidPath { .. })));
        assert!(matches!(table.resolve("/workspace"), Err(Error::InvalidPath { .. })));
    }

    #[test]
    fn insert_ancestors_stops_at_root() {
        let mut table = table();
        table.insert_ancestors("/workspace/a/b/c.txt");
        let keys: Vec<_> = table.entries.keys().cloned().collect();
        assert_eq!(keys, vec!["/workspace/a", "/workspace/a/b"]);
    }
}
