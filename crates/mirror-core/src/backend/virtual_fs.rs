//! Project filesystem primitives

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Write primitives against the project filesystem.
///
/// Every path is relative to the project root. Callers resolve and
/// validate paths before issuing any call.
#[async_trait]
pub trait VirtualFs: Send + Sync {
    /// Create or overwrite a file, creating missing parent directories.
    async fn write_file(&self, relative: &str, content: &[u8]) -> io::Result<()>;

    async fn mkdir(&self, relative: &str, recursive: bool) -> io::Result<()>;

    /// Remove a file, or a directory when `recursive` is set.
    async fn rm(&self, relative: &str, recursive: bool) -> io::Result<()>;

    async fn rename(&self, from: &str, to: &str) -> io::Result<()>;
}

/// [`VirtualFs`] over a directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

#[async_trait]
impl VirtualFs for LocalFs {
    async fn write_file(&self, relative: &str, content: &[u8]) -> io::Result<()> {
        let path = self.resolve(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await
    }

    async fn mkdir(&self, relative: &str, recursive: bool) -> io::Result<()> {
        let path = self.resolve(relative);
        if recursive {
            tokio::fs::create_dir_all(&path).await
        } else {
            tokio::fs::create_dir(&path).await
        }
    }

    async fn rm(&self, relative: &str, recursive: bool) -> io::Result<()> {
        let path = self.resolve(relative);
        let metadata = tokio::fs::metadata(&path).await?;
        if metadata.is_dir() {
            if recursive {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_dir(&path).await
            }
        } else {
            tokio::fs::remove_file(&path).await
        }
    }

    async fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        let target = self.resolve(to);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(self.resolve(from), target).await
    }
}

#[derive(Debug, Default)]
struct MemoryFsState {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    operations: usize,
    fail: bool,
}

impl MemoryFsState {
    fn begin(&mut self) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::other("injected filesystem failure"));
        }
        self.operations += 1;
        Ok(())
    }

    fn add_parents(&mut self, relative: &str) {
        let mut current = relative;
        while let Some((parent, _)) = current.rsplit_once('/') {
            self.dirs.insert(parent.to_string());
            current = parent;
        }
    }
}

/// In-memory [`VirtualFs`] for headless use and tests.
///
/// Clones share state, so a test can keep one handle for inspection
/// while the table owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    state: Arc<Mutex<MemoryFsState>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryFsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raw bytes stored at `relative`.
    pub fn file(&self, relative: &str) -> Option<Vec<u8>> {
        self.state().files.get(relative).cloned()
    }

    pub fn has_dir(&self, relative: &str) -> bool {
        self.state().dirs.contains(relative)
    }

    /// Number of successful mutating calls so far.
    pub fn operation_count(&self) -> usize {
        self.state().operations
    }

    /// Make every subsequent call fail with an I/O error.
    pub fn set_failing(&self, fail: bool) {
        self.state().fail = fail;
    }
}

fn is_under(path: &str, dir: &str) -> bool {
    path.strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[async_trait]
impl VirtualFs for MemoryFs {
    async fn write_file(&self, relative: &str, content: &[u8]) -> io::Result<()> {
        let mut state = self.state();
        if state.dirs.contains(relative) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{relative} is a directory"),
            ));
        }
        state.begin()?;
        state.add_parents(relative);
        state.files.insert(relative.to_string(), content.to_vec());
        Ok(())
    }

    async fn mkdir(&self, relative: &str, recursive: bool) -> io::Result<()> {
        let mut state = self.state();
        if !recursive
            && let Some((parent, _)) = relative.rsplit_once('/')
            && !state.dirs.contains(parent)
        {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent of {relative} does not exist"),
            ));
        }
        state.begin()?;
        state.add_parents(relative);
        state.dirs.insert(relative.to_string());
        Ok(())
    }

    async fn rm(&self, relative: &str, recursive: bool) -> io::Result<()> {
        let mut state = self.state();
        if state.files.contains_key(relative) {
            state.begin()?;
            state.files.remove(relative);
            return Ok(());
        }
        if !state.dirs.contains(relative) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{relative} does not exist"),
            ));
        }
        let has_children = state.files.keys().any(|p| is_under(p, relative))
            || state.dirs.iter().any(|p| is_under(p, relative));
        if has_children && !recursive {
            return Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("{relative} is not empty"),
            ));
        }
        state.begin()?;
        state.files.retain(|p, _| !is_under(p, relative));
        state.dirs.retain(|p| p != relative && !is_under(p, relative));
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        let mut state = self.state();
        let is_file = state.files.contains_key(from);
        if !is_file && !state.dirs.contains(from) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{from} does not exist"),
            ));
        }
        state.begin()?;
        state.add_parents(to);

        let rekey = |path: &str| format!("{to}{}", &path[from.len()..]);
        if is_file {
            if let Some(content) = state.files.remove(from) {
                state.files.insert(to.to_string(), content);
            }
            return Ok(());
        }

        let moved_files: Vec<_> = state
            .files
            .keys()
            .filter(|p| is_under(p, from))
            .cloned()
            .collect();
        for path in moved_files {
            if let Some(content) = state.files.remove(&path) {
                state.files.insert(rekey(&path), content);
            }
        }
        let moved_dirs: Vec<_> = state
            .dirs
            .iter()
            .filter(|p| p.as_str() == from || is_under(p, from))
            .cloned()
            .collect();
        for path in moved_dirs {
            state.dirs.remove(&path);
            state.dirs.insert(rekey(&path));
        }
        Ok(())
    }
}
