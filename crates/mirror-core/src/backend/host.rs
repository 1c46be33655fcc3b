//! Host directory handles

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::AsyncWriteExt;

/// A directory on the host side of a sync.
///
/// Modeled on directory-handle APIs: entries are addressed one name at a
/// time, and subdirectories are obtained as new handles. The host side is
/// externally mutable at any time.
#[async_trait]
pub trait HostDirectory: Send + Sync {
    /// Name of this directory.
    fn name(&self) -> &str;

    /// Get a subdirectory handle, creating it when `create` is set.
    ///
    /// Returns `None` when the directory does not exist and `create` is
    /// false.
    async fn directory(
        &self,
        name: &str,
        create: bool,
    ) -> io::Result<Option<Arc<dyn HostDirectory>>>;

    /// Read a file's text, `None` when it does not exist.
    async fn read_file(&self, name: &str) -> io::Result<Option<String>>;

    /// Create or overwrite a file.
    async fn write_file(&self, name: &str, content: &str) -> io::Result<()>;
}

fn split_relative(relative: &str) -> io::Result<(Vec<&str>, &str)> {
    let mut segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
    match segments.pop() {
        Some(file) => Ok((segments, file)),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{relative}' does not name a file"),
        )),
    }
}

/// Walk `segments` below `root`, returning the innermost handle.
///
/// `Ok(None)` from the outer option means a segment was missing and
/// `create` was false. The inner `None` stands for `root` itself.
async fn descend(
    root: &dyn HostDirectory,
    segments: &[&str],
    create: bool,
) -> io::Result<Option<Option<Arc<dyn HostDirectory>>>> {
    let mut current: Option<Arc<dyn HostDirectory>> = None;
    for segment in segments {
        let next = match &current {
            Some(dir) => dir.directory(segment, create).await?,
            None => root.directory(segment, create).await?,
        };
        match next {
            Some(dir) => current = Some(dir),
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Read a slash-separated path below `root`.
pub async fn read_relative(root: &dyn HostDirectory, relative: &str) -> io::Result<Option<String>> {
    let (segments, file) = split_relative(relative)?;
    match descend(root, &segments, false).await? {
        None => Ok(None),
        Some(Some(dir)) => dir.read_file(file).await,
        Some(None) => root.read_file(file).await,
    }
}

/// Write a slash-separated path below `root`, creating directories.
pub async fn write_relative(root: &dyn HostDirectory, relative: &str, content: &str) -> io::Result<()> {
    let (segments, file) = split_relative(relative)?;
    match descend(root, &segments, true).await? {
        Some(Some(dir)) => dir.write_file(file, content).await,
        Some(None) => root.write_file(file, content).await,
        None => Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("could not create parent directories of {relative}"),
        )),
    }
}

/// [`HostDirectory`] over a directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalHostDirectory {
    path: PathBuf,
    name: String,
}

impl LocalHostDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl HostDirectory for LocalHostDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn directory(
        &self,
        name: &str,
        create: bool,
    ) -> io::Result<Option<Arc<dyn HostDirectory>>> {
        let path = self.path.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{} is not a directory", path.display()),
                ));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !create {
                    return Ok(None);
                }
                tokio::fs::create_dir_all(&path).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(Some(Arc::new(LocalHostDirectory::new(path))))
    }

    async fn read_file(&self, name: &str) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(self.path.join(name)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write_file(&self, name: &str, content: &str) -> io::Result<()> {
        let mut file = tokio::fs::File::create(self.path.join(name)).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await
    }
}

#[derive(Debug, Default)]
struct MemoryHostState {
    files: BTreeMap<String, String>,
    dirs: BTreeSet<String>,
    writes: usize,
    fail_after: Option<usize>,
}

/// In-memory [`HostDirectory`] with write counting and failure injection.
///
/// Handles returned by [`HostDirectory::directory`] share state with the
/// handle they came from, so inspecting the root sees every write.
#[derive(Debug, Clone)]
pub struct MemoryHostDirectory {
    state: Arc<Mutex<MemoryHostState>>,
    prefix: String,
    name: String,
}

impl MemoryHostDirectory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: Arc::default(),
            prefix: String::new(),
            name: name.into(),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryHostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn full(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }

    /// Place a file below this directory without counting it as a write.
    pub fn insert_file(&self, relative: &str, content: &str) {
        let full = self.full(relative);
        let mut state = self.state();
        let mut current = full.as_str();
        while let Some((parent, _)) = current.rsplit_once('/') {
            state.dirs.insert(parent.to_string());
            current = parent;
        }
        state.files.insert(full, content.to_string());
    }

    /// Content of a file below this directory.
    pub fn file(&self, relative: &str) -> Option<String> {
        self.state().files.get(&self.full(relative)).cloned()
    }

    pub fn has_directory(&self, relative: &str) -> bool {
        self.state().dirs.contains(&self.full(relative))
    }

    /// Number of files below this directory.
    pub fn file_count(&self) -> usize {
        let prefix = format!("{}/", self.prefix);
        self.state()
            .files
            .keys()
            .filter(|p| self.prefix.is_empty() || p.starts_with(&prefix))
            .count()
    }

    /// Total successful writes across every handle sharing this state.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }

    /// Fail every write once `count` writes have succeeded.
    pub fn fail_after_writes(&self, count: usize) {
        self.state().fail_after = Some(count);
    }
}

#[async_trait]
impl HostDirectory for MemoryHostDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn directory(
        &self,
        name: &str,
        create: bool,
    ) -> io::Result<Option<Arc<dyn HostDirectory>>> {
        let full = self.full(name);
        {
            let mut state = self.state();
            if !state.dirs.contains(&full) {
                if !create {
                    return Ok(None);
                }
                state.dirs.insert(full.clone());
            }
        }
        Ok(Some(Arc::new(MemoryHostDirectory {
            state: Arc::clone(&self.state),
            prefix: full,
            name: name.to_string(),
        })))
    }

    async fn read_file(&self, name: &str) -> io::Result<Option<String>> {
        Ok(self.state().files.get(&self.full(name)).cloned())
    }

    async fn write_file(&self, name: &str, content: &str) -> io::Result<()> {
        let full = self.full(name);
        let mut state = self.state();
        if state.fail_after.is_some_and(|limit| state.writes >= limit) {
            return Err(io::Error::other(format!("injected write failure at {full}")));
        }
        state.writes += 1;
        state.files.insert(full, content.to_string());
        Ok(())
    }
}
