//! Normalized path handling for virtual and host paths

use std::path::{Path, PathBuf};

/// A path normalized to forward slashes with dot segments resolved.
///
/// Watcher events, table keys and backend calls all speak in terms of
/// these paths. `..` segments are resolved lexically, so a path that tries
/// to escape a root shows up as a path outside that root and fails the
/// [`NormalizedPath::relative_to`] check instead of slipping through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes, collapses repeated
    /// separators and resolves `.` and `..` segments. Leading `..`
    /// segments of a relative path are dropped.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        Self {
            inner: resolve_segments(&raw),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Whether the path starts at the filesystem root.
    pub fn is_absolute(&self) -> bool {
        self.inner.starts_with('/')
    }

    /// Join this path with a segment, resolving dot segments.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let joined = if self.inner.is_empty() {
            segment_normalized
        } else if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self {
            inner: resolve_segments(&joined),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) if self.inner.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) if idx > 0 => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// Express this path relative to `root`.
    ///
    /// Returns `None` when the path is not strictly below `root`. The root
    /// itself is not a valid target for file operations, so it also yields
    /// `None`.
    pub fn relative_to(&self, root: &NormalizedPath) -> Option<String> {
        let rest = if root.inner == "/" {
            self.inner.strip_prefix('/')?
        } else {
            self.inner.strip_prefix(&root.inner)?.strip_prefix('/')?
        };
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }

    /// Whether this path is a strict descendant of `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &NormalizedPath) -> bool {
        self.relative_to(ancestor).is_some()
    }
}

/// Resolve `.`/`..` and empty segments of a slash-separated path.
fn resolve_segments(raw: &str) -> String {
    let absolute = raw.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_parent_is_none() {
        assert_eq!(NormalizedPath::new("/").parent(), None);
        assert_eq!(
            NormalizedPath::new("/a").parent(),
            Some(NormalizedPath::new("/"))
        );
    }

    #[test]
    fn relative_to_filesystem_root() {
        let root = NormalizedPath::new("/");
        assert_eq!(
            NormalizedPath::new("/a/b").relative_to(&root).as_deref(),
            Some("a/b")
        );
    }

    #[test]
    fn relative_to_rejects_sibling_prefix() {
        let root = NormalizedPath::new("/workspace");
        assert_eq!(NormalizedPath::new("/workspace2/a").relative_to(&root), None);
    }
}
