//! Protected subtrees that file operations must never touch.

/// Subtrees of a project that are off-limits to create/delete/rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectedPath {
    /// The `.git` directory (Git database)
    GitDir,
    /// The `.hg` directory (Mercurial database)
    HgDir,
    /// The `.svn` directory (Subversion metadata)
    SvnDir,
    /// A top-level `.cache` build cache
    CacheDir,
    /// Bundler caches under `node_modules/.cache`
    NodeModulesCache,
    /// Vite's pre-bundle cache under `node_modules/.vite`
    ViteCache,
}

impl ProtectedPath {
    /// Every protected subtree, checked in order.
    pub const ALL: [ProtectedPath; 6] = [
        Self::GitDir,
        Self::HgDir,
        Self::SvnDir,
        Self::CacheDir,
        Self::NodeModulesCache,
        Self::ViteCache,
    ];

    /// Get the project-relative string representation of the subtree.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitDir => ".git",
            Self::HgDir => ".hg",
            Self::SvnDir => ".svn",
            Self::CacheDir => ".cache",
            Self::NodeModulesCache => "node_modules/.cache",
            Self::ViteCache => "node_modules/.vite",
        }
    }

    /// Whether a project-relative path is this subtree or lies inside it.
    pub fn contains(&self, relative: &str) -> bool {
        let prefix = self.as_str();
        match relative.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl std::fmt::Display for ProtectedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Find the protected subtree a project-relative path falls into, if any.
pub fn find_protected(relative: &str) -> Option<ProtectedPath> {
    let relative = relative.trim_start_matches('/');
    ProtectedPath::ALL.into_iter().find(|p| p.contains(relative))
}
