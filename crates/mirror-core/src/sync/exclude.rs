//! Gitignore-style exclusion of project paths from sync

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::{Error, Result};

/// Compiled exclude patterns.
#[derive(Debug, Clone)]
pub struct ExcludeMatcher {
    matcher: Gitignore,
}

impl ExcludeMatcher {
    /// Compile `patterns` with gitignore semantics. Blank lines and
    /// `#` comments are skipped.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            let pattern = pattern.as_ref();
            builder
                .add_line(None, pattern)
                .map_err(|e| Error::InvalidExcludePattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
        }
        let matcher = builder.build().map_err(|e| Error::InvalidExcludePattern {
            pattern: patterns
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            message: e.to_string(),
        })?;
        Ok(Self { matcher })
    }

    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }

    /// Whether a project-relative file path, or any directory above it,
    /// is excluded.
    pub fn is_excluded(&self, relative: &str) -> bool {
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(relative, false)
            .is_ignore()
    }
}
