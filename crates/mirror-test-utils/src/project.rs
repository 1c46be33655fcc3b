//! [`TestProject`] builder for sync scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding a `project/` tree and a `host/` mirror
/// target.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::TestProject;
///
/// let project = TestProject::new()
///     .with_file("src/main.rs", "fn main() {}")
///     .with_host_file("app/README.md", "old");
/// project.assert_host_file("app/README.md", "old");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create empty `project/` and `host/` directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("project")).unwrap();
        fs::create_dir_all(temp_dir.path().join("host")).unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn project_dir(&self) -> PathBuf {
        self.root().join("project")
    }

    pub fn host_dir(&self) -> PathBuf {
        self.root().join("host")
    }

    /// Add a file below `project/`.
    pub fn with_file(self, relative: &str, content: &str) -> Self {
        self.write_file(relative, content);
        self
    }

    /// Add a file below `host/`.
    pub fn with_host_file(self, relative: &str, content: &str) -> Self {
        self.write_host_file(relative, content);
        self
    }

    pub fn write_file(&self, relative: &str, content: &str) {
        write(&self.project_dir().join(relative), content.as_bytes());
    }

    pub fn write_bytes(&self, relative: &str, content: &[u8]) {
        write(&self.project_dir().join(relative), content);
    }

    pub fn write_host_file(&self, relative: &str, content: &str) {
        write(&self.host_dir().join(relative), content.as_bytes());
    }

    pub fn read_host_file(&self, relative: &str) -> Option<String> {
        fs::read_to_string(self.host_dir().join(relative)).ok()
    }

    /// Every file below `project/` as `(relative path, content)`, sorted.
    /// Non-UTF-8 files are skipped.
    pub fn project_files(&self) -> Vec<(String, String)> {
        let mut files = Vec::new();
        collect(&self.project_dir(), &self.project_dir(), &mut files);
        files.sort();
        files
    }

    /// Assert that a host file exists with exactly `content`.
    ///
    /// # Panics
    /// Panics if the file is missing or differs.
    pub fn assert_host_file(&self, relative: &str, content: &str) {
        let path = self.host_dir().join(relative);
        let actual = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read host file: {}", path.display()));
        assert_eq!(
            actual,
            content,
            "Host file {} has unexpected content",
            path.display()
        );
    }

    /// Assert that no host file exists at `relative`.
    pub fn assert_host_missing(&self, relative: &str) {
        let path = self.host_dir().join(relative);
        assert!(!path.exists(), "Expected host file NOT to exist: {}", path.display());
    }
}

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn collect(base: &Path, dir: &Path, files: &mut Vec<(String, String)>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(base, &path, files);
        } else if let Ok(content) = fs::read_to_string(&path) {
            let relative = path
                .strip_prefix(base)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            files.push((relative, content));
        }
    }
}
