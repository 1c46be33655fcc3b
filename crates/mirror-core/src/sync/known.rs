//! Known-state cache and the three-way decision table

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mirror_fs::{compute_content_checksum, content_matches};
use serde::{Deserialize, Serialize};

/// What the engine last confirmed about a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownFileState {
    /// Host content after the last decision
    pub content: String,
    /// Checksum of the local content that decision was made against
    pub local_checksum: String,
    pub timestamp: DateTime<Utc>,
}

impl KnownFileState {
    pub fn new(host_content: &str, local_content: &str) -> Self {
        Self {
            content: host_content.to_string(),
            local_checksum: compute_content_checksum(local_content),
            timestamp: Utc::now(),
        }
    }

    /// Whether local content is the same as when this state was recorded.
    pub fn local_matches(&self, local: &str) -> bool {
        content_matches(&self.local_checksum, local)
    }
}

/// Per-path known states, keyed by project-relative path.
///
/// Owned by the [`SyncEngine`](super::SyncEngine). Serializable so an
/// outer layer can persist it between processes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnownStateCache {
    entries: BTreeMap<String, KnownFileState>,
}

impl KnownStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&KnownFileState> {
        self.entries.get(path)
    }

    /// Record the outcome of a decision for `path`.
    pub fn record(&mut self, path: &str, host_content: &str, local_content: &str) {
        self.entries.insert(
            path.to_string(),
            KnownFileState::new(host_content, local_content),
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Outcome of comparing local, host and known state for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    /// Host has no such file
    Create,
    /// Only the local side moved, or there is no history to compare with
    Overwrite,
    /// Host already matches local
    Unchanged,
    /// Only the host side moved since the last decision; leave it
    HostAhead,
    /// Both sides moved since the last decision
    Conflict,
}

/// Decide what to do with one path.
///
/// | host        | known            | local vs known | host vs known | action    |
/// |-------------|------------------|----------------|---------------|-----------|
/// | absent      | any              | any            | any           | Create    |
/// | == local    | any              | any            | any           | Unchanged |
/// | != local    | none             |                |               | Overwrite |
/// | != local    | some             | same           | any           | HostAhead |
/// | != local    | some             | moved          | same          | Overwrite |
/// | != local    | some             | moved          | moved         | Conflict  |
pub fn classify_change(
    local: &str,
    host: Option<&str>,
    known: Option<&KnownFileState>,
) -> FileAction {
    let Some(host) = host else {
        return FileAction::Create;
    };
    if host == local {
        return FileAction::Unchanged;
    }
    let Some(known) = known else {
        return FileAction::Overwrite;
    };
    if known.local_matches(local) {
        FileAction::HostAhead
    } else if known.content == host {
        FileAction::Overwrite
    } else {
        FileAction::Conflict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn synced(content: &str) -> KnownFileState {
        KnownFileState::new(content, content)
    }

    #[rstest]
    #[case::new_file("a", None, None, FileAction::Create)]
    #[case::new_file_with_stale_history("a", None, Some("k"), FileAction::Create)]
    #[case::already_equal("a", Some("a"), Some("k"), FileAction::Unchanged)]
    #[case::first_encounter("a", Some("h"), None, FileAction::Overwrite)]
    #[case::local_edit("l", Some("k"), Some("k"), FileAction::Overwrite)]
    #[case::host_edit("k", Some("h"), Some("k"), FileAction::HostAhead)]
    #[case::both_edited("l", Some("h"), Some("k"), FileAction::Conflict)]
    fn decision_table(
        #[case] local: &str,
        #[case] host: Option<&str>,
        #[case] known: Option<&str>,
        #[case] expected: FileAction,
    ) {
        let known = known.map(synced);
        assert_eq!(classify_change(local, host, known.as_ref()), expected);
    }

    #[test]
    fn kept_host_decision_is_not_reprompted() {
        // Conflict resolved by keeping the host: host content "h" is now
        // known, recorded against local "l".
        let known = KnownFileState::new("h", "l");
        assert_eq!(classify_change("l", Some("h"), Some(&known)), FileAction::HostAhead);
        assert_eq!(classify_change("l2", Some("h"), Some(&known)), FileAction::Overwrite);
    }

    #[test]
    fn cache_serializes_as_path_map() {
        let mut cache = KnownStateCache::new();
        cache.record("src/a.rs", "x", "x");

        let json = serde_json::to_value(&cache).unwrap();
        assert_eq!(json["src/a.rs"]["content"], "x");
        assert!(json["src/a.rs"]["localChecksum"]
            .as_str()
            .unwrap()
            .starts_with("sha256:"));
    }
}
