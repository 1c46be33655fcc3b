//! Tests for the sync engine

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mirror_core::{
    ChannelResolver, ConflictDecision, ConflictPolicy, ConflictResolver, Error, FixedResolver,
    KnownStateCache, MemoryFs, MemoryHostDirectory, SyncConflict, SyncEngine, SyncSession,
    SyncSettings, SyncStatus, VirtualFileTable, WatcherEvent,
};
use pretty_assertions::assert_eq;

fn settings() -> SyncSettings {
    SyncSettings {
        sync_guard_ms: 0,
        ..SyncSettings::default()
    }
}

fn table(files: &[(&str, &str)]) -> VirtualFileTable {
    let mut table = VirtualFileTable::new("/workspace", Arc::new(MemoryFs::new()));
    table.apply_events(
        files
            .iter()
            .map(|(path, content)| WatcherEvent::add_file(format!("/workspace/{path}"), content)),
    );
    table
}

fn session() -> SyncSession {
    SyncSession::new("App", "app")
}

/// Counts how often it is asked and always answers the same.
struct CountingResolver {
    decision: ConflictDecision,
    calls: AtomicUsize,
}

impl CountingResolver {
    fn new(decision: ConflictDecision) -> Arc<Self> {
        Arc::new(Self {
            decision,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConflictResolver for CountingResolver {
    async fn resolve(&self, _conflict: &SyncConflict) -> mirror_core::Result<ConflictDecision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.decision)
    }
}

/// Never answers.
struct SilentResolver;

#[async_trait]
impl ConflictResolver for SilentResolver {
    async fn resolve(&self, _conflict: &SyncConflict) -> mirror_core::Result<ConflictDecision> {
        std::future::pending().await
    }
}

mod run_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_empty_host_gets_every_file() {
        let table = table(&[("a.txt", "a"), ("src/b.rs", "b"), ("src/c.rs", "cc")]);
        let host = MemoryHostDirectory::new("host");
        let mut session = session();
        let mut engine = SyncEngine::headless();

        let entry = engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        assert_eq!(entry.status, SyncStatus::Success);
        assert_eq!(entry.statistics.new_files, 3);
        assert_eq!(entry.statistics.changed_files, 0);
        assert_eq!(entry.statistics.total_synced_files, 3);
        assert_eq!(entry.statistics.total_bytes, 4);
        assert_eq!(host.file("app/src/c.rs").as_deref(), Some("cc"));
        assert_eq!(engine.known_states().len(), 3);
    }

    #[tokio::test]
    async fn test_second_run_writes_nothing() {
        let table = table(&[("a.txt", "a"), ("b.txt", "b"), ("c.txt", "c")]);
        let host = MemoryHostDirectory::new("host");
        let mut session = session();
        let mut engine = SyncEngine::headless();

        engine.sync(&table, &host, &mut session, &settings()).await.unwrap();
        let writes = host.write_count();
        let entry = engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        assert_eq!(host.write_count(), writes);
        assert_eq!(entry.statistics.new_files, 0);
        assert_eq!(entry.statistics.changed_files, 0);
        assert_eq!(entry.statistics.unchanged_files, 3);
        assert!(entry.files.is_empty());
    }

    #[tokio::test]
    async fn test_existing_project_folder_is_reused() {
        let table = table(&[("a.txt", "new")]);
        let host = MemoryHostDirectory::new("host");
        host.insert_file("app/other.txt", "kept");
        let mut session = session();

        SyncEngine::headless()
            .sync(&table, &host, &mut session, &settings())
            .await
            .unwrap();

        assert_eq!(host.file("app/other.txt").as_deref(), Some("kept"));
        assert_eq!(host.file("app/a.txt").as_deref(), Some("new"));
        assert_eq!(host.file_count(), 2);
    }

    #[tokio::test]
    async fn test_first_encounter_overwrites_host() {
        let table = table(&[("a.txt", "local")]);
        let host = MemoryHostDirectory::new("host");
        host.insert_file("app/a.txt", "stale");
        let mut session = session();

        let entry = SyncEngine::headless()
            .sync(&table, &host, &mut session, &settings())
            .await
            .unwrap();

        assert_eq!(entry.statistics.changed_files, 1);
        assert_eq!(host.file("app/a.txt").as_deref(), Some("local"));
    }

    #[tokio::test]
    async fn test_local_edit_overwrites_host() {
        let mut table = table(&[("a.txt", "v1")]);
        let host = MemoryHostDirectory::new("host");
        let mut session = session();
        let mut engine = SyncEngine::headless();
        engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        table.save("/workspace/a.txt", "v2").await.unwrap();
        let entry = engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        assert_eq!(entry.statistics.changed_files, 1);
        assert_eq!(entry.files, vec!["a.txt".to_string()]);
        assert_eq!(host.file("app/a.txt").as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_host_only_edit_is_left_alone() {
        let table = table(&[("a.txt", "v1")]);
        let host = MemoryHostDirectory::new("host");
        let mut session = session();
        let mut engine = SyncEngine::headless();
        engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        host.insert_file("app/a.txt", "edited on host");
        let entry = engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        assert_eq!(entry.statistics.kept_host, 1);
        assert_eq!(entry.statistics.conflicts, 0);
        assert_eq!(host.file("app/a.txt").as_deref(), Some("edited on host"));
    }

    #[tokio::test]
    async fn test_excluded_and_binary_files_are_skipped() {
        let mut table = table(&[
            ("src/a.rs", "a"),
            ("node_modules/react/index.js", "x"),
            ("debug.log", "x"),
        ]);
        table.apply_event(&WatcherEvent::AddFile {
            path: "/workspace/logo.png".into(),
            buffer: Some(vec![0x89, 0x50, 0x00, 0x00]),
        });
        let host = MemoryHostDirectory::new("host");
        let mut session = session();

        let entry = SyncEngine::headless()
            .sync(&table, &host, &mut session, &settings())
            .await
            .unwrap();

        assert_eq!(entry.files, vec!["src/a.rs".to_string()]);
        assert_eq!(host.file_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_exclude_pattern_refuses_to_start() {
        let table = table(&[("a.txt", "a")]);
        let host = MemoryHostDirectory::new("host");
        let mut session = session();
        let settings = SyncSettings {
            exclude_patterns: vec!["[broken".into()],
            ..settings()
        };

        let err = SyncEngine::headless()
            .sync(&table, &host, &mut session, &settings)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidExcludePattern { .. }));
        assert!(session.history.is_empty());
        assert_eq!(host.write_count(), 0);
    }

    #[tokio::test]
    async fn test_session_records_each_run() {
        let table = table(&[("a.txt", "a")]);
        let host = MemoryHostDirectory::new("host");
        let mut session = session();
        let mut engine = SyncEngine::headless();

        engine.sync(&table, &host, &mut session, &settings()).await.unwrap();
        engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        assert_eq!(session.history.len(), 2);
        assert_eq!(session.statistics.len(), 2);
        assert_eq!(session.statistics[0].total_files, 1);
        assert_eq!(session.statistics[0].new_files, 1);
        assert_eq!(session.statistics[0].status, SyncStatus::Success);
        assert_eq!(session.statistics[1].total_files, 0);
        assert_eq!(session.statistics[1].new_files, 0);
        assert!(session.synced_paths.contains("a.txt"));
        assert!(session.last_sync_at.is_some());
    }
}

mod failure_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_io_failure_aborts_with_exact_counts() {
        let table = table(&[("a.txt", "a"), ("b.txt", "b"), ("c.txt", "c")]);
        let host = MemoryHostDirectory::new("host");
        host.fail_after_writes(1);
        let mut session = session();
        let mut engine = SyncEngine::headless();

        let entry = engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        assert_eq!(entry.status, SyncStatus::Error);
        assert!(entry.error.as_deref().unwrap().contains("b.txt"));
        assert_eq!(entry.files, vec!["a.txt".to_string()]);
        assert_eq!(entry.statistics.new_files, 1);
        assert_eq!(entry.statistics.total_synced_files, 1);
        assert_eq!(engine.known_states().paths().collect::<Vec<_>>(), vec!["a.txt"]);
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.statistics[0].status, SyncStatus::Error);
        assert_eq!(session.statistics[0].total_files, 1);
        assert!(session.last_sync_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_interval_rejects_overlapping_start() {
        let table = table(&[("a.txt", "a")]);
        let host = MemoryHostDirectory::new("host");
        let mut session = session();
        let mut engine = SyncEngine::headless();
        let settings = SyncSettings::default();

        engine.sync(&table, &host, &mut session, &settings).await.unwrap();
        let err = engine.sync(&table, &host, &mut session, &settings).await.unwrap_err();
        assert!(matches!(err, Error::SyncThrottled { .. }));

        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(engine.sync(&table, &host, &mut session, &settings).await.is_ok());
    }
}

mod conflict_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Sync `v1`, then edit to `local` in the table and `host` on the host.
    async fn diverged(
        engine: &mut SyncEngine,
        local: &str,
        host_content: &str,
    ) -> (VirtualFileTable, MemoryHostDirectory, SyncSession) {
        let mut table = table(&[("a.txt", "v1")]);
        let host = MemoryHostDirectory::new("host");
        let mut session = session();
        engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        table.save("/workspace/a.txt", local).await.unwrap();
        host.insert_file("app/a.txt", host_content);
        (table, host, session)
    }

    #[tokio::test]
    async fn test_ask_use_local_overwrites() {
        let resolver = CountingResolver::new(ConflictDecision::UseLocal);
        let mut engine = SyncEngine::new(resolver.clone());
        let (table, host, mut session) = diverged(&mut engine, "local", "host").await;

        let entry = engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        assert_eq!(resolver.calls(), 1);
        assert_eq!(entry.statistics.conflicts, 1);
        assert_eq!(entry.statistics.changed_files, 1);
        assert_eq!(host.file("app/a.txt").as_deref(), Some("local"));
    }

    #[tokio::test]
    async fn test_ask_keep_host_is_not_reprompted() {
        let resolver = CountingResolver::new(ConflictDecision::KeepHost);
        let mut engine = SyncEngine::new(resolver.clone());
        let (table, host, mut session) = diverged(&mut engine, "local", "host").await;

        let first = engine.sync(&table, &host, &mut session, &settings()).await.unwrap();
        let second = engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        assert_eq!(resolver.calls(), 1);
        assert_eq!(first.statistics.kept_host, 1);
        assert_eq!(second.statistics.conflicts, 0);
        assert_eq!(host.file("app/a.txt").as_deref(), Some("host"));
        assert_eq!(engine.known_states().get("a.txt").unwrap().content, "host");
    }

    #[tokio::test]
    async fn test_skip_leaves_both_sides() {
        let resolver = CountingResolver::new(ConflictDecision::UseLocal);
        let mut engine = SyncEngine::new(resolver.clone());
        let (table, host, mut session) = diverged(&mut engine, "local", "host").await;
        let settings = SyncSettings {
            conflict_policy: ConflictPolicy::Skip,
            ..settings()
        };

        let entry = engine.sync(&table, &host, &mut session, &settings).await.unwrap();

        assert_eq!(resolver.calls(), 0);
        assert_eq!(entry.statistics.conflicts, 1);
        assert!(entry.files.is_empty());
        assert_eq!(host.file("app/a.txt").as_deref(), Some("host"));
        assert_eq!(table.get("/workspace/a.txt").unwrap().text_content(), Some("local"));
        assert_eq!(engine.known_states().get("a.txt").unwrap().content, "host");
    }

    #[tokio::test]
    async fn test_force_overwrites_without_asking() {
        let resolver = CountingResolver::new(ConflictDecision::KeepHost);
        let mut engine = SyncEngine::new(resolver.clone());
        let (table, host, mut session) = diverged(&mut engine, "local", "host").await;
        let settings = SyncSettings {
            conflict_policy: ConflictPolicy::Force,
            ..settings()
        };

        engine.sync(&table, &host, &mut session, &settings).await.unwrap();

        assert_eq!(resolver.calls(), 0);
        assert_eq!(host.file("app/a.txt").as_deref(), Some("local"));
        assert_eq!(engine.known_states().get("a.txt").unwrap().content, "local");
    }

    #[tokio::test]
    async fn test_converged_edits_are_not_a_conflict() {
        let resolver = CountingResolver::new(ConflictDecision::UseLocal);
        let mut engine = SyncEngine::new(resolver.clone());
        let (table, host, mut session) = diverged(&mut engine, "same", "same").await;

        let entry = engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        assert_eq!(resolver.calls(), 0);
        assert_eq!(entry.statistics.unchanged_files, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decision_timeout_uses_default() {
        let mut engine = SyncEngine::new(Arc::new(SilentResolver));
        let (table, host, mut session) = diverged(&mut engine, "local", "host").await;
        let settings = SyncSettings {
            decision_timeout_secs: 5,
            default_decision: ConflictDecision::UseLocal,
            ..settings()
        };

        let entry = engine.sync(&table, &host, &mut session, &settings).await.unwrap();

        assert_eq!(entry.status, SyncStatus::Success);
        assert_eq!(host.file("app/a.txt").as_deref(), Some("local"));
    }

    #[tokio::test]
    async fn test_channel_resolver_drives_decision() {
        let (resolver, mut requests) = ChannelResolver::new(4);
        let mut engine = SyncEngine::new(Arc::new(FixedResolver(ConflictDecision::KeepHost)));
        let (table, host, mut session) = diverged(&mut engine, "local", "host").await;
        engine.set_resolver(Arc::new(resolver));

        let ui = tokio::spawn(async move {
            let request = requests.recv().await.unwrap();
            assert_eq!(request.conflict.local, "local");
            assert_eq!(request.conflict.host, "host");
            assert_eq!(request.conflict.known.as_deref(), Some("v1"));
            request.decide(ConflictDecision::UseLocal);
        });

        engine.sync(&table, &host, &mut session, &settings()).await.unwrap();
        ui.await.unwrap();

        assert_eq!(host.file("app/a.txt").as_deref(), Some("local"));
    }
}

mod known_state_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_restored_cache_detects_conflict() {
        let table = table(&[("a.txt", "local")]);
        let host = MemoryHostDirectory::new("host");
        host.insert_file("app/a.txt", "host");
        let mut cache = KnownStateCache::new();
        cache.record("a.txt", "base", "base");
        let json = serde_json::to_string(&cache).unwrap();
        let restored: KnownStateCache = serde_json::from_str(&json).unwrap();

        let resolver = CountingResolver::new(ConflictDecision::KeepHost);
        let mut engine = SyncEngine::new(resolver.clone()).with_known_states(restored);
        let mut session = session();
        engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_reset_turns_conflict_into_first_encounter() {
        let table = table(&[("a.txt", "local")]);
        let host = MemoryHostDirectory::new("host");
        host.insert_file("app/a.txt", "host");
        let mut cache = KnownStateCache::new();
        cache.record("a.txt", "base", "base");

        let resolver = CountingResolver::new(ConflictDecision::KeepHost);
        let mut engine = SyncEngine::new(resolver.clone()).with_known_states(cache);
        engine.reset_known_states();
        let mut session = session();
        engine.sync(&table, &host, &mut session, &settings()).await.unwrap();

        assert_eq!(resolver.calls(), 0);
        assert_eq!(host.file("app/a.txt").as_deref(), Some("local"));
    }
}
