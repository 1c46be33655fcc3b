//! Tests for settings persistence and project sessions

use mirror_core::{ConflictDecision, ConflictPolicy, SessionManager, SyncSettings, normalize_project_name};
use mirror_fs::NormalizedPath;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

mod persistence_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case("settings.toml")]
    #[case("settings.json")]
    #[case("settings.yaml")]
    fn test_settings_round_trip_each_format(#[case] file: &str) {
        let dir = TempDir::new().unwrap();
        let path = NormalizedPath::new(dir.path().join(file));
        let mut settings = SyncSettings {
            conflict_policy: ConflictPolicy::Skip,
            auto_sync_interval_secs: 42,
            ..SyncSettings::default()
        };
        settings.enable_project("Shop Front", Some("shop"));

        settings.save(&path).unwrap();
        let loaded = SyncSettings::load(&path).unwrap();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = NormalizedPath::new(dir.path().join("absent.toml"));

        assert_eq!(SyncSettings::load(&path).unwrap(), SyncSettings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "conflict_policy = \"force\"\ndefault_decision = \"use_local\"\n").unwrap();

        let loaded = SyncSettings::load(&NormalizedPath::new(&path)).unwrap();

        assert_eq!(loaded.conflict_policy, ConflictPolicy::Force);
        assert_eq!(loaded.default_decision, ConflictDecision::UseLocal);
        assert_eq!(loaded.auto_sync_interval_secs, 300);
    }
}

mod project_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case("My Site", "my_site")]
    #[case("my site (3)", "my_site")]
    #[case("My-Site", "mysite")]
    #[case("Portfolio_2", "portfolio")]
    #[case("  spaced   out  ", "spaced_out")]
    #[case("Python 3", "python_3")]
    #[case("Python 3 (2)", "python_3")]
    #[case("Game 2048-1", "game_2048")]
    fn test_normalize_project_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_project_name(input), expected);
    }

    #[test]
    fn test_disable_keeps_folder() {
        let mut settings = SyncSettings::default();
        settings.enable_project("app", Some("custom"));
        settings.disable_project("App");
        settings.enable_project("APP", None);

        assert_eq!(settings.folder_name_for("app"), "custom");
        assert!(settings.is_project_enabled("app"));
    }

    #[test]
    fn test_session_manager_lifecycle() {
        let mut manager = SessionManager::new();
        assert!(manager.active().is_none());

        let handle = manager.open("App", "app");
        assert_eq!(manager.active().unwrap().project_folder_name, "app");
        assert!(manager.session_mut(handle).is_ok());

        let closed = manager.close(handle).unwrap();
        assert_eq!(closed.id, handle.id());
        assert!(manager.close(handle).is_err());
    }
}
