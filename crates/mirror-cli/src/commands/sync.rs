//! Sync command implementation
//!
//! Loads the project directory into a virtual file table, then runs one
//! sync into the host directory and persists the known states.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use ignore::WalkBuilder;
use mirror_core::{
    ConflictPolicy, ConflictResolver, FixedResolver, HistoryEntry, KnownStateCache, LocalFs,
    LocalHostDirectory, SyncEngine, SyncSession, SyncSettings, VirtualFileTable, WatcherEvent,
    normalize_project_name,
};
use mirror_fs::{ConfigStore, NormalizedPath};

use crate::error::{CliError, Result};
use crate::prompt::PromptResolver;

/// How long an interactive prompt may stay open.
const INTERACTIVE_DECISION_SECS: u64 = 24 * 60 * 60;

/// Options for `mirror sync`
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub name: Option<String>,
    pub policy: Option<ConflictPolicy>,
    pub excludes: Vec<String>,
    pub settings: Option<PathBuf>,
    pub state: Option<PathBuf>,
    pub reset: bool,
    pub json: bool,
}

/// Run the sync command
pub async fn run_sync(project: &Path, host: &Path, options: SyncOptions) -> Result<()> {
    if !project.is_dir() {
        return Err(CliError::user(format!(
            "Project directory not found: {}",
            project.display()
        )));
    }
    if !host.is_dir() {
        return Err(CliError::user(format!(
            "Host directory not found: {}",
            host.display()
        )));
    }

    let project = project.canonicalize()?;
    let name = match &options.name {
        Some(name) => name.clone(),
        None => project
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string()),
    };

    let settings_path = options.settings.as_ref().map(NormalizedPath::new);
    let mut settings = match &settings_path {
        Some(path) => SyncSettings::load(path)?,
        None => SyncSettings::default(),
    };
    if let Some(policy) = options.policy {
        settings.conflict_policy = policy;
    }
    settings.exclude_patterns.extend(options.excludes.iter().cloned());

    let interactive = settings.conflict_policy == ConflictPolicy::Ask && std::io::stdin().is_terminal();
    let resolver: Arc<dyn ConflictResolver> = if interactive {
        settings.decision_timeout_secs = settings.decision_timeout_secs.max(INTERACTIVE_DECISION_SECS);
        Arc::new(PromptResolver)
    } else {
        Arc::new(FixedResolver(settings.default_decision))
    };

    let state_path = match &options.state {
        Some(path) => Some(NormalizedPath::new(path)),
        None => default_state_path(&name),
    };
    let store = ConfigStore::new();
    let known: KnownStateCache = match &state_path {
        Some(path) if !options.reset => store.load_or_default(path)?,
        _ => KnownStateCache::new(),
    };

    let table = load_table(&project)?;
    tracing::info!(
        project = %name,
        files = table.file_count(),
        known = known.len(),
        "project loaded"
    );

    let host_dir = LocalHostDirectory::new(host);
    let mut session = SyncSession::new(name.as_str(), settings.folder_name_for(&name));
    let mut engine = SyncEngine::new(resolver).with_known_states(known);

    let entry = engine.sync(&table, &host_dir, &mut session, &settings).await?;

    if let Some(path) = &state_path {
        store.save(path, engine.known_states())?;
    }
    if let Some(path) = &settings_path
        && entry.is_success()
        && settings.project(&name).is_some()
    {
        settings.record_sync(&name, entry.timestamp);
        settings.save(path)?;
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        print_summary(&entry, &session.project_folder_name, host);
    }

    match entry.error {
        Some(error) => Err(CliError::user(format!("Sync aborted: {error}"))),
        None => Ok(()),
    }
}

/// Known states live under the user data directory, one file per project.
fn default_state_path(project_name: &str) -> Option<NormalizedPath> {
    let dir = dirs::data_local_dir()?.join("tree-mirror").join("state");
    let file = format!("{}.json", normalize_project_name(project_name));
    Some(NormalizedPath::new(dir.join(file)))
}

/// Read every file under `root` into a table, as a watcher would report
/// them. VCS directories are skipped; exclude patterns apply at sync time.
fn load_table(root: &Path) -> Result<VirtualFileTable> {
    let root_path = NormalizedPath::new(root);
    let mut table = VirtualFileTable::new(root_path, Arc::new(LocalFs::new(root)));

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .filter_entry(|entry| !matches!(entry.file_name().to_str(), Some(".git" | ".hg" | ".svn")))
        .build();

    let mut events = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }
        let path = NormalizedPath::new(entry.path()).as_str().to_string();
        match entry.file_type() {
            Some(kind) if kind.is_dir() => events.push(WatcherEvent::AddDir { path }),
            Some(kind) if kind.is_file() => {
                let buffer = std::fs::read(entry.path())?;
                events.push(WatcherEvent::AddFile {
                    path,
                    buffer: Some(buffer),
                });
            }
            _ => {}
        }
    }
    table.apply_events(events);
    Ok(table)
}

fn print_summary(entry: &HistoryEntry, folder: &str, host: &Path) {
    let stats = &entry.statistics;
    let target = host.join(folder);

    if entry.is_success() {
        println!(
            "{} Synced to {}",
            "OK".green().bold(),
            target.display().to_string().yellow()
        );
    } else {
        println!(
            "{} Sync to {} stopped early",
            "FAILED".red().bold(),
            target.display().to_string().yellow()
        );
    }

    for file in &entry.files {
        println!("  {} {}", "->".cyan(), file);
    }
    println!();
    println!(
        "  new: {}  changed: {}  unchanged: {}  conflicts: {}  kept on host: {}",
        stats.new_files.to_string().green(),
        stats.changed_files.to_string().yellow(),
        stats.unchanged_files,
        stats.conflicts.to_string().red(),
        stats.kept_host
    );
    println!(
        "  {} bytes written in {} ms",
        stats.total_bytes, stats.duration_ms
    );
}
