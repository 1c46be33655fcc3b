//! Interactive conflict resolution

use async_trait::async_trait;
use colored::Colorize;
use dialoguer::Select;
use mirror_content::{ChangeKind, diff};
use mirror_core::{ConflictDecision, ConflictResolver, Error, SyncConflict};

/// Asks on the terminal which side of a conflict to keep.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptResolver;

#[async_trait]
impl ConflictResolver for PromptResolver {
    async fn resolve(&self, conflict: &SyncConflict) -> mirror_core::Result<ConflictDecision> {
        let owned = conflict.clone();
        match tokio::task::spawn_blocking(move || prompt(&owned)).await {
            Ok(Ok(decision)) => Ok(decision),
            Ok(Err(e)) => {
                tracing::warn!(path = %conflict.path, error = %e, "conflict prompt failed");
                Err(Error::SyncConflict {
                    path: conflict.path.clone(),
                })
            }
            Err(e) => {
                tracing::warn!(path = %conflict.path, error = %e, "conflict prompt aborted");
                Err(Error::SyncConflict {
                    path: conflict.path.clone(),
                })
            }
        }
    }
}

fn prompt(conflict: &SyncConflict) -> dialoguer::Result<ConflictDecision> {
    println!();
    println!(
        "{} {} changed both locally and on the host",
        "Conflict".yellow().bold(),
        conflict.path.cyan()
    );
    let changes = diff(&conflict.host, &conflict.local);
    for block in changes.changes() {
        match block.kind {
            ChangeKind::Removed => println!("  {} {}", "host ".red(), block.content),
            ChangeKind::Added => println!("  {} {}", "local".green(), block.content),
            ChangeKind::Unchanged => {}
        }
    }

    let choice = Select::new()
        .with_prompt("Which version should the host keep?")
        .items(&["Use local version", "Keep host version"])
        .default(1)
        .interact()?;

    Ok(if choice == 0 {
        ConflictDecision::UseLocal
    } else {
        ConflictDecision::KeepHost
    })
}
