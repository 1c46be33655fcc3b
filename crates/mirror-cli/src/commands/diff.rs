//! Diff command implementation

use std::path::Path;

use colored::Colorize;
use mirror_content::{ChangeKind, CharChange, DiffBlock, FileDiff, diff_bytes};

use crate::error::Result;

/// Run the diff command.
pub fn run_diff(before: &Path, after: &Path, json: bool) -> Result<()> {
    let old = std::fs::read(before)?;
    let new = std::fs::read(after)?;
    let result = diff_bytes(&old, &new);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_diff(&result, before, after);
    }
    Ok(())
}

fn print_diff(result: &FileDiff, before: &Path, after: &Path) {
    if result.is_binary {
        println!(
            "{} {} and {} are binary or too large to diff",
            "Binary".yellow().bold(),
            before.display(),
            after.display()
        );
        return;
    }
    if !result.has_changes {
        println!("{} No changes.", "OK".green().bold());
        return;
    }

    println!("{} {}", "---".red(), before.display());
    println!("{} {}", "+++".green(), after.display());
    for block in &result.blocks {
        println!("{}", format_block(block));
    }

    let stats = result.stats();
    println!();
    println!(
        "{} {}, {}, similarity {:.0}%",
        "Summary:".bold(),
        format!("+{}", stats.added).green(),
        format!("-{}", stats.removed).red(),
        result.similarity * 100.0
    );
}

fn format_block(block: &DiffBlock) -> String {
    let number = format!("{:>4}", block.side_line).dimmed();
    match block.kind {
        ChangeKind::Unchanged => format!("{number}   {}", block.content),
        ChangeKind::Removed => format!("{number} {} {}", "-".red(), highlight(block, |s| s.red())),
        ChangeKind::Added => format!("{number} {} {}", "+".green(), highlight(block, |s| s.green())),
    }
}

/// Render changed character runs in bold, the rest plain colored.
fn highlight(block: &DiffBlock, paint: impl Fn(&str) -> colored::ColoredString) -> String {
    match &block.char_changes {
        None => paint(&block.content).to_string(),
        Some(runs) => runs.iter().map(|run: &CharChange| match run.kind {
            ChangeKind::Unchanged => paint(&run.value).to_string(),
            _ => paint(&run.value).bold().underline().to_string(),
        }).collect(),
    }
}
