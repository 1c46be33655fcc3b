//! Line diff with bounded look-ahead and character-level refinement
//!
//! The walk keeps one cursor per side. Equal lines are emitted as
//! unchanged; otherwise a small look-ahead window looks for a point where
//! the two sides line up again, classifying the skipped lines as a pure
//! insertion or deletion. When no such point exists the two current lines
//! are paired as a modification and split into common prefix, differing
//! middle and common suffix.
//!
//! This is O(n·k) for a look-ahead of k rather than a full edit-distance
//! search, so on highly repetitive input the result can be locally rather
//! than globally minimal.

use serde::Serialize;
use similar::TextDiff;

use crate::classify::{looks_binary, normalize_lines};

/// How many lines ahead the walk searches for a resynchronization point
pub const LOOK_AHEAD: usize = 3;

/// Inputs larger than this are reported as binary instead of diffed
pub const MAX_DIFF_BYTES: usize = 1024 * 1024;

/// Classification of a line or character run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Unchanged,
}

/// A run of characters inside a modified line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharChange {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
}

impl CharChange {
    fn new(value: &str, kind: ChangeKind) -> Self {
        Self {
            value: value.to_string(),
            kind,
        }
    }
}

/// One line of the unified diff.
///
/// All line numbers are 1-based. `line_number` is the block's position in
/// the unified sequence and strictly ascends through [`FileDiff::blocks`].
/// `side_line` counts lines on the block's own side: the before text for
/// `Removed`, the after text for `Added` and `Unchanged`.
/// `corresponding_line` points at the other side: the before line for
/// `Unchanged` and `Added`, the after line for `Removed`. It is `None`
/// once that side is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffBlock {
    pub line_number: usize,
    pub side_line: usize,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub corresponding_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_changes: Option<Vec<CharChange>>,
}

impl DiffBlock {
    fn unchanged(side_line: usize, content: &str, before_line: usize) -> Self {
        Self {
            line_number: 0,
            side_line,
            content: content.to_string(),
            kind: ChangeKind::Unchanged,
            corresponding_line: Some(before_line),
            char_changes: None,
        }
    }

    fn whole_line(
        kind: ChangeKind,
        side_line: usize,
        content: &str,
        corresponding_line: Option<usize>,
    ) -> Self {
        Self {
            line_number: 0,
            side_line,
            content: content.to_string(),
            kind,
            corresponding_line,
            char_changes: None,
        }
    }
}

/// Line counts per change kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

/// Result of comparing two texts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiff {
    pub blocks: Vec<DiffBlock>,
    pub has_changes: bool,
    /// Set when either input was binary or over [`MAX_DIFF_BYTES`]; no
    /// blocks are produced in that case.
    pub is_binary: bool,
    /// Line similarity ratio between 0.0 and 1.0 (0.0 for binary input)
    pub similarity: f64,
}

impl FileDiff {
    /// The result reported for inputs that cannot be diffed.
    pub fn binary() -> Self {
        Self {
            blocks: Vec::new(),
            has_changes: false,
            is_binary: true,
            similarity: 0.0,
        }
    }

    /// Count blocks per kind.
    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for block in &self.blocks {
            match block.kind {
                ChangeKind::Added => stats.added += 1,
                ChangeKind::Removed => stats.removed += 1,
                ChangeKind::Unchanged => stats.unchanged += 1,
            }
        }
        stats
    }

    /// Blocks that are not `Unchanged`.
    pub fn changes(&self) -> impl Iterator<Item = &DiffBlock> {
        self.blocks
            .iter()
            .filter(|block| block.kind != ChangeKind::Unchanged)
    }
}

/// Diff two texts.
///
/// Never fails: binary or oversized input yields [`FileDiff::binary`].
pub fn diff(before: &str, after: &str) -> FileDiff {
    if unsupported(before.as_bytes()) || unsupported(after.as_bytes()) {
        return FileDiff::binary();
    }

    let old = normalize_lines(before);
    let new = normalize_lines(after);

    if old == new {
        let mut blocks: Vec<DiffBlock> = new
            .iter()
            .enumerate()
            .map(|(idx, line)| DiffBlock::unchanged(idx + 1, line, idx + 1))
            .collect();
        number_blocks(&mut blocks);
        return FileDiff {
            blocks,
            has_changes: false,
            is_binary: false,
            similarity: 1.0,
        };
    }

    let mut blocks = walk(&old, &new);
    number_blocks(&mut blocks);

    let has_changes = blocks.iter().any(|b| b.kind != ChangeKind::Unchanged);
    let similarity = if has_changes {
        let old_text = old.join("\n");
        let new_text = new.join("\n");
        TextDiff::from_lines(&old_text, &new_text).ratio() as f64
    } else {
        1.0
    };

    FileDiff {
        blocks,
        has_changes,
        is_binary: false,
        similarity,
    }
}

/// Diff two raw buffers, classifying them first.
pub fn diff_bytes(before: &[u8], after: &[u8]) -> FileDiff {
    if unsupported(before) || unsupported(after) {
        return FileDiff::binary();
    }

    match (std::str::from_utf8(before), std::str::from_utf8(after)) {
        (Ok(before), Ok(after)) => diff(before, after),
        _ => FileDiff::binary(),
    }
}

/// Assign unified positions in emission order.
fn number_blocks(blocks: &mut [DiffBlock]) {
    for (idx, block) in blocks.iter_mut().enumerate() {
        block.line_number = idx + 1;
    }
}

fn unsupported(bytes: &[u8]) -> bool {
    bytes.len() > MAX_DIFF_BYTES || looks_binary(bytes)
}

enum Resync {
    /// `before[i..i + k]` were removed
    Deletion(usize),
    /// `after[j..j + k]` were inserted
    Insertion(usize),
}

fn find_resync(old: &[&str], new: &[&str], i: usize, j: usize) -> Option<Resync> {
    for k in 1..=LOOK_AHEAD {
        if i + k < old.len() && old[i + k] == new[j] {
            return Some(Resync::Deletion(k));
        }
        if j + k < new.len() && new[j + k] == old[i] {
            return Some(Resync::Insertion(k));
        }
    }
    None
}

fn walk(old: &[&str], new: &[&str]) -> Vec<DiffBlock> {
    let mut blocks = Vec::with_capacity(old.len().max(new.len()));
    let (mut i, mut j) = (0usize, 0usize);

    while i < old.len() || j < new.len() {
        if i >= old.len() {
            blocks.push(DiffBlock::whole_line(ChangeKind::Added, j + 1, new[j], None));
            j += 1;
            continue;
        }
        if j >= new.len() {
            blocks.push(DiffBlock::whole_line(ChangeKind::Removed, i + 1, old[i], None));
            i += 1;
            continue;
        }

        if old[i] == new[j] {
            blocks.push(DiffBlock::unchanged(j + 1, new[j], i + 1));
            i += 1;
            j += 1;
            continue;
        }

        match find_resync(old, new, i, j) {
            Some(Resync::Deletion(k)) => {
                for line in i..i + k {
                    blocks.push(DiffBlock::whole_line(
                        ChangeKind::Removed,
                        line + 1,
                        old[line],
                        Some(j + 1),
                    ));
                }
                i += k;
            }
            Some(Resync::Insertion(k)) => {
                for line in j..j + k {
                    blocks.push(DiffBlock::whole_line(
                        ChangeKind::Added,
                        line + 1,
                        new[line],
                        Some(i + 1),
                    ));
                }
                j += k;
            }
            None => {
                let (removed, added) = char_changes(old[i], new[j]);
                blocks.push(DiffBlock {
                    line_number: 0,
                    side_line: i + 1,
                    content: old[i].to_string(),
                    kind: ChangeKind::Removed,
                    corresponding_line: Some(j + 1),
                    char_changes: Some(removed),
                });
                blocks.push(DiffBlock {
                    line_number: 0,
                    side_line: j + 1,
                    content: new[j].to_string(),
                    kind: ChangeKind::Added,
                    corresponding_line: Some(i + 1),
                    char_changes: Some(added),
                });
                i += 1;
                j += 1;
            }
        }
    }

    blocks
}

/// Split a modified line pair into prefix / middle / suffix runs.
///
/// With no common affix each side is a single run covering the whole line.
fn char_changes(before: &str, after: &str) -> (Vec<CharChange>, Vec<CharChange>) {
    let prefix = common_prefix_len(before, after);
    let suffix = common_suffix_len(&before[prefix..], &after[prefix..]);

    if prefix == 0 && suffix == 0 {
        return (
            vec![CharChange::new(before, ChangeKind::Removed)],
            vec![CharChange::new(after, ChangeKind::Added)],
        );
    }

    let split = |line: &str, kind: ChangeKind| {
        vec![
            CharChange::new(&line[..prefix], ChangeKind::Unchanged),
            CharChange::new(&line[prefix..line.len() - suffix], kind),
            CharChange::new(&line[line.len() - suffix..], ChangeKind::Unchanged),
        ]
    };

    (
        split(before, ChangeKind::Removed),
        split(after, ChangeKind::Added),
    )
}

/// Byte length of the longest common prefix, on char boundaries.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}

/// Byte length of the longest common suffix, on char boundaries.
fn common_suffix_len(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}
