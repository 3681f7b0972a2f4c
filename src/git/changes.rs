use std::collections::HashMap;

/// Kind of change a file underwent within a commit range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
    Renamed,
}

impl ChangeKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ChangeKind::Added => "A",
            ChangeKind::Deleted => "D",
            ChangeKind::Modified => "M",
            ChangeKind::Renamed => "R",
        }
    }

    /// Map a `--name-status` letter (`A`, `D`, `M`, `R100`, `T`, ...) to a kind.
    /// Copies are reported as additions; anything unknown is a modification.
    fn from_status(status: &str) -> Self {
        match status.chars().next() {
            Some('A') | Some('C') => ChangeKind::Added,
            Some('D') => ChangeKind::Deleted,
            Some('R') => ChangeKind::Renamed,
            _ => ChangeKind::Modified,
        }
    }
}

/// One changed file in a change summary
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEntry {
    pub kind: ChangeKind,
    pub path: String,
    /// Previous path, only for renames
    pub old_path: Option<String>,
    pub adds: Option<usize>,
    pub dels: Option<usize>,
}

/// Parse `git diff --name-status -z` output.
///
/// Records are NUL separated: `STATUS\0PATH\0`, or `STATUS\0OLD\0NEW\0` for
/// renames and copies.
pub fn parse_name_status(raw: &str) -> Vec<ChangeEntry> {
    let mut entries = Vec::new();
    let mut tokens = raw.split('\0').filter(|t| !t.is_empty());

    while let Some(status) = tokens.next() {
        let status = status.trim();
        let kind = ChangeKind::from_status(status);
        let two_paths = matches!(status.chars().next(), Some('R') | Some('C'));

        let Some(first) = tokens.next() else { break };
        let (path, old_path) = if two_paths {
            let Some(second) = tokens.next() else { break };
            let old = (kind == ChangeKind::Renamed).then(|| first.to_string());
            (second.to_string(), old)
        } else {
            (first.to_string(), None)
        };

        entries.push(ChangeEntry {
            kind,
            path,
            old_path,
            adds: None,
            dels: None,
        });
    }

    entries
}

/// Parse `git diff --numstat -z` output into `path -> (adds, dels)`.
///
/// Binary files report `-` for both counts and map to `None`. Renames are
/// written as `A\tD\t\0OLD\0NEW\0` and are keyed by the new path.
pub fn parse_numstat(raw: &str) -> HashMap<String, (Option<usize>, Option<usize>)> {
    let mut stats = HashMap::new();
    let mut tokens = raw.split('\0');

    while let Some(record) = tokens.next() {
        let record = record.trim_start_matches('\n');
        if record.is_empty() {
            continue;
        }
        let mut fields = record.splitn(3, '\t');
        let (Some(adds), Some(dels)) = (fields.next(), fields.next()) else {
            continue;
        };
        let adds = adds.trim().parse().ok();
        let dels = dels.trim().parse().ok();

        let path = match fields.next() {
            Some(path) if !path.is_empty() => path.to_string(),
            _ => {
                // rename: old and new path follow as separate tokens
                let _old = tokens.next();
                match tokens.next() {
                    Some(new) => new.to_string(),
                    None => break,
                }
            }
        };
        stats.insert(path, (adds, dels));
    }

    stats
}

/// Attach numstat counts to name-status entries
pub fn merge_counts(
    mut entries: Vec<ChangeEntry>,
    counts: &HashMap<String, (Option<usize>, Option<usize>)>,
) -> Vec<ChangeEntry> {
    for entry in &mut entries {
        if let Some((adds, dels)) = counts.get(&entry.path) {
            entry.adds = *adds;
            entry.dels = *dels;
        }
    }
    entries
}
