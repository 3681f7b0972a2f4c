use super::viewport::Viewport;
use crate::git::{
    self, ChangeEntry, ChangeKind, Commit, CommitRange, DataSource, DiffLine, DiffOptions,
    LineType,
};
use anyhow::Result;

/// Semantic class of one piece of a row, used to pick its style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Marker,
    Hash,
    Age,
    Author,
    Branch,
    Tag,
    Ref,
    Subject,
    Kind(ChangeKind),
    Path,
    Counts,
    Diff(LineType),
}

/// One drawn row as styled pieces, left to right
pub type Row = Vec<(Cell, String)>;

/// A data slice shown through a [`Viewport`]
pub trait ListSource {
    fn viewport(&self) -> &Viewport;

    fn viewport_mut(&mut self) -> &mut Viewport;

    /// Pieces of row `index`
    fn row(&self, index: usize) -> Row;

    /// Shown instead of the window when the slice is empty
    fn empty_text(&self) -> &'static str;

    /// Plain text of row `index` exactly as drawn; what search matches against
    fn row_text(&self, index: usize) -> String {
        self.row(index).into_iter().map(|(_, text)| text).collect()
    }
}

// ── Commits ──

/// The commit log. Loaded once at startup and never refreshed.
pub struct CommitList {
    pub commits: Vec<Commit>,
    pub viewport: Viewport,
    now: i64,
}

impl CommitList {
    pub fn new(commits: Vec<Commit>) -> Self {
        CommitList {
            viewport: Viewport::cursor_mode(commits.len()),
            commits,
            now: git::unix_now(),
        }
    }

    /// Range selected by the cursor and the optional mark.
    ///
    /// Without a mark the cursor commit is compared against the working tree.
    /// With one, the older of the two commits (higher index) becomes `start`.
    pub fn range(&self) -> Option<CommitRange> {
        let cursor = self.viewport.cursor()?;
        let at = |i: usize| self.commits[i].hash.clone();

        Some(match self.viewport.marked() {
            None => CommitRange::working_tree(at(cursor)),
            Some(marked) if marked > cursor => CommitRange::between(at(marked), at(cursor)),
            Some(marked) => CommitRange::between(at(cursor), at(marked)),
        })
    }
}

impl ListSource for CommitList {
    fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    fn row(&self, index: usize) -> Row {
        let commit = &self.commits[index];
        let marker = if self.viewport.marked() == Some(index) { "▶ " } else { "  " };

        let mut row = vec![
            (Cell::Marker, marker.to_string()),
            (Cell::Hash, format!("{:<9}", commit.short_hash())),
            (Cell::Age, format!("{:>4} ", git::format_age(commit.timestamp, self.now))),
            (Cell::Author, format!("{:<21}", git::short_author(&commit.author_name))),
        ];
        let decoration = &commit.decoration;
        row.extend(decoration.branches.iter().map(|b| (Cell::Branch, format!("[{}] ", b))));
        row.extend(decoration.tags.iter().map(|t| (Cell::Tag, format!("<{}> ", t))));
        row.extend(decoration.refs.iter().map(|r| (Cell::Ref, format!("{{{}}} ", r))));
        row.push((Cell::Subject, commit.subject.clone()));
        row
    }

    fn empty_text(&self) -> &'static str {
        "No commits"
    }
}

// ── Change summary ──

/// Files changed in the selected range
pub struct ChangeList {
    pub range: Option<CommitRange>,
    pub entries: Vec<ChangeEntry>,
    pub viewport: Viewport,
    /// Last refresh failed; `entries` may be out of date
    pub stale: bool,
    /// Index the open diff's file held before a refresh dropped it
    pub vacated: Option<usize>,
}

impl Default for ChangeList {
    fn default() -> Self {
        ChangeList {
            range: None,
            entries: Vec::new(),
            viewport: Viewport::cursor_mode(0),
            stale: false,
            vacated: None,
        }
    }
}

impl ChangeList {
    pub fn selected(&self) -> Option<&ChangeEntry> {
        self.viewport.cursor().and_then(|i| self.entries.get(i))
    }

    /// Replace the slice with the changes in `range`. Nothing changes on error.
    pub fn load(&mut self, source: &dyn DataSource, range: CommitRange) -> Result<()> {
        let entries = source.fetch_change_summary(&range)?;
        self.viewport.reset(entries.len());
        self.entries = entries;
        self.range = Some(range);
        self.stale = false;
        self.vacated = None;
        Ok(())
    }

    /// Re-fetch the current range and put the cursor back on `follow`, or on
    /// the current selection when `follow` is `None`.
    ///
    /// When a followed path is gone the cursor keeps its index and that index
    /// is recorded in `vacated`. Nothing changes on error.
    pub fn refresh(&mut self, source: &dyn DataSource, follow: Option<&str>) -> Result<()> {
        let Some(range) = &self.range else {
            return Ok(());
        };
        let entries = source.fetch_change_summary(range)?;
        let (path, slot) = match follow {
            Some(path) => (Some(path.to_string()), self.vacated.or(self.viewport.cursor())),
            None => (self.selected().map(|e| e.path.clone()), self.viewport.cursor()),
        };

        self.entries = entries;
        self.stale = false;
        self.vacated = None;
        self.viewport.set_count(self.entries.len());

        let Some(path) = path else {
            return Ok(());
        };
        match self.entries.iter().position(|e| e.path == path) {
            Some(index) => self.viewport.set_cursor(index),
            None if follow.is_some() => {
                self.vacated = slot;
                if let Some(index) = slot {
                    self.viewport.set_cursor(index);
                }
            }
            None => {}
        }
        Ok(())
    }
}

impl ListSource for ChangeList {
    fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    fn row(&self, index: usize) -> Row {
        let entry = &self.entries[index];
        let mut path = entry.path.clone();
        if let Some(old) = &entry.old_path {
            path.push_str(" ← ");
            path.push_str(old);
        }

        let mut row = vec![
            (Cell::Kind(entry.kind), format!("{} ", entry.kind.symbol())),
            (Cell::Path, path),
        ];
        if let (Some(adds), Some(dels)) = (entry.adds, entry.dels) {
            row.push((Cell::Counts, format!("  +{} -{}", adds, dels)));
        }
        row
    }

    fn empty_text(&self) -> &'static str {
        "No changes"
    }
}

// ── Diff ──

/// Patch text for one file of the selected range
pub struct DiffList {
    pub range: Option<CommitRange>,
    pub path: String,
    pub old_path: Option<String>,
    pub options: DiffOptions,
    pub lines: Vec<DiffLine>,
    pub viewport: Viewport,
    /// Last refresh failed; `lines` may be out of date
    pub stale: bool,
}

impl Default for DiffList {
    fn default() -> Self {
        DiffList {
            range: None,
            path: String::new(),
            old_path: None,
            options: DiffOptions::default(),
            lines: Vec::new(),
            viewport: Viewport::scroll_mode(0),
            stale: false,
        }
    }
}

impl DiffList {
    /// Show the diff of `entry` within `range`. Nothing changes on error.
    pub fn load(
        &mut self,
        source: &dyn DataSource,
        range: CommitRange,
        entry: &ChangeEntry,
    ) -> Result<()> {
        let lines = source.fetch_diff(
            &range,
            &entry.path,
            entry.old_path.as_deref(),
            self.options,
        )?;
        self.viewport.reset(lines.len());
        self.lines = lines;
        self.range = Some(range);
        self.path = entry.path.clone();
        self.old_path = entry.old_path.clone();
        self.stale = false;
        Ok(())
    }

    /// Re-fetch with the current range, path and options
    pub fn refresh(&mut self, source: &dyn DataSource) -> Result<()> {
        let Some(range) = &self.range else {
            return Ok(());
        };
        let lines = source.fetch_diff(range, &self.path, self.old_path.as_deref(), self.options)?;
        self.lines = lines;
        self.stale = false;
        self.viewport.set_count(self.lines.len());
        Ok(())
    }

    /// Whether a change to the repo-relative `path` affects this diff
    pub fn depends_on(&self, path: &str) -> bool {
        self.path == path || self.old_path.as_deref() == Some(path)
    }
}

impl ListSource for DiffList {
    fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    fn row(&self, index: usize) -> Row {
        let line = &self.lines[index];
        vec![(Cell::Diff(line.line_type), line.content.clone())]
    }

    fn empty_text(&self) -> &'static str {
        "No differences"
    }
}
