use super::chord::Chord;
use super::lists::{ChangeList, CommitList, DiffList, ListSource};
use super::nav::{NavigationStack, ViewKind};
use crate::config::DxConfig;
use crate::git::DataSource;
use crate::watch::WatchEvent;
use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

/// Whether keys navigate or type into the search prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// How long a notification stays up
const NOTIFICATION_TTL: Duration = Duration::from_secs(2);

// ── Main App State ──

pub struct App {
    /// Drill-down history; the top decides which list receives input
    pub stack: NavigationStack,

    pub commits: CommitList,
    pub changes: ChangeList,
    pub diff: DiffList,

    pub input_mode: InputMode,

    /// Query being typed after `/`
    pub search_input: String,

    /// Query re-run by `n` / `N`
    pub last_query: Option<String>,

    /// Pending first key of a two-key command
    pub chord: Option<Chord>,

    /// Whether a watcher was started for this session
    pub watching: bool,

    /// Set once the watcher finished its initial walk
    pub watcher_ready: bool,

    /// Last failed operation; drawn as a banner until dismissed
    pub error: Option<String>,

    /// Transient message, cleared by `tick` once its deadline passes
    pub notification: Option<String>,
    notification_deadline: Option<Instant>,

    pub should_quit: bool,

    pub config: DxConfig,

    repo_root: PathBuf,
    source: Box<dyn DataSource>,
}

impl App {
    /// Fetch the commit log and start at the commits view.
    /// A failing log is fatal; every later fetch failure becomes a banner.
    pub fn new(source: Box<dyn DataSource>, repo_root: PathBuf, config: DxConfig) -> Result<Self> {
        let commits = source.fetch_log().context("Failed to read commit log")?;
        tracing::info!("loaded {} commits", commits.len());

        let mut diff = DiffList::default();
        diff.options.ignore_whitespace = config.diff.ignore_whitespace;

        Ok(App {
            stack: NavigationStack::default(),
            commits: CommitList::new(commits),
            changes: ChangeList::default(),
            diff,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            last_query: None,
            chord: None,
            watching: false,
            watcher_ready: false,
            error: None,
            notification: None,
            notification_deadline: None,
            should_quit: false,
            config,
            repo_root,
            source,
        })
    }

    pub fn current_view(&self) -> ViewKind {
        self.stack.current()
    }

    /// The list shown on screen
    pub fn current_list(&self) -> &dyn ListSource {
        match self.stack.current() {
            ViewKind::Commits => &self.commits,
            ViewKind::ChangeSummary => &self.changes,
            ViewKind::Diff => &self.diff,
        }
    }

    fn current_list_mut(&mut self) -> &mut dyn ListSource {
        match self.stack.current() {
            ViewKind::Commits => &mut self.commits,
            ViewKind::ChangeSummary => &mut self.changes,
            ViewKind::Diff => &mut self.diff,
        }
    }

    /// Terminal resized. One row is reserved for the status line.
    pub fn resize(&mut self, width: u16, height: u16) {
        let (width, height) = (width as usize, height.saturating_sub(1) as usize);
        self.commits.viewport.set_size(width, height);
        self.changes.viewport.set_size(width, height);
        self.diff.viewport.set_size(width, height);
    }

    // ── Navigation ──

    pub fn toggle_mark(&mut self) {
        self.current_list_mut().viewport_mut().toggle_mark();
    }

    pub fn next_page(&mut self) {
        self.current_list_mut().viewport_mut().next_page();
    }

    pub fn prev_page(&mut self) {
        self.current_list_mut().viewport_mut().prev_page();
    }

    pub fn next_item(&mut self) {
        self.current_list_mut().viewport_mut().next_item();
    }

    pub fn prev_item(&mut self) {
        self.current_list_mut().viewport_mut().prev_item();
    }

    pub fn scroll_to_top(&mut self) {
        self.current_list_mut().viewport_mut().scroll_to_top();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.current_list_mut().viewport_mut().scroll_to_bottom();
    }

    /// Drill into the selection: commits → changed files → diff
    pub fn enter(&mut self) {
        match self.stack.current() {
            ViewKind::Commits => {
                let Some(range) = self.commits.range() else {
                    return;
                };
                match self.changes.load(self.source.as_ref(), range) {
                    Ok(()) => {
                        self.error = None;
                        self.push_view(ViewKind::ChangeSummary);
                    }
                    Err(e) => self.fail(e),
                }
            }
            ViewKind::ChangeSummary => {
                if self.load_selected_diff() {
                    self.push_view(ViewKind::Diff);
                }
            }
            ViewKind::Diff => {}
        }
    }

    fn push_view(&mut self, view: ViewKind) {
        self.stack.push(view);
        tracing::debug!("view {} (depth {})", view.label(), self.stack.depth());
    }

    /// Pop one view, or quit from the commits view
    pub fn back(&mut self) {
        if !self.stack.pop() {
            self.should_quit = true;
        }
    }

    /// Show the diff of the next changed file without leaving the diff view
    pub fn next_file(&mut self) {
        self.step_file(Direction::Forward);
    }

    pub fn prev_file(&mut self) {
        self.step_file(Direction::Backward);
    }

    fn step_file(&mut self, direction: Direction) {
        match self.stack.current() {
            ViewKind::Commits => {}
            ViewKind::ChangeSummary => match direction {
                Direction::Forward => self.changes.viewport.next_item(),
                Direction::Backward => self.changes.viewport.prev_item(),
            },
            ViewKind::Diff => {
                let Some(target) = self.lateral_target(direction) else {
                    return;
                };
                let before = self.changes.viewport.cursor();
                self.changes.viewport.set_cursor(target);
                if !self.load_selected_diff() {
                    if let Some(index) = before {
                        self.changes.viewport.set_cursor(index);
                    }
                }
            }
        }
    }

    /// Summary index a lateral move from the diff view lands on.
    /// If the open file dropped out of the summary, its old slot is the origin.
    fn lateral_target(&self, direction: Direction) -> Option<usize> {
        let changes = &self.changes;
        let target = match (changes.vacated, direction) {
            (Some(slot), Direction::Forward) => slot,
            (None, Direction::Forward) => changes.viewport.cursor()? + 1,
            (slot, Direction::Backward) => slot.or(changes.viewport.cursor())?.checked_sub(1)?,
        };
        (target < changes.viewport.count()).then_some(target)
    }

    /// Load the diff of the change under the summary cursor. Returns success.
    fn load_selected_diff(&mut self) -> bool {
        let (Some(range), Some(entry)) = (self.changes.range.clone(), self.changes.selected())
        else {
            return false;
        };
        let entry = entry.clone();
        match self.diff.load(self.source.as_ref(), range, &entry) {
            Ok(()) => {
                self.error = None;
                self.changes.vacated = None;
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Flip whitespace-insensitive diffing and re-fetch an open diff
    pub fn toggle_whitespace(&mut self) {
        self.diff.options.ignore_whitespace = !self.diff.options.ignore_whitespace;

        if self.stack.contains(ViewKind::Diff) {
            if let Err(e) = self.diff.refresh(self.source.as_ref()) {
                self.diff.options.ignore_whitespace = !self.diff.options.ignore_whitespace;
                self.fail(e);
                return;
            }
        }

        if self.diff.options.ignore_whitespace {
            self.notify("Ignoring whitespace");
        } else {
            self.notify("Showing whitespace");
        }
    }

    // ── Search ──

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
        self.search_input.clear();
    }

    pub fn cancel_search(&mut self) {
        self.input_mode = InputMode::Normal;
        self.search_input.clear();
    }

    /// Run the typed query forward from the current position
    pub fn confirm_search(&mut self) {
        self.input_mode = InputMode::Normal;
        let query = std::mem::take(&mut self.search_input);
        if query.is_empty() {
            return;
        }
        self.last_query = Some(query);
        self.search(Direction::Forward);
    }

    pub fn search_next(&mut self) {
        self.search(Direction::Forward);
    }

    pub fn search_prev(&mut self) {
        self.search(Direction::Backward);
    }

    fn search(&mut self, direction: Direction) {
        let Some(query) = self.last_query.clone() else {
            return;
        };
        let list = self.current_list_mut();
        let mut viewport = list.viewport().clone();
        let found = match direction {
            Direction::Forward => viewport.find_next(&query, |i| list.row_text(i)),
            Direction::Backward => viewport.find_prev(&query, |i| list.row_text(i)),
        };
        *list.viewport_mut() = viewport;

        if !found {
            self.notify(&format!("Pattern not found: {}", query));
        }
    }

    // ── Chords ──

    /// `g`: arm the chord, or complete `g g` by jumping to the top
    pub fn press_g(&mut self, now: Instant) {
        if self.take_chord(now) == Some('g') {
            self.scroll_to_top();
        } else {
            self.chord = Some(Chord::new('g', now, self.config.keys.chord_timeout()));
        }
    }

    /// `G`: bottom, or top when a `g` is still pending
    pub fn jump_to_end(&mut self, now: Instant) {
        if self.take_chord(now) == Some('g') {
            self.scroll_to_top();
        } else {
            self.scroll_to_bottom();
        }
    }

    pub fn cancel_chord(&mut self) {
        self.chord = None;
    }

    fn take_chord(&mut self, now: Instant) -> Option<char> {
        self.chord.take().filter(|c| c.is_live(now)).map(|c| c.key)
    }

    /// Chord key to show in the status line, if still pending
    pub fn active_chord(&self, now: Instant) -> Option<char> {
        self.chord.filter(|c| c.is_live(now)).map(|c| c.key)
    }

    // ── Watcher ──

    pub fn on_watch(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::Ready { dirs } => {
                self.watcher_ready = true;
                self.notify(&format!("Watching {} directories", dirs));
            }
            WatchEvent::Changed { kind, path } => {
                let Some(rel) = self.repo_relative(&path) else {
                    return;
                };
                tracing::debug!("{:?} {}", kind, rel);
                self.refresh_for(&rel);
            }
            WatchEvent::Failed(message) => {
                tracing::warn!("watcher failed: {}", message);
                self.error = Some(format!("Watcher: {}", message));
            }
        }
    }

    /// Re-fetch whatever open view depends on `path`.
    /// A view whose re-fetch fails keeps its rows and is flagged stale.
    fn refresh_for(&mut self, path: &str) {
        if self.stack.contains(ViewKind::ChangeSummary)
            && self.changes.range.as_ref().is_some_and(|r| r.is_open())
        {
            // an open diff pins the summary cursor to its file
            let follow = self
                .stack
                .contains(ViewKind::Diff)
                .then(|| self.diff.path.clone());
            if let Err(e) = self.changes.refresh(self.source.as_ref(), follow.as_deref()) {
                self.changes.stale = true;
                self.fail(e);
            }
        }

        if self.stack.contains(ViewKind::Diff)
            && self.diff.range.as_ref().is_some_and(|r| r.is_open())
            && self.diff.depends_on(path)
        {
            if let Err(e) = self.diff.refresh(self.source.as_ref()) {
                self.diff.stale = true;
                self.fail(e);
            }
        }
    }

    /// `path` relative to the repository root, `/`-separated like git prints it
    fn repo_relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.repo_root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    // ── Status ──

    /// Range of the current view, plus the file path in the diff view.
    /// Rows kept after a failed refresh are flagged with `(stale)`.
    pub fn status_left(&self) -> String {
        let text = match self.stack.current() {
            ViewKind::Commits => self.commits.range().map(|r| r.label()).unwrap_or_default(),
            ViewKind::ChangeSummary => {
                self.changes.range.as_ref().map(|r| r.label()).unwrap_or_default()
            }
            ViewKind::Diff => {
                let label = self.diff.range.as_ref().map(|r| r.label()).unwrap_or_default();
                format!("{}: {}", label, self.diff.path)
            }
        };
        if self.is_stale() {
            format!("{} (stale)", text)
        } else {
            text
        }
    }

    /// Whether the current view shows rows a failed refresh could not replace
    pub fn is_stale(&self) -> bool {
        match self.stack.current() {
            ViewKind::Commits => false,
            ViewKind::ChangeSummary => self.changes.stale,
            ViewKind::Diff => self.diff.stale,
        }
    }

    /// `position/last` of the current list
    pub fn status_position(&self) -> String {
        let viewport = self.current_list().viewport();
        match viewport.position() {
            Some(pos) => format!("{}/{}", pos, viewport.count().saturating_sub(1)),
            None => "0/0".to_string(),
        }
    }

    // ── Errors & Notifications ──

    fn fail(&mut self, error: anyhow::Error) {
        tracing::warn!("{:#}", error);
        self.error = Some(format!("{:#}", error));
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn notify(&mut self, msg: &str) {
        self.notification = Some(msg.to_string());
        self.notification_deadline = Some(Instant::now() + NOTIFICATION_TTL);
    }

    /// Called once per event loop iteration to expire notifications
    pub fn tick(&mut self, now: Instant) {
        if self.notification_deadline.is_some_and(|deadline| now >= deadline) {
            self.notification = None;
            self.notification_deadline = None;
        }
    }
}
