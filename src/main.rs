mod app;
mod config;
mod git;
mod ui;
mod watch;

use anyhow::{Context, Result};
use app::{App, InputMode};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use git::{DataSource, GitCli};
use ratatui::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use watch::{ChangeWatcher, WatchEvent};

/// Browse git history: pick a commit range, see the changed files, read the diffs
#[derive(Parser)]
#[command(name = "diff-explore", version, about)]
struct Cli {
    /// Repository path (defaults to the current directory)
    path: Option<PathBuf>,

    /// Do not watch the working tree for changes
    #[arg(long)]
    no_watch: bool,

    /// Start with whitespace-only changes hidden
    #[arg(long)]
    ignore_whitespace: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    if let Some(ref path) = cli.path {
        std::env::set_current_dir(path)
            .with_context(|| format!("Cannot open {}", path.display()))?;
    }

    let repo_root = git::get_repo_root().context("Not a git repository")?;
    let repo_root = repo_root.canonicalize().unwrap_or(repo_root);
    let git_dir = git::get_git_dir(&repo_root)?;

    let mut config = config::load_config(&repo_root);
    if cli.ignore_whitespace {
        config.diff.ignore_whitespace = true;
    }
    let watch_enabled = config.watch.enabled && !cli.no_watch;

    let source = GitCli::new(
        repo_root.clone(),
        config.diff.rename_threshold,
        config.diff.tab_width,
    );
    let mut app = App::new(Box::new(source.clone()), repo_root.clone(), config)?;
    tracing::info!("opened {}", repo_root.display());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (watch_tx, watch_rx) = mpsc::channel::<WatchEvent>();
    let mut watcher = if watch_enabled {
        let excluded = move |path: &Path| source.is_excluded(path);
        match ChangeWatcher::spawn(repo_root, git_dir, excluded, watch_tx) {
            Ok(w) => {
                app.watching = true;
                Some(w)
            }
            Err(e) => {
                tracing::warn!("watcher not started: {:#}", e);
                app.error = Some(format!("Watcher: {:#}", e));
                None
            }
        }
    } else {
        None
    };

    // Run event loop
    let result = run_app(&mut terminal, &mut app, &watch_rx);

    if let Some(ref mut w) = watcher {
        w.shutdown();
    }

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Log to the file named by `DIFF_EXPLORE_LOG`; the TUI owns the terminal.
/// Level comes from `RUST_LOG`, default `info`.
fn init_tracing() -> Result<()> {
    use std::sync::Mutex;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let Some(log_path) = std::env::var_os("DIFF_EXPLORE_LOG") else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Cannot open log file {}", Path::new(&log_path).display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .try_init()?;
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    watch_rx: &mpsc::Receiver<WatchEvent>,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let size = terminal.size()?;
    app.resize(size.width, size.height);

    loop {
        // Draw
        let now = Instant::now();
        terminal.draw(|f| ui::draw(f, app, now))?;

        // Poll for events with a timeout (lets us process watch events too)
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(app, key, Instant::now())
                }
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        // Drain watcher notifications; identical back-to-back events refresh once
        let mut pending: Vec<WatchEvent> = watch_rx.try_iter().collect();
        pending.dedup();
        for event in pending {
            app.on_watch(event);
        }

        // Expire notifications
        app.tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent, now: Instant) {
    match app.input_mode {
        InputMode::Search => handle_search_input(app, key),
        InputMode::Normal => handle_normal_input(app, key, now),
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent, now: Instant) {
    app.dismiss_error();
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if !matches!(key.code, KeyCode::Char('g') | KeyCode::Char('G')) || ctrl {
        app.cancel_chord();
    }

    match key.code {
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Char('f') if ctrl => app.next_page(),
        KeyCode::Char('b') | KeyCode::Char('u') if ctrl => app.prev_page(),
        _ if ctrl => {}

        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char(' ') => app.toggle_mark(),

        KeyCode::PageDown => app.next_page(),
        KeyCode::PageUp => app.prev_page(),
        KeyCode::Char('j') | KeyCode::Down => app.next_item(),
        KeyCode::Char('k') | KeyCode::Up => app.prev_item(),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.scroll_to_bottom(),
        KeyCode::Char('g') => app.press_g(now),
        KeyCode::Char('G') => app.jump_to_end(now),

        KeyCode::Enter | KeyCode::Char('l') => app.enter(),
        KeyCode::Esc | KeyCode::Char('h') => app.back(),
        KeyCode::Char(']') => app.next_file(),
        KeyCode::Char('[') => app.prev_file(),

        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('n') => app.search_next(),
        KeyCode::Char('N') => app.search_prev(),

        KeyCode::Char('w') => app.toggle_whitespace(),
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }
    match key.code {
        KeyCode::Enter => app.confirm_search(),
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => app.search_input.push(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DxConfig;
    use crate::git::{
        ChangeEntry, ChangeKind, Commit, CommitRange, Decoration, DiffLine, DiffOptions,
    };

    struct StubSource;

    impl DataSource for StubSource {
        fn fetch_log(&self) -> Result<Vec<Commit>> {
            Ok((0..40)
                .map(|i| Commit {
                    hash: format!("c{:02}", i),
                    decoration: Decoration::default(),
                    author_name: "Ada".to_string(),
                    author_email: "ada@example.com".to_string(),
                    timestamp: 0,
                    subject: format!("subject {}", i),
                })
                .collect())
        }

        fn fetch_change_summary(&self, _range: &CommitRange) -> Result<Vec<ChangeEntry>> {
            Ok(["src/a.rs", "src/b.rs"]
                .iter()
                .map(|path| ChangeEntry {
                    kind: ChangeKind::Modified,
                    path: path.to_string(),
                    old_path: None,
                    adds: Some(1),
                    dels: Some(0),
                })
                .collect())
        }

        fn fetch_diff(
            &self,
            _range: &CommitRange,
            path: &str,
            _old_path: Option<&str>,
            _options: DiffOptions,
        ) -> Result<Vec<DiffLine>> {
            Ok(vec![DiffLine::new(format!("+{}", path))])
        }

        fn is_excluded(&self, _path: &Path) -> bool {
            false
        }
    }

    fn make_app() -> App {
        let mut app = App::new(Box::new(StubSource), PathBuf::from("/repo"), DxConfig::default())
            .unwrap();
        app.resize(80, 11);
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn press(app: &mut App, keys: &[KeyEvent]) {
        let now = Instant::now();
        for &k in keys {
            handle_key(app, k, now);
        }
    }

    fn typed(text: &str) -> Vec<KeyEvent> {
        text.chars().map(|c| key(KeyCode::Char(c))).collect()
    }

    fn cursor(app: &App) -> Option<usize> {
        app.current_list().viewport().cursor()
    }

    // ── Chords ──

    #[test]
    fn g_g_goes_to_top() {
        let mut app = make_app();
        press(&mut app, &typed("jjjgg"));
        assert_eq!(cursor(&app), Some(0));
        assert!(app.chord.is_none());
    }

    #[test]
    fn other_key_between_g_and_capital_g_cancels_chord() {
        let mut app = make_app();
        press(&mut app, &typed("gjG"));
        assert_eq!(cursor(&app), Some(39));
    }

    #[test]
    fn capital_g_after_g_goes_to_top() {
        let mut app = make_app();
        press(&mut app, &[key(KeyCode::End)]);
        press(&mut app, &typed("gG"));
        assert_eq!(cursor(&app), Some(0));
    }

    #[test]
    fn ctrl_key_cancels_pending_g() {
        let mut app = make_app();
        press(&mut app, &[key(KeyCode::Char('g')), ctrl('f')]);
        assert!(app.chord.is_none());
        press(&mut app, &typed("G"));
        assert_eq!(cursor(&app), Some(39));
    }

    // ── Normal mode ──

    #[test]
    fn ctrl_keys_page_and_quit() {
        let mut app = make_app();
        press(&mut app, &[ctrl('f')]);
        assert_eq!(cursor(&app), Some(10));
        press(&mut app, &[ctrl('b')]);
        assert_eq!(cursor(&app), Some(0));
        press(&mut app, &[key(KeyCode::PageDown), ctrl('u')]);
        assert_eq!(cursor(&app), Some(0));

        press(&mut app, &[ctrl('j')]);
        assert_eq!(cursor(&app), Some(0));
        assert!(!app.should_quit);

        press(&mut app, &[ctrl('c')]);
        assert!(app.should_quit);
    }

    #[test]
    fn drill_in_and_back_keys() {
        let mut app = make_app();
        press(&mut app, &[key(KeyCode::Enter)]);
        assert_eq!(app.stack.depth(), 2);

        press(&mut app, &typed("]l"));
        assert_eq!(app.stack.depth(), 3);
        assert_eq!(app.diff.path, "src/b.rs");

        press(&mut app, &typed("["));
        assert_eq!(app.diff.path, "src/a.rs");

        press(&mut app, &[key(KeyCode::Char('h')), key(KeyCode::Esc)]);
        assert_eq!(app.stack.depth(), 1);
        assert!(!app.should_quit);
        press(&mut app, &[key(KeyCode::Esc)]);
        assert!(app.should_quit);
    }

    #[test]
    fn space_marks_and_w_toggles_whitespace() {
        let mut app = make_app();
        press(&mut app, &typed(" w"));
        assert_eq!(app.commits.viewport.marked(), Some(0));
        assert!(app.diff.options.ignore_whitespace);
    }

    #[test]
    fn any_key_dismisses_error() {
        let mut app = make_app();
        app.error = Some("boom".to_string());
        press(&mut app, &typed("j"));
        assert!(app.error.is_none());
        assert_eq!(cursor(&app), Some(1));
    }

    // ── Search mode ──

    #[test]
    fn search_prompt_takes_typed_keys() {
        let mut app = make_app();
        press(&mut app, &typed("/subject 3q"));
        assert_eq!(app.input_mode, InputMode::Search);
        assert!(!app.should_quit);
        assert_eq!(app.search_input, "subject 3q");

        press(&mut app, &[key(KeyCode::Backspace), key(KeyCode::Enter)]);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(cursor(&app), Some(3));

        press(&mut app, &typed("n"));
        assert_eq!(cursor(&app), Some(30));
        press(&mut app, &typed("N"));
        assert_eq!(cursor(&app), Some(3));
    }

    #[test]
    fn esc_leaves_search_without_moving() {
        let mut app = make_app();
        press(&mut app, &typed("/subject 5"));
        press(&mut app, &[key(KeyCode::Esc)]);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(cursor(&app), Some(0));
        assert!(app.last_query.is_none());
    }

    #[test]
    fn ctrl_c_quits_from_search() {
        let mut app = make_app();
        press(&mut app, &typed("/abc"));
        press(&mut app, &[ctrl('c')]);
        assert!(app.should_quit);
    }
}
