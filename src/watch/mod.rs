use anyhow::Result;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

/// What happened to a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Modify,
    Add,
    Remove,
}

/// Notifications posted to the UI loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Initial walk finished; sent once, before any `Changed`
    Ready { dirs: usize },
    /// A non-excluded path changed. `path` is absolute.
    Changed { kind: ChangeType, path: PathBuf },
    /// The OS event source reported an error
    Failed(String),
}

/// Something that can watch a single directory, non-recursively
pub trait DirSubscriber {
    fn subscribe(&mut self, dir: &Path) -> notify::Result<()>;
}

impl DirSubscriber for RecommendedWatcher {
    fn subscribe(&mut self, dir: &Path) -> notify::Result<()> {
        self.watch(dir, RecursiveMode::NonRecursive)
    }
}

enum Msg {
    Raw(notify::Result<Event>),
    Stop,
}

/// Background watcher over a working tree.
///
/// Every directory is subscribed individually so excluded subtrees
/// (build output, the git dir) never cost an OS watch handle.
pub struct ChangeWatcher {
    control: Sender<Msg>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ChangeWatcher {
    /// Start the watcher thread. Notifications arrive on `tx`.
    pub fn spawn<F>(
        root: PathBuf,
        git_dir: PathBuf,
        is_excluded: F,
        tx: Sender<WatchEvent>,
    ) -> Result<Self>
    where
        F: Fn(&Path) -> bool + Send + 'static,
    {
        let (control, rx) = mpsc::channel::<Msg>();
        let raw_tx = control.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("change-watcher".into())
            .spawn(move || {
                let watcher = RecommendedWatcher::new(
                    move |res: notify::Result<Event>| {
                        let _ = raw_tx.send(Msg::Raw(res));
                    },
                    Config::default(),
                );
                let mut watcher = match watcher {
                    Ok(w) => w,
                    Err(e) => {
                        tracing::error!("could not start watcher: {}", e);
                        let _ = tx.send(WatchEvent::Failed(e.to_string()));
                        return;
                    }
                };
                let state = WatchLoop {
                    root,
                    git_dir,
                    is_excluded,
                    tx,
                };
                state.run(&mut watcher, rx, &thread_stop);
            })?;

        Ok(ChangeWatcher {
            control,
            stop,
            handle: Some(handle),
        })
    }

    /// Stop the event loop and wait for the thread, releasing all OS watches
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.store(true, Ordering::Relaxed);
        let _ = self.control.send(Msg::Stop);
        if handle.join().is_err() {
            tracing::warn!("watcher thread panicked");
        }
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Map a raw event kind to a change. `index` is the path's position in the
/// event, which matters only for two-path renames (`from`, `to`).
pub fn classify(kind: &EventKind, index: usize) -> Option<ChangeType> {
    match kind {
        EventKind::Create(_) => Some(ChangeType::Add),
        EventKind::Remove(_) => Some(ChangeType::Remove),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(ChangeType::Remove),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeType::Add),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            Some(if index == 0 { ChangeType::Remove } else { ChangeType::Add })
        }
        EventKind::Modify(_) => Some(ChangeType::Modify),
        _ => None,
    }
}

struct WatchLoop<F> {
    root: PathBuf,
    git_dir: PathBuf,
    is_excluded: F,
    tx: Sender<WatchEvent>,
}

impl<F: Fn(&Path) -> bool> WatchLoop<F> {
    fn run(&self, sub: &mut dyn DirSubscriber, rx: Receiver<Msg>, stop: &AtomicBool) {
        tracing::debug!("walking {}", self.root.display());
        let dirs = self.walk(sub, &self.root, stop);
        if stop.load(Ordering::Relaxed) || self.tx.send(WatchEvent::Ready { dirs }).is_err() {
            return;
        }
        tracing::info!("watching {} directories under {}", dirs, self.root.display());

        // Events raised during the walk were queued and are only handled now
        for msg in rx {
            match msg {
                Msg::Stop => break,
                Msg::Raw(Ok(event)) => {
                    if !self.handle(sub, event, stop) {
                        break;
                    }
                }
                Msg::Raw(Err(e)) => {
                    tracing::warn!("watch error: {}", e);
                    if self.tx.send(WatchEvent::Failed(e.to_string())).is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("watcher stopped");
    }

    fn skip(&self, path: &Path) -> bool {
        path.starts_with(&self.git_dir)
            || path.file_name().is_some_and(|n| n == ".git")
            || (self.is_excluded)(path)
    }

    /// Subscribe `dir` and every non-excluded directory below it.
    /// Returns how many directories were subscribed.
    fn walk(&self, sub: &mut dyn DirSubscriber, dir: &Path, stop: &AtomicBool) -> usize {
        if stop.load(Ordering::Relaxed) {
            return 0;
        }
        if let Err(e) = sub.subscribe(dir) {
            tracing::warn!("cannot watch {}: {}", dir.display(), e);
            return 0;
        }
        let mut count = 1;
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("cannot read {}: {}", dir.display(), e);
                return count;
            }
        };
        for entry in entries.flatten() {
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            if !is_dir {
                continue;
            }
            let path = entry.path();
            if !self.skip(&path) {
                count += self.walk(sub, &path, stop);
            }
        }
        count
    }

    /// Forward one raw event. Returns `false` once the receiver is gone.
    fn handle(&self, sub: &mut dyn DirSubscriber, event: Event, stop: &AtomicBool) -> bool {
        for (index, path) in event.paths.iter().enumerate() {
            if self.skip(path) {
                continue;
            }
            let Some(kind) = classify(&event.kind, index) else {
                continue;
            };
            if kind == ChangeType::Add && path.is_dir() {
                self.walk(sub, path, stop);
            }
            let changed = WatchEvent::Changed {
                kind,
                path: path.clone(),
            };
            if self.tx.send(changed).is_err() {
                return false;
            }
        }
        true
    }
}
