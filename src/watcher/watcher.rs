//! File system watcher using notify-rs.
//!
//! One background thread multiplexes raw tree notifications, config-file
//! notifications, the termination signal and the debounce deadline.
//! Debounced changes are reloaded from disk and handed to the callback.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use crossbeam_channel::{at, bounded, never, select, unbounded, Receiver, Sender};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use walkdir::WalkDir;

use super::debouncer::Debouncer;
use super::events::{changes, EventLedger, EventType};
use super::filter::PathFilter;
use super::paths::{path_to_project, ProjectPaths};
use crate::asset::{load_asset, Asset};
use crate::error::WatcherError;
use crate::Result;

/// Debounce duration for file events.
pub const DEBOUNCE_DURATION: Duration = Duration::from_millis(500);

type RawEvent = notify::Result<Event>;

/// Receives each debounced change.
pub type Callback<C> = Box<dyn Fn(&C, Asset, EventType) + Send>;

/// Context handed back to the callback, identifying the watched project.
pub trait ProjectClient: Send + 'static {
    /// Root directory of the project.
    fn directory(&self) -> &Path;
}

/// A project identified only by its directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalProject {
    directory: PathBuf,
}

impl LocalProject {
    /// Create a project rooted at `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl ProjectClient for LocalProject {
    fn directory(&self) -> &Path {
        &self.directory
    }
}

/// File watcher configuration.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce duration.
    pub debounce: Duration,
    /// Sentinel file touched after the first dispatched change.
    pub notify_file: Option<PathBuf>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: DEBOUNCE_DURATION,
            notify_file: None,
        }
    }
}

/// State shared between the watcher handle and its event loop.
struct Shared {
    watching: AtomicBool,
    done: Mutex<Option<Sender<()>>>,
    tree_watcher: Mutex<Option<RecommendedWatcher>>,
    config_watcher: Mutex<Option<RecommendedWatcher>>,
    config_tx: Sender<RawEvent>,
    reload_tx: Mutex<Option<Sender<()>>>,
    ledger: EventLedger,
}

impl Shared {
    fn new(config_tx: Sender<RawEvent>, done: Sender<()>) -> Self {
        Self {
            watching: AtomicBool::new(true),
            done: Mutex::new(Some(done)),
            tree_watcher: Mutex::new(None),
            config_watcher: Mutex::new(None),
            config_tx,
            reload_tx: Mutex::new(None),
            ledger: EventLedger::new(),
        }
    }

    fn is_watching(&self) -> bool {
        self.watching.load(Ordering::Acquire)
    }

    /// Close the termination channel and release notification handles.
    fn terminate(&self) {
        let was_watching = self.watching.swap(false, Ordering::AcqRel);

        let done = self.done.lock().take();
        drop(done);
        let tree = self.tree_watcher.lock().take();
        drop(tree);
        let config = self.config_watcher.lock().take();
        drop(config);

        if was_watching {
            tracing::info!("Stopped watching");
        }
    }

    /// Emit the single reload value, if a reload channel was registered.
    fn signal_reload(&self) {
        let reload = self.reload_tx.lock().take();
        if let Some(tx) = reload {
            if tx.send(()).is_err() {
                tracing::warn!("Reload channel closed before config change was delivered");
            }
        }
    }
}

/// Watches a project tree and, optionally, one configuration file.
pub struct FileWatcher {
    shared: Arc<Shared>,
    root: PathBuf,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl FileWatcher {
    /// Register watches on the project tree and start the event loop.
    ///
    /// Every directory under the client's root that `filter` does not
    /// exclude is watched; symlinked directories are registered by their
    /// real location.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a directory, a watch cannot be
    /// registered, or the event loop thread cannot be spawned.
    pub fn new<C, F>(
        client: C,
        config: &WatcherConfig,
        filter: PathFilter,
        callback: F,
    ) -> Result<Self>
    where
        C: ProjectClient,
        F: Fn(&C, Asset, EventType) + Send + 'static,
    {
        let root = client.directory().to_path_buf();

        let (tree_tx, tree_rx) = unbounded();
        let mut watcher = notify::recommended_watcher(move |res: RawEvent| {
            let _ = tree_tx.send(res);
        })
        .map_err(|e| WatcherError::setup(&root, e))?;
        let paths = register_tree(&mut watcher, &root, &filter)?;

        let (config_tx, config_rx) = unbounded();
        let (done_tx, done_rx) = bounded(0);
        let shared = Arc::new(Shared::new(config_tx, done_tx));
        *shared.tree_watcher.lock() = Some(watcher);

        let event_loop = EventLoop::new(
            client,
            paths,
            filter,
            Box::new(callback),
            config,
            Arc::clone(&shared),
        );
        let handle = event_loop.spawn(tree_rx, config_rx, done_rx)?;

        tracing::info!(path = %root.display(), "Watching project");

        Ok(Self {
            shared,
            root,
            event_loop: Mutex::new(Some(handle)),
        })
    }

    /// Watch a configuration file; a write to it sends one value on
    /// `reload` and stops the watcher.
    ///
    /// `reload` should be buffered or actively received; the event loop
    /// blocks until the value is delivered.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or cannot be watched.
    pub fn watch_config(&self, path: impl AsRef<Path>, reload: Sender<()>) -> Result<()> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(WatcherError::setup(path, "file does not exist").into());
        }
        if !self.is_watching() {
            return Err(WatcherError::setup(path, "watcher is stopped").into());
        }

        let tx = self.shared.config_tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: RawEvent| {
            let _ = tx.send(res);
        })
        .map_err(|e| WatcherError::setup(path, e))?;
        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::setup(path, e))?;

        *self.shared.reload_tx.lock() = Some(reload);
        *self.shared.config_watcher.lock() = Some(watcher);

        tracing::info!(path = %path.display(), "Watching config file");
        Ok(())
    }

    /// Whether the watcher is still running.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.shared.is_watching()
    }

    /// Stop watching. Safe to call more than once.
    ///
    /// A dispatch already in progress is allowed to finish.
    pub fn stop_watching(&self) {
        self.shared.terminate();
    }

    /// Number of distinct paths with changes not yet dispatched.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.shared.ledger.count()
    }

    /// Root directory of the watched project.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wait for the event loop to exit.
    ///
    /// Returns once the watcher has been stopped, either explicitly or by
    /// a config-file change.
    pub fn join(&self) {
        let handle = self.event_loop.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("File watcher event loop panicked");
            }
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.shared.terminate();
    }
}

/// Outcome of one wait in the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Stop,
}

/// Loop-side state, owned by the watcher thread.
struct EventLoop<C> {
    client: C,
    paths: ProjectPaths,
    filter: PathFilter,
    callback: Callback<C>,
    notify_file: Option<PathBuf>,
    wait_notify: bool,
    debouncer: Debouncer,
    shared: Arc<Shared>,
}

impl<C: ProjectClient> EventLoop<C> {
    fn new(
        client: C,
        paths: ProjectPaths,
        filter: PathFilter,
        callback: Callback<C>,
        config: &WatcherConfig,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            client,
            paths,
            filter,
            callback,
            notify_file: config.notify_file.clone(),
            wait_notify: config.notify_file.is_some(),
            debouncer: Debouncer::new(config.debounce),
            shared,
        }
    }

    fn spawn(
        self,
        tree_rx: Receiver<RawEvent>,
        config_rx: Receiver<RawEvent>,
        done_rx: Receiver<()>,
    ) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("file-watcher".to_string())
            .spawn(move || self.run(&tree_rx, &config_rx, &done_rx))
            .map_err(|e| WatcherError::EventLoop(e.to_string()).into())
    }

    fn run(
        mut self,
        tree_rx: &Receiver<RawEvent>,
        config_rx: &Receiver<RawEvent>,
        done_rx: &Receiver<()>,
    ) {
        tracing::debug!(root = %self.paths.root().display(), "Event loop started");

        while self.shared.is_watching() {
            let deadline = self.debouncer.next_deadline().map_or_else(never, at);

            let step = select! {
                recv(done_rx) -> _ => Step::Stop,
                recv(tree_rx) -> msg => match msg {
                    Ok(Ok(event)) => {
                        self.on_event(&event);
                        Step::Continue
                    }
                    Ok(Err(e)) => {
                        tracing::error!("Watch error: {:?}", e);
                        Step::Continue
                    }
                    Err(_) => Step::Stop,
                },
                recv(config_rx) -> msg => match msg {
                    Ok(Ok(event)) if is_config_write(&event) => {
                        self.on_reload();
                        Step::Stop
                    }
                    Ok(Ok(_)) => Step::Continue,
                    Ok(Err(e)) => {
                        tracing::error!("Config watch error: {:?}", e);
                        Step::Continue
                    }
                    Err(_) => Step::Stop,
                },
                recv(deadline) -> _ => {
                    self.flush_ready();
                    Step::Continue
                }
            };

            if step == Step::Stop {
                break;
            }
        }

        tracing::debug!(root = %self.paths.root().display(), "Event loop stopped");
    }

    /// Record a raw notification and schedule its paths for dispatch.
    fn on_event(&mut self, event: &Event) {
        for (path, kind) in changes(event) {
            let logical = self.paths.logical_path(&path);
            let key = path_to_project(self.paths.root(), &logical);

            if key.is_empty() || self.filter.ignore(&key) {
                tracing::trace!(key = %key, "Ignoring filtered event");
                continue;
            }

            self.shared.ledger.record(logical.clone());
            self.debouncer.record(logical, kind);
        }
    }

    /// Dispatch every path whose debounce window has elapsed.
    fn flush_ready(&mut self) {
        for (path, kind) in self.debouncer.take_ready() {
            if !self.shared.is_watching() {
                return;
            }
            let events = self.shared.ledger.remove(&path);
            tracing::trace!(path = %path.display(), events, "Flushing debounced change");
            self.handle_event(&path, kind);
        }
    }

    /// Resolve a change against disk and invoke the callback.
    fn handle_event(&mut self, path: &Path, kind: EventType) {
        let key = self.paths.key_for(path);

        let (asset, kind) = match kind {
            EventType::Remove => (Asset::removed(key), EventType::Remove),
            EventType::Update => match load_asset(self.paths.root(), &key) {
                Ok(asset) => (asset, EventType::Update),
                Err(e) if e.is_not_found() => (Asset::removed(key), EventType::Remove),
                Err(e) if e.is_directory() => {
                    tracing::debug!(key = %key, "Skipping directory event");
                    return;
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to load changed asset");
                    return;
                }
            },
        };

        tracing::debug!(key = %asset.key, event = %kind, "Dispatching change");
        (self.callback)(&self.client, asset, kind);
        self.touch_notify_file();
    }

    /// Touch the sentinel file after the first dispatch.
    fn touch_notify_file(&mut self) {
        if !self.wait_notify {
            return;
        }
        self.wait_notify = false;

        if let Some(path) = &self.notify_file {
            match touch(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Touched notify file"),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to touch notify file");
                }
            }
        }
    }

    fn on_reload(&self) {
        tracing::info!("Config file changed, reloading");
        self.shared.signal_reload();
        self.shared.terminate();
    }
}

fn is_config_write(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other)
    )
}

fn touch(path: &Path) -> std::io::Result<()> {
    let file = File::options().create(true).append(true).open(path)?;
    file.set_modified(SystemTime::now())
}

/// Watch every non-excluded directory under `root`, one level each.
fn register_tree<W: Watcher>(
    watcher: &mut W,
    root: &Path,
    filter: &PathFilter,
) -> Result<ProjectPaths> {
    if !root.is_dir() {
        return Err(WatcherError::setup(root, "not a directory").into());
    }

    let mut paths = ProjectPaths::new(root);
    let mut registered = 0usize;

    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.file_type().is_dir()
                && (entry.depth() == 0 || !filter.ignore_dir(path_to_project(root, entry.path())))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory");
                continue;
            }
        };

        // Raw symlink paths never receive notifications on some platforms.
        let real = entry
            .path()
            .canonicalize()
            .map_err(|e| WatcherError::setup(entry.path(), e))?;
        watcher
            .watch(&real, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::setup(&real, e))?;

        if entry.path_is_symlink() {
            tracing::debug!(
                link = %entry.path().display(),
                target = %real.display(),
                "Following symlinked directory"
            );
        }
        paths.add_alias(real, entry.into_path());
        registered += 1;
    }

    tracing::debug!(
        path = %root.display(),
        directories = registered,
        aliases = paths.alias_count(),
        "Registered directory watches"
    );

    Ok(paths)
}
