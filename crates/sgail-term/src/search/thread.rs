//! The dedicated searcher thread.
//!
//! The thread owns one [`ScreenSearch`] per screen and coordinates with the
//! rest of the system through three channels of communication: the terminal
//! mutex (held only inside feeds), a bounded FIFO mailbox for control
//! messages, and an event callback that is never invoked while the mutex is
//! held.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, sync_channel};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::screenset::ScreenKey;
use crate::search::{ScreenSearch, SearchState, TickError};
use crate::terminal::Terminal;

/// Mailbox capacity; senders block when the searcher falls this far behind.
const MAILBOX_CAPACITY: usize = 64;

/// Events reported by the searcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchEvent {
    /// Every screen has been fully scanned.
    Complete,
    /// The match total on the currently active screen changed.
    TotalMatches(usize),
}

enum Message {
    /// Stop the current search and start over with a new needle. An empty
    /// needle leaves the terminal unsearched.
    ChangeNeedle(String),
    /// Nudge the loop (new screens, retry after OOM).
    Wake,
    /// Shut the thread down.
    Stop,
}

/// Handle to the searcher thread.
pub struct Searcher {
    tx: SyncSender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl Searcher {
    /// Spawn the searcher against a shared terminal. `on_event` must be
    /// fast and non-blocking; it is called without the terminal lock.
    pub fn spawn<F>(terminal: Arc<Mutex<Terminal>>, on_event: F) -> Self
    where
        F: Fn(SearchEvent) + Send + 'static,
    {
        let (tx, rx) = sync_channel(MAILBOX_CAPACITY);
        let handle = std::thread::Builder::new()
            .name("sgail-search".to_string())
            .spawn(move || {
                Worker {
                    terminal,
                    rx,
                    on_event: Box::new(on_event),
                    needle: Vec::new(),
                    searches: HashMap::new(),
                    last_total: None,
                    last_active: None,
                    completed_notified: false,
                }
                .run();
            })
            .ok();
        if handle.is_none() {
            warn!("failed to spawn searcher thread");
        }
        Self { tx, handle }
    }

    /// Replace the needle. Cancels any in-flight search immediately; an
    /// empty needle clears the search.
    pub fn change_needle(&self, needle: &str) {
        let _ = self.tx.send(Message::ChangeNeedle(needle.to_string()));
    }

    /// Nudge the searcher (e.g. after creating the alternate screen).
    /// Never blocks; a full mailbox drops the nudge.
    pub fn wake(&self) {
        let _ = self.tx.try_send(Message::Wake);
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.tx.send(Message::Stop);
            let _ = handle.join();
        }
    }
}

impl Drop for Searcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Aggregate tick outcome across all screen searches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Aggregate {
    Complete,
    Progress,
    Blocked,
}

struct Worker {
    terminal: Arc<Mutex<Terminal>>,
    rx: Receiver<Message>,
    on_event: Box<dyn Fn(SearchEvent) + Send>,
    needle: Vec<u8>,
    /// `None` marks a screen whose search failed to allocate; retried on
    /// the next reconciliation.
    searches: HashMap<ScreenKey, Option<ScreenSearch>>,
    last_total: Option<usize>,
    last_active: Option<ScreenKey>,
    completed_notified: bool,
}

impl Worker {
    fn run(mut self) {
        loop {
            // Idle (no needle, or everything scanned): block on the
            // mailbox instead of spinning.
            if !self.searching() {
                match self.rx.recv() {
                    Ok(msg) => {
                        if self.handle(msg) {
                            return;
                        }
                    }
                    Err(_) => return,
                }
            }
            // Drain whatever else queued up, FIFO.
            loop {
                match self.rx.try_recv() {
                    Ok(msg) => {
                        if self.handle(msg) {
                            return;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }
            if !self.searching() {
                continue;
            }

            match self.tick_all() {
                Aggregate::Progress => {}
                Aggregate::Complete => self.notify_complete(),
                Aggregate::Blocked => {
                    let shared = Arc::clone(&self.terminal);
                    let fed = {
                        let Ok(mut terminal) = shared.lock() else {
                            warn!("terminal mutex poisoned; searcher exiting");
                            return;
                        };
                        self.reconcile(&mut terminal);
                        self.feed_all(&terminal)
                    };
                    // The lock is released; completion events may fire.
                    if fed && self.all_complete() {
                        self.notify_complete();
                    }
                }
            }
            self.emit_total();
        }
    }

    /// Returns true when the thread must exit.
    fn handle(&mut self, msg: Message) -> bool {
        match msg {
            Message::Stop => true,
            Message::Wake => {
                if !self.needle.is_empty() {
                    let shared = Arc::clone(&self.terminal);
                    if let Ok(mut terminal) = shared.lock() {
                        self.reconcile(&mut terminal);
                    }
                }
                false
            }
            Message::ChangeNeedle(needle) => {
                // Cancel before any lock acquisition.
                self.searches.clear();
                self.completed_notified = false;
                self.last_total = None;
                self.needle = needle.into_bytes();
                if !self.needle.is_empty() {
                    let shared = Arc::clone(&self.terminal);
                    if let Ok(mut terminal) = shared.lock() {
                        self.reconcile(&mut terminal);
                    }
                }
                false
            }
        }
    }

    /// Whether there is an unfinished search to drive.
    fn searching(&self) -> bool {
        !self.needle.is_empty() && !self.all_complete()
    }

    fn all_complete(&self) -> bool {
        !self.searches.is_empty()
            && self.searches.values().all(|s| {
                s.as_ref()
                    .is_none_or(|s| s.state() == SearchState::Complete)
            })
    }

    /// Ensure a search exists for every live screen and drop searches for
    /// screens that went away. Runs under the terminal lock.
    fn reconcile(&mut self, terminal: &mut Terminal) {
        let keys = terminal.screens.keys();
        self.searches.retain(|key, _| keys.contains(key));
        for key in keys {
            let missing = match self.searches.get(&key) {
                None => true,
                Some(None) => true,
                Some(Some(_)) => false,
            };
            if !missing {
                continue;
            }
            let Some(screen) = terminal.screens.get(key) else {
                continue;
            };
            match ScreenSearch::new(screen, &self.needle) {
                Ok(search) => {
                    self.searches.insert(key, Some(search));
                }
                Err(err) => {
                    // Skip this screen for now; a later reconciliation
                    // retries.
                    warn!(?key, %err, "screen search init failed");
                    self.searches.insert(key, None);
                }
            }
        }
    }

    /// Tick every search once without the lock.
    fn tick_all(&mut self) -> Aggregate {
        let mut progressed = false;
        let mut blocked = false;
        let mut all_complete = true;
        for search in self.searches.values_mut().flatten() {
            match search.tick() {
                Ok(_) => {
                    progressed = true;
                    all_complete = false;
                }
                Err(TickError::SearchComplete) => {}
                Err(TickError::FeedRequired) => {
                    blocked = true;
                    all_complete = false;
                }
                Err(TickError::OutOfMemory) => {
                    debug!("match list allocation failed; screen results truncated");
                }
            }
        }
        if all_complete {
            Aggregate::Complete
        } else if progressed {
            Aggregate::Progress
        } else if blocked {
            Aggregate::Blocked
        } else {
            Aggregate::Complete
        }
    }

    /// Feed every search that needs it. Runs under the terminal lock.
    /// Returns whether anything was fed.
    fn feed_all(&mut self, terminal: &Terminal) -> bool {
        let mut fed = false;
        for (key, search) in &mut self.searches {
            let Some(search) = search.as_mut() else {
                continue;
            };
            if search.state() != SearchState::NeedsFeed {
                continue;
            }
            let Some(screen) = terminal.screens.get(*key) else {
                continue;
            };
            match search.feed(screen) {
                Ok(()) => fed = true,
                Err(err) => {
                    warn!(?key, %err, "search feed failed");
                }
            }
        }
        fed
    }

    fn notify_complete(&mut self) {
        if !self.completed_notified {
            self.completed_notified = true;
            (self.on_event)(SearchEvent::Complete);
        }
    }

    /// Report the active screen's total when it changed. Switching screens
    /// resets the memory so the next poll always reports.
    fn emit_total(&mut self) {
        let active = {
            let Ok(terminal) = self.terminal.lock() else {
                return;
            };
            terminal.screens.active_key()
        };
        if self.last_active != Some(active) {
            self.last_active = Some(active);
            self.last_total = None;
        }
        let total = self
            .searches
            .get(&active)
            .and_then(|s| s.as_ref())
            .map(ScreenSearch::total)
            .unwrap_or(0);
        if self.last_total != Some(total) {
            self.last_total = Some(total);
            (self.on_event)(SearchEvent::TotalMatches(total));
        }
    }
}
