use std::sync::{Arc, Mutex};

/// Prefixes that mark a line as a progress update rather than a new entry
const PROGRESS_PREFIXES: [&str; 2] = ["Writing", "Programming"];

/// Display log entry classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Ordinary status line
    Status,
    /// User-facing notice (prompts, session boundaries)
    Notice,
    /// Failure line
    Error,
    /// Reusable in-progress line
    Progress,
}

/// A single display log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub kind: LogKind,
    pub text: String,
}

/// Ordered log of display entries with a reusable in-progress slot.
///
/// Ordinary lines append a permanent entry. Lines beginning with a progress
/// prefix overwrite a single reusable slot so repeated updates do not flood
/// the log. The slot is recreated after each `reset_progress` call.
pub struct DisplayLog {
    entries: Vec<LogEntry>,
    progress_slot: Option<usize>,
    limit: usize,
    total_pushed: u64,
}

impl DisplayLog {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            progress_slot: None,
            limit,
            total_pushed: 0,
        }
    }

    /// Append an entry, evicting the oldest once the limit is reached
    pub fn push(&mut self, kind: LogKind, text: impl Into<String>) {
        self.total_pushed += 1;
        self.entries.push(LogEntry {
            kind,
            text: text.into(),
        });

        if self.entries.len() > self.limit {
            self.entries.remove(0);
            self.progress_slot = match self.progress_slot {
                Some(0) | None => None,
                Some(index) => Some(index - 1),
            };
        }
    }

    /// Route a line: progress-prefixed lines update the reusable slot,
    /// everything else appends a status entry
    pub fn write_line(&mut self, text: &str) {
        if is_progress_line(text) {
            self.update_progress(text);
        } else {
            self.push(LogKind::Status, text);
        }
    }

    /// Overwrite the in-progress slot, creating it on first use
    pub fn update_progress(&mut self, text: &str) {
        match self.progress_slot {
            Some(index) => {
                self.entries[index].text = text.to_string();
            }
            None => {
                self.push(LogKind::Progress, text);
                self.progress_slot = Some(self.entries.len() - 1);
            }
        }
    }

    /// Detach the current progress slot so the next update starts a new one
    pub fn reset_progress(&mut self) {
        self.progress_slot = None;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.progress_slot = None;
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of entries ever appended. Survives eviction and `clear`, so
    /// readers can tell how many entries they missed.
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }
}

fn is_progress_line(text: &str) -> bool {
    PROGRESS_PREFIXES
        .iter()
        .any(|prefix| text.starts_with(prefix))
}

/// Sink contract consumed by the flasher backend
pub trait TerminalSink: Send {
    /// Clear all output
    fn clean(&mut self);
    /// Write a full line
    fn write_line(&mut self, text: &str);
    /// Write raw text
    fn write(&mut self, text: &str);
}

/// Thread-shared display log handle.
///
/// Lock scopes are short and never held across an await, so the log can be
/// touched from the monitor task, the flasher backend, and the TUI draw loop.
#[derive(Clone)]
pub struct SharedLog {
    inner: Arc<Mutex<DisplayLog>>,
}

impl SharedLog {
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DisplayLog::new(limit))),
        }
    }

    fn with<F>(&self, f: F)
    where
        F: FnOnce(&mut DisplayLog),
    {
        if let Ok(mut log) = self.inner.lock() {
            f(&mut log);
        }
    }

    pub fn push(&self, kind: LogKind, text: impl Into<String>) {
        let text = text.into();
        self.with(|log| log.push(kind, text));
    }

    pub fn status(&self, text: impl Into<String>) {
        self.push(LogKind::Status, text);
    }

    pub fn notice(&self, text: impl Into<String>) {
        self.push(LogKind::Notice, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.push(LogKind::Error, text);
    }

    /// Route a line through the progress-slot rules
    pub fn write_text(&self, text: &str) {
        self.with(|log| log.write_line(text));
    }

    pub fn reset_progress(&self) {
        self.with(|log| log.reset_progress());
    }

    pub fn clear(&self) {
        self.with(|log| log.clear());
    }

    /// Copy of the current entries for rendering
    pub fn snapshot(&self) -> Vec<LogEntry> {
        match self.inner.lock() {
            Ok(log) => log.entries().to_vec(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(log) => log.len(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_pushed(&self) -> u64 {
        match self.inner.lock() {
            Ok(log) => log.total_pushed(),
            Err(_) => 0,
        }
    }
}

impl TerminalSink for SharedLog {
    fn clean(&mut self) {
        self.clear();
    }

    fn write_line(&mut self, text: &str) {
        self.write_text(text);
    }

    fn write(&mut self, text: &str) {
        self.write_text(text);
    }
}
