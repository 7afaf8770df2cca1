//! The timer registry: where countdowns actually live.
//!
//! A key widget only renders and reacts; elapsed time is owned by a
//! [`TimerRegistry`] shared between all widgets of a host. Each widget
//! addresses its own record with a [`TimerHandle`]. The registry is injected
//! into every widget as an `Arc<dyn TimerRegistry>`.
//!
//! [`MemoryRegistry`] is the in-process implementation. It can mirror each
//! countdown into a text file, which streaming software can display as an
//! overlay.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Opaque identifier of one widget's registry record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerHandle(String);

impl TimerHandle {
    /// Wraps the host's context id for a key.
    pub fn new(context: impl Into<String>) -> Self {
        Self(context.into())
    }

    /// The wrapped context id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the registry needs to start or reset a countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerRecord {
    /// Record being addressed.
    pub handle: TimerHandle,
    /// Full countdown length.
    pub duration: Duration,
    /// Mirror file, empty for none.
    pub file_name: String,
    /// Text written before the time in the mirror file.
    pub file_prefix: String,
    /// Start from full length again if the countdown already ran out.
    pub reset_on_start: bool,
    /// Written to the mirror file once the countdown hits zero.
    pub end_text: String,
    /// Empty the mirror file on reset.
    pub clear_file_on_reset: bool,
}

/// Registry call failures.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No record exists for the handle.
    #[error("no timer registered for {0}")]
    UnknownTimer(TimerHandle),

    /// Another thread panicked while holding the registry lock.
    #[error("timer registry lock poisoned")]
    Poisoned,
}

/// Shared countdown store.
///
/// Implementations must be internally synchronized: many widgets call into
/// one registry, each from its own event stream.
pub trait TimerRegistry: Send + Sync {
    /// True from `start_timer` until `stop_timer`.
    ///
    /// A countdown that reaches zero stays enabled until it is stopped, so
    /// the widget still sees the expiry on its next tick.
    fn is_timer_enabled(&self, handle: &TimerHandle) -> bool;

    /// Whole seconds left, `0` for unknown or finished timers.
    fn remaining_seconds(&self, handle: &TimerHandle) -> u64;

    /// Starts or resumes the countdown, creating the record if needed.
    fn start_timer(&self, record: &TimerRecord) -> Result<(), RegistryError>;

    /// Pauses the countdown. Stopping an unknown or stopped timer is a no-op.
    fn stop_timer(&self, handle: &TimerHandle) -> Result<(), RegistryError>;

    /// Rewinds the countdown to the record's full duration.
    fn reset_timer(&self, record: &TimerRecord) -> Result<(), RegistryError>;

    /// Adds `by` to the remaining time.
    fn increment_timer(&self, handle: &TimerHandle, by: Duration) -> Result<(), RegistryError>;
}

/// Source of "now" for [`MemoryRegistry`].
pub type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

#[derive(Debug)]
struct Entry {
    record: TimerRecord,
    length: Duration,
    elapsed: Duration,
    started_at: Option<Instant>,
    last_written: Option<String>,
}

impl Entry {
    fn new(record: &TimerRecord) -> Self {
        Self {
            record: record.clone(),
            length: record.duration,
            elapsed: Duration::ZERO,
            started_at: None,
            last_written: None,
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(start) => self.elapsed + now.saturating_duration_since(start),
            None => self.elapsed,
        }
    }

    fn remaining(&self, now: Instant) -> Duration {
        self.length.saturating_sub(self.elapsed(now))
    }

    fn pause(&mut self, now: Instant) {
        if let Some(start) = self.started_at.take() {
            self.elapsed += now.saturating_duration_since(start);
        }
    }

    fn file_contents(&self, now: Instant) -> String {
        let remaining = self.remaining(now).as_secs();
        if remaining == 0 && !self.record.end_text.is_empty() {
            return self.record.end_text.clone();
        }
        format!(
            "{}{:02}:{:02}:{:02}",
            self.record.file_prefix,
            remaining / 3600,
            (remaining % 3600) / 60,
            remaining % 60
        )
    }

    fn write_file(&mut self, contents: String) {
        if self.record.file_name.is_empty() || self.last_written.as_ref() == Some(&contents) {
            return;
        }
        let path = PathBuf::from(&self.record.file_name);
        match std::fs::write(&path, &contents) {
            Ok(()) => self.last_written = Some(contents),
            Err(err) => {
                tracing::warn!(%err, path = %path.display(), "failed to write timer file");
            }
        }
    }

    fn sync_file(&mut self, now: Instant) {
        let contents = self.file_contents(now);
        self.write_file(contents);
    }
}

/// In-process [`TimerRegistry`] with optional file mirroring.
pub struct MemoryRegistry {
    timers: Mutex<HashMap<TimerHandle, Entry>>,
    clock: Clock,
}

impl MemoryRegistry {
    /// Creates an empty registry on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Instant::now))
    }

    /// Creates an empty registry reading time from `clock`.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<TimerHandle, Entry>>, RegistryError> {
        self.timers.lock().map_err(|_| RegistryError::Poisoned)
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRegistry")
            .field("timers", &self.timers)
            .finish_non_exhaustive()
    }
}

impl TimerRegistry for MemoryRegistry {
    fn is_timer_enabled(&self, handle: &TimerHandle) -> bool {
        self.lock()
            .ok()
            .and_then(|timers| timers.get(handle).map(|e| e.started_at.is_some()))
            .unwrap_or(false)
    }

    fn remaining_seconds(&self, handle: &TimerHandle) -> u64 {
        let now = (self.clock)();
        let Ok(mut timers) = self.lock() else {
            return 0;
        };
        match timers.get_mut(handle) {
            Some(entry) => {
                entry.sync_file(now);
                entry.remaining(now).as_secs()
            }
            None => 0,
        }
    }

    fn start_timer(&self, record: &TimerRecord) -> Result<(), RegistryError> {
        let now = (self.clock)();
        let mut timers = self.lock()?;
        let entry = timers
            .entry(record.handle.clone())
            .or_insert_with(|| Entry::new(record));

        if entry.remaining(now).is_zero() && record.reset_on_start {
            entry.length = record.duration;
            entry.elapsed = Duration::ZERO;
        }
        entry.record = record.clone();
        if entry.started_at.is_none() {
            entry.started_at = Some(now);
        }
        tracing::debug!(handle = %record.handle, "timer started");
        entry.sync_file(now);
        Ok(())
    }

    fn stop_timer(&self, handle: &TimerHandle) -> Result<(), RegistryError> {
        let now = (self.clock)();
        let mut timers = self.lock()?;
        if let Some(entry) = timers.get_mut(handle) {
            entry.pause(now);
            tracing::debug!(%handle, "timer stopped");
        }
        Ok(())
    }

    fn reset_timer(&self, record: &TimerRecord) -> Result<(), RegistryError> {
        let now = (self.clock)();
        let mut timers = self.lock()?;
        let entry = timers
            .entry(record.handle.clone())
            .or_insert_with(|| Entry::new(record));

        entry.record = record.clone();
        entry.length = record.duration;
        entry.elapsed = Duration::ZERO;
        if entry.started_at.is_some() {
            entry.started_at = Some(now);
        }
        tracing::debug!(handle = %record.handle, "timer reset");

        if record.clear_file_on_reset {
            entry.write_file(String::new());
        } else {
            entry.sync_file(now);
        }
        Ok(())
    }

    fn increment_timer(&self, handle: &TimerHandle, by: Duration) -> Result<(), RegistryError> {
        let now = (self.clock)();
        let mut timers = self.lock()?;
        let entry = timers
            .get_mut(handle)
            .ok_or_else(|| RegistryError::UnknownTimer(handle.clone()))?;
        entry.length += by;
        tracing::debug!(%handle, secs = by.as_secs(), "timer incremented");
        entry.sync_file(now);
        Ok(())
    }
}
