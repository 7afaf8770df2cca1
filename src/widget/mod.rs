//! The countdown key widget.
//!
//! [`Model`] is the state machine behind one key. It owns the key's visual
//! state and turns host messages into registry calls and drawing:
//!
//! | Message | Sent by | Effect |
//! |---------|---------|--------|
//! | [`KeyDownMsg`] | host | start, pause, add time, or cancel the alert |
//! | [`KeyUpMsg`] | host | ends a press |
//! | [`TickMsg`] | host, once per second | long-press reset, expiry, redraw |
//! | [`SettingsMsg`] | host | settings changed in the property inspector |
//! | [`FlashMsg`] | the widget itself | next frame of the expiry flash |
//!
//! All messages go through [`Model::update`], which the bubbletea-rs runtime
//! calls one message at a time, so the host tick, key events and the 200 ms
//! flash never touch the state concurrently.
//!
//! Drawn on a [`VirtualKey`], the key renders itself with [`Model::view`]
//! like any other bubbletea-rs component.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Instant;
//! use streamtimer_widgets::registry::{MemoryRegistry, TimerHandle, TimerRegistry};
//! use streamtimer_widgets::surface::VirtualKey;
//! use streamtimer_widgets::widget::{KeyDownMsg, KeyUpMsg, Model, TickMsg};
//!
//! let handle = TimerHandle::new("key-1");
//! let registry: Arc<dyn TimerRegistry> = Arc::new(MemoryRegistry::new());
//! let mut key = Model::attach(handle.clone(), None, Arc::clone(&registry), VirtualKey::new());
//!
//! key.update(Box::new(TickMsg::new(handle.clone(), Instant::now())));
//! assert_eq!(key.connection().title(), Some("00:01\n00"));
//!
//! key.update(Box::new(KeyDownMsg::new(handle.clone(), Instant::now())));
//! key.update(Box::new(KeyUpMsg::new(handle.clone())));
//! assert!(registry.is_timer_enabled(&handle));
//! ```

use crate::alert::{FlashMsg, Flasher};
use crate::config::{ParsedConfig, Settings};
use crate::hourglass;
use crate::long_press::Detector;
use crate::registry::{RegistryError, TimerHandle, TimerRecord, TimerRegistry};
use crate::surface::{Connection, VirtualKey};
use bubbletea_rs::{Cmd, Msg};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Title shown in hourglass mode right after a press while running.
pub const RUNNING_GLYPH: &str = "▶️";
/// Title shown in hourglass mode right after a press while paused.
pub const PAUSED_GLYPH: &str = "||";

/// The host's once-per-second tick.
#[derive(Debug, Clone)]
pub struct TickMsg {
    /// Key being ticked.
    pub handle: TimerHandle,
    /// When the tick was generated.
    pub time: Instant,
}

impl TickMsg {
    /// Creates a tick for `handle` at `time`.
    pub fn new(handle: TimerHandle, time: Instant) -> Self {
        Self { handle, time }
    }
}

/// The key went down.
#[derive(Debug, Clone)]
pub struct KeyDownMsg {
    /// Key that was pressed.
    pub handle: TimerHandle,
    /// When the press happened.
    pub time: Instant,
}

impl KeyDownMsg {
    /// Creates a press of `handle` at `time`.
    pub fn new(handle: TimerHandle, time: Instant) -> Self {
        Self { handle, time }
    }
}

/// The key came back up.
#[derive(Debug, Clone)]
pub struct KeyUpMsg {
    /// Key that was released.
    pub handle: TimerHandle,
}

impl KeyUpMsg {
    /// Creates a release of `handle`.
    pub fn new(handle: TimerHandle) -> Self {
        Self { handle }
    }
}

/// New settings from the host.
///
/// `payload` is the settings object as the host sent it. Keys it does not
/// contain keep their current value.
#[derive(Debug, Clone)]
pub struct SettingsMsg {
    /// Key whose settings changed.
    pub handle: TimerHandle,
    /// Settings object, camelCase keys.
    pub payload: Value,
}

impl SettingsMsg {
    /// Creates a settings update for `handle`.
    pub fn new(handle: TimerHandle, payload: Value) -> Self {
        Self { handle, payload }
    }
}

/// Formats whole seconds as the key title.
///
/// Hours and minutes share the first line, joined by `:` or split by a line
/// break when `multiline` is set. Seconds always go on their own line.
pub fn format_title(total_secs: u64, multiline: bool) -> String {
    let delimiter = if multiline { "\n" } else { ":" };
    let mut minutes = total_secs / 60;
    let seconds = total_secs % 60;
    let hours = minutes / 60;
    minutes %= 60;

    format!("{:02}{}{:02}\n{:02}", hours, delimiter, minutes, seconds)
}

/// One countdown key.
pub struct Model<C: Connection> {
    handle: TimerHandle,
    registry: Arc<dyn TimerRegistry>,
    connection: C,

    settings: Settings,
    config: ParsedConfig,

    flasher: Flasher,
    long_press: Detector,
    alerting: bool,
    display_current_status: bool,
    detached: bool,
}

impl<C: Connection> Model<C> {
    /// Creates the widget for a key that just appeared.
    ///
    /// Missing or malformed settings are replaced with the defaults, which
    /// are then persisted through `connection`. When the interval is valid
    /// and the countdown is not running, the registry record is rewound to
    /// the full interval so the first tick already shows it.
    ///
    /// # Arguments
    ///
    /// * `handle` - The registry record this key drives
    /// * `payload` - The settings object stored for the key, if any
    /// * `registry` - Countdown store shared with the other keys
    /// * `connection` - Where titles, images and alerts go
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use streamtimer_widgets::registry::{MemoryRegistry, TimerHandle, TimerRegistry};
    /// use streamtimer_widgets::surface::VirtualKey;
    /// use streamtimer_widgets::widget::Model;
    ///
    /// let registry: Arc<dyn TimerRegistry> = Arc::new(MemoryRegistry::new());
    /// let handle = TimerHandle::new("key-1");
    /// let settings = serde_json::json!({"timerInterval": "00:10:00"});
    ///
    /// let key = Model::attach(handle.clone(), Some(&settings), Arc::clone(&registry), VirtualKey::new());
    /// assert_eq!(key.settings().timer_interval, "00:10:00");
    /// assert_eq!(registry.remaining_seconds(&handle), 600);
    /// assert!(!registry.is_timer_enabled(&handle));
    /// ```
    pub fn attach(
        handle: TimerHandle,
        payload: Option<&Value>,
        registry: Arc<dyn TimerRegistry>,
        mut connection: C,
    ) -> Self {
        let (settings, defaulted) = Settings::from_payload(payload);
        if defaulted {
            connection.set_settings(&settings);
        }
        tracing::info!(%handle, defaulted, "countdown key attached");

        let mut model = Self {
            flasher: Flasher::new(handle.clone()),
            handle,
            registry,
            connection,
            config: ParsedConfig::default(),
            settings,
            long_press: Detector::new(),
            alerting: false,
            display_current_status: false,
            detached: false,
        };
        model.apply_settings();
        model
    }

    /// Stops the flash and ignores every later message.
    ///
    /// A flash tick already scheduled is dropped when it arrives.
    pub fn detach(&mut self) {
        self.flasher.stop();
        self.alerting = false;
        self.detached = true;
        tracing::info!(handle = %self.handle, "countdown key detached");
    }

    /// The key's handle.
    pub fn handle(&self) -> &TimerHandle {
        &self.handle
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Parsed form of the current settings.
    pub fn config(&self) -> &ParsedConfig {
        &self.config
    }

    /// The surface the key draws on.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// True while the expiry flash is showing.
    pub fn is_alerting(&self) -> bool {
        self.alerting
    }

    /// Stage the next flash frame will use.
    pub fn alert_stage(&self) -> usize {
        self.flasher.stage()
    }

    /// True while the key is held down.
    pub fn key_pressed(&self) -> bool {
        self.long_press.is_pressed()
    }

    /// Handles one message.
    ///
    /// Ticks, key edges and settings updates addressed to another handle
    /// are ignored, as is everything after [`Model::detach`]. A [`FlashMsg`]
    /// is only accepted while the flash it belongs to is still running.
    ///
    /// # Arguments
    ///
    /// * `msg` - The message to process
    ///
    /// # Returns
    ///
    /// Returns Some(Cmd) when the expiry flash needs its next frame
    /// scheduled, or None otherwise.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use std::time::Instant;
    /// use streamtimer_widgets::registry::{MemoryRegistry, TimerHandle, TimerRegistry};
    /// use streamtimer_widgets::surface::VirtualKey;
    /// use streamtimer_widgets::widget::{Model, TickMsg};
    ///
    /// let registry: Arc<dyn TimerRegistry> = Arc::new(MemoryRegistry::new());
    /// let handle = TimerHandle::new("key-1");
    /// let settings = serde_json::json!({"timerInterval": "not a duration"});
    /// let mut key = Model::attach(handle.clone(), Some(&settings), registry, VirtualKey::new());
    ///
    /// // Nothing is armed, so the first tick finds the countdown over.
    /// let cmd = key.update(Box::new(TickMsg::new(handle, Instant::now())));
    /// assert!(cmd.is_some());
    /// assert!(key.is_alerting());
    /// ```
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if self.detached {
            return None;
        }

        if let Some(tick) = msg.downcast_ref::<TickMsg>() {
            if tick.handle != self.handle {
                return None;
            }
            return self.on_tick(tick.time);
        }

        if let Some(flash) = msg.downcast_ref::<FlashMsg>() {
            return self.on_flash(flash);
        }

        if let Some(press) = msg.downcast_ref::<KeyDownMsg>() {
            if press.handle == self.handle {
                self.on_key_down(press.time);
            }
            return None;
        }

        if let Some(release) = msg.downcast_ref::<KeyUpMsg>() {
            if release.handle == self.handle {
                self.long_press.release();
                tracing::debug!(handle = %self.handle, "key released");
            }
            return None;
        }

        if let Some(update) = msg.downcast_ref::<SettingsMsg>() {
            if update.handle == self.handle {
                self.on_settings(&update.payload);
            }
            return None;
        }

        None
    }

    fn on_settings(&mut self, payload: &Value) {
        let merged = match self.settings.merged(payload) {
            Ok(merged) => merged,
            Err(err) => {
                tracing::warn!(handle = %self.handle, %err, "ignoring settings update");
                return;
            }
        };

        self.settings = merged.couple_with(&self.settings);
        self.apply_settings();
        self.connection.set_settings(&self.settings);
    }

    // Re-derives the parsed config and pre-arms an idle timer.
    fn apply_settings(&mut self) {
        self.config = ParsedConfig::from_settings(&self.settings);

        if !self.config.timer_interval.is_zero() && !self.registry.is_timer_enabled(&self.handle)
        {
            self.reset_timer();
        }
    }

    fn on_key_down(&mut self, time: Instant) {
        self.long_press.press(time);
        if self.settings.hourglass_mode {
            self.display_current_status = true;
        }
        tracing::info!(handle = %self.handle, "key pressed");

        if self.alerting {
            self.alerting = false;
            self.flasher.stop();
            self.reset_timer();
            self.connection.set_image(None);
            return;
        }

        let running = self.registry.is_timer_enabled(&self.handle);
        if self.settings.streamathon_mode && running {
            self.add_streamathon_time();
        } else if running {
            self.pause_timer();
        } else {
            if !self.settings.resume_on_click {
                self.reset_timer();
            }
            self.resume_timer();
        }
    }

    fn add_streamathon_time(&mut self) {
        let increment = self.config.streamathon_increment;
        if increment.is_zero() {
            tracing::warn!(
                handle = %self.handle,
                increment = %self.settings.streamathon_increment,
                "streamathon mode has no valid increment"
            );
            self.connection.show_alert();
            return;
        }

        let result = self.registry.increment_timer(&self.handle, increment);
        self.report("increment", result);
    }

    fn on_tick(&mut self, time: Instant) -> Option<Cmd> {
        if self.long_press.check(time) {
            tracing::info!(handle = %self.handle, "long press, resetting countdown");
            self.pause_timer();
            self.reset_timer();
        }

        if self.alerting {
            return None;
        }

        let remaining = self.registry.remaining_seconds(&self.handle);
        let mut cmd = None;
        if remaining == 0 && !self.flasher.is_active() {
            tracing::info!(handle = %self.handle, "countdown finished");
            self.alerting = true;
            cmd = Some(self.flasher.start());
            self.pause_timer();
        }

        if self.settings.hourglass_mode {
            if let Some(image) = hourglass::render(
                self.config.timer_interval,
                remaining,
                self.config.hourglass_color,
            ) {
                self.connection.set_title(None);
                self.connection.set_image(Some(&image));
            }

            if self.display_current_status {
                self.display_current_status = false;
                let glyph = if self.registry.is_timer_enabled(&self.handle) {
                    RUNNING_GLYPH
                } else {
                    PAUSED_GLYPH
                };
                self.connection.set_title(Some(glyph));
            }
            return cmd;
        }

        let title = format_title(remaining, self.settings.multiline);
        self.connection.set_image(None);
        self.connection.set_title(Some(title.as_str()));
        cmd
    }

    fn on_flash(&mut self, msg: &FlashMsg) -> Option<Cmd> {
        if !self.flasher.accepts(msg) {
            return None;
        }

        let image = self.flasher.frame(self.config.alert_color);
        self.connection.set_image(Some(&image));
        Some(self.flasher.tick())
    }

    fn record(&self) -> TimerRecord {
        TimerRecord {
            handle: self.handle.clone(),
            duration: self.config.timer_interval,
            file_name: self.settings.timer_file_name.clone(),
            file_prefix: self.settings.file_prefix.clone(),
            reset_on_start: !self.settings.resume_on_click,
            end_text: self.settings.countdown_end_text.clone(),
            clear_file_on_reset: self.settings.clear_file_on_reset,
        }
    }

    fn reset_timer(&mut self) {
        let result = self.registry.reset_timer(&self.record());
        self.report("reset", result);
    }

    fn resume_timer(&mut self) {
        let result = self.registry.start_timer(&self.record());
        self.report("start", result);
    }

    fn pause_timer(&mut self) {
        let result = self.registry.stop_timer(&self.handle);
        self.report("stop", result);
    }

    fn report(&mut self, op: &'static str, result: Result<(), RegistryError>) {
        if let Err(err) = result {
            tracing::warn!(handle = %self.handle, op, %err, "timer registry call failed");
            self.connection.show_alert();
        }
    }
}

impl Model<VirtualKey> {
    /// Renders the key as it currently looks.
    ///
    /// # Returns
    ///
    /// The image as a grid of colored blocks followed by the title lines.
    /// Either part is missing while the key has none.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use std::time::Instant;
    /// use streamtimer_widgets::registry::{MemoryRegistry, TimerHandle, TimerRegistry};
    /// use streamtimer_widgets::surface::VirtualKey;
    /// use streamtimer_widgets::widget::{Model, TickMsg};
    ///
    /// let registry: Arc<dyn TimerRegistry> = Arc::new(MemoryRegistry::new());
    /// let handle = TimerHandle::new("key-1");
    /// let mut key = Model::attach(handle.clone(), None, registry, VirtualKey::new());
    ///
    /// key.update(Box::new(TickMsg::new(handle, Instant::now())));
    /// assert_eq!(key.view(), "00:01\n00");
    /// ```
    pub fn view(&self) -> String {
        self.connection.view()
    }
}

impl<C: Connection + std::fmt::Debug> std::fmt::Debug for Model<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("handle", &self.handle)
            .field("connection", &self.connection)
            .field("settings", &self.settings)
            .field("alerting", &self.alerting)
            .field("alert_stage", &self.flasher.stage())
            .field("key_pressed", &self.long_press.is_pressed())
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}
