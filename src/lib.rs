#![warn(missing_docs)]

//! # streamtimer-widgets
//!
//! A countdown-timer key for bubbletea-rs hosts: one small square that shows
//! the time left, drains like an hourglass, and flashes when the countdown
//! is over.
//!
//! ## Overview
//!
//! Every key is a [`widget::Model`] following the Elm Architecture used by
//! bubbletea-rs: messages go in through `update()`, commands come out. The
//! host sends four kinds of messages:
//!
//! - [`KeyDownMsg`] / [`KeyUpMsg`] when the key is pressed and released
//! - [`TickMsg`] once per second
//! - [`SettingsMsg`] when the user edits the key's settings
//!
//! The widget schedules its own [`FlashMsg`] ticks while the expiry flash is
//! running. Because bubbletea-rs delivers messages one at a time, the widget
//! never needs a lock around its own state.
//!
//! Time itself lives in a [`TimerRegistry`] shared by all keys and injected
//! into each of them. What the key shows goes to a [`Connection`].
//!
//! ## Display modes
//!
//! | Mode | Shown |
//! |------|-------|
//! | digits | `HH:MM` and `SS` as the title |
//! | hourglass | a bar draining from the top, green → yellow → red |
//! | alert | the whole key flashing the alert color |
//!
//! ## Pressing the key
//!
//! - idle: restart the countdown (or resume it with `resumeOnClick`)
//! - running: pause, or add time in streamathon mode
//! - alerting: stop the flash and rewind
//! - held for more than a second: pause and rewind
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Instant;
//! use streamtimer_widgets::prelude::*;
//!
//! let registry: Arc<dyn TimerRegistry> = Arc::new(MemoryRegistry::new());
//! let handle = TimerHandle::new("key-1");
//! let settings = serde_json::json!({"timerInterval": "00:05:00", "multiline": true});
//!
//! let mut key = CountdownKey::attach(handle.clone(), Some(&settings), registry, VirtualKey::new());
//! key.update(Box::new(TickMsg::new(handle, Instant::now())));
//!
//! assert_eq!(key.connection().title(), Some("00\n05\n00"));
//! ```

pub mod alert;
pub mod bitmap;
pub mod color;
pub mod config;
pub mod hourglass;
pub mod key;
pub mod long_press;
pub mod registry;
pub mod surface;
pub mod widget;

pub use alert::{FlashMsg, Flasher};
pub use bitmap::Bitmap;
pub use color::Rgba;
pub use config::{ConfigError, ParsedConfig, Settings};
pub use key::Binding;
pub use registry::{MemoryRegistry, RegistryError, TimerHandle, TimerRecord, TimerRegistry};
pub use surface::{Connection, VirtualKey};
pub use widget::{KeyDownMsg, KeyUpMsg, Model as CountdownKey, SettingsMsg, TickMsg};

/// Everything needed to host countdown keys.
///
/// ```rust
/// use streamtimer_widgets::prelude::*;
/// ```
pub mod prelude {
    pub use crate::alert::FlashMsg;
    pub use crate::bitmap::Bitmap;
    pub use crate::color::Rgba;
    pub use crate::config::{ParsedConfig, Settings};
    pub use crate::key::Binding;
    pub use crate::registry::{MemoryRegistry, TimerHandle, TimerRecord, TimerRegistry};
    pub use crate::surface::{Connection, VirtualKey};
    pub use crate::widget::{KeyDownMsg, KeyUpMsg, Model as CountdownKey, SettingsMsg, TickMsg};
}
