//! Keyboard bindings for driving a countdown key from a terminal.
//!
//! A physical key reports separate press and release edges. In a terminal
//! the same edges come from crossterm's [`KeyEventKind`] (terminals with the
//! keyboard enhancement protocol report releases; others only presses, in
//! which case the host should send a [`KeyUpMsg`] itself).
//!
//! ```rust
//! use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
//! use std::time::Instant;
//! use streamtimer_widgets::key::Binding;
//! use streamtimer_widgets::registry::TimerHandle;
//! use streamtimer_widgets::widget::KeyDownMsg;
//!
//! let binding = Binding::new(vec![KeyCode::Char(' ')]).with_help("space");
//! let event = KeyEvent::new_with_kind(KeyCode::Char(' '), KeyModifiers::NONE, KeyEventKind::Press);
//!
//! let msg = binding.translate(&event, &TimerHandle::new("key-1"), Instant::now()).unwrap();
//! assert!(msg.downcast_ref::<KeyDownMsg>().is_some());
//! ```

use crate::registry::TimerHandle;
use crate::widget::{KeyDownMsg, KeyUpMsg};
use bubbletea_rs::Msg;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use std::time::Instant;

/// Keys that act as the countdown key.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Key codes that press the countdown key.
    pub keys: Vec<KeyCode>,
    /// Short label for the keys, e.g. `"space"`.
    pub help: String,
    /// What pressing does.
    pub description: String,
}

impl Binding {
    /// Binds `keys` with empty help text.
    pub fn new(keys: Vec<KeyCode>) -> Self {
        Self {
            keys,
            help: String::new(),
            description: String::new(),
        }
    }

    /// Sets the key label.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// True if `key_event` is one of the bound keys.
    pub fn matches(&self, key_event: &KeyEvent) -> bool {
        self.keys.contains(&key_event.code)
    }

    /// Turns a bound key event into a widget message for `handle`.
    ///
    /// Auto-repeat events are dropped; holding the key is measured from the
    /// first press.
    pub fn translate(&self, key_event: &KeyEvent, handle: &TimerHandle, now: Instant) -> Option<Msg> {
        if !self.matches(key_event) {
            return None;
        }

        match key_event.kind {
            KeyEventKind::Press => Some(Box::new(KeyDownMsg::new(handle.clone(), now)) as Msg),
            KeyEventKind::Release => Some(Box::new(KeyUpMsg::new(handle.clone())) as Msg),
            KeyEventKind::Repeat => None,
        }
    }
}

impl Default for Binding {
    fn default() -> Self {
        Self::new(vec![KeyCode::Char(' '), KeyCode::Enter])
            .with_help("space/enter")
            .with_description("start, pause or reset the countdown")
    }
}
