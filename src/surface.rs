//! The host side of a key: what the widget draws on and talks to.
//!
//! The controller never touches a device directly. Everything visible goes
//! through a [`Connection`]: the title text, the background image, the
//! host's transient "alert" affordance, and the settings persistence
//! channel.
//!
//! [`VirtualKey`] is an in-memory connection. It remembers what was drawn
//! and renders it with lipgloss, which is enough to embed the widget in a
//! bubbletea-rs program or to assert on it in tests.

use crate::bitmap::Bitmap;
use crate::config::Settings;
use lipgloss_extras::lipgloss;
use lipgloss_extras::prelude::*;

/// Terminal cells used to draw the key image horizontally.
pub const VIEW_COLUMNS: u32 = 12;
/// Terminal rows used to draw the key image.
pub const VIEW_ROWS: u32 = 6;

/// Render surface and host channel for one key.
///
/// Calls are fire-and-forget; a host that fails to deliver them should log
/// and carry on.
pub trait Connection: Send {
    /// Sets the title text, `None` clears it.
    fn set_title(&mut self, title: Option<&str>);

    /// Sets the background image, `None` restores the default.
    fn set_image(&mut self, image: Option<&Bitmap>);

    /// Flashes the host's error indicator on the key.
    fn show_alert(&mut self);

    /// Persists the key's settings.
    fn set_settings(&mut self, settings: &Settings);
}

/// A [`Connection`] that keeps the last state it was given.
#[derive(Debug, Clone, Default)]
pub struct VirtualKey {
    title: Option<String>,
    image: Option<Bitmap>,
    alerts: usize,
    saved: Option<Settings>,
}

impl VirtualKey {
    /// Creates a blank key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Current background image.
    pub fn image(&self) -> Option<&Bitmap> {
        self.image.as_ref()
    }

    /// Number of times the alert affordance was shown.
    pub fn alerts(&self) -> usize {
        self.alerts
    }

    /// The most recently persisted settings.
    pub fn saved_settings(&self) -> Option<&Settings> {
        self.saved.as_ref()
    }

    /// Renders the image as colored blocks followed by the title lines.
    pub fn view(&self) -> String {
        let mut lines = Vec::new();

        if let Some(image) = &self.image {
            let cell_w = (image.width() / VIEW_COLUMNS).max(1);
            let cell_h = (image.height() / VIEW_ROWS).max(1);
            for row in 0..VIEW_ROWS {
                let mut line = String::new();
                for col in 0..VIEW_COLUMNS {
                    // Sample the center of each cell.
                    let px = image
                        .pixel(col * cell_w + cell_w / 2, row * cell_h + cell_h / 2)
                        .unwrap_or(crate::color::Rgba::BLACK);
                    let styled = Style::new()
                        .foreground(lipgloss::Color::from(px.to_hex().as_str()))
                        .render("█");
                    line.push_str(&styled);
                }
                lines.push(line);
            }
        }

        if let Some(title) = &self.title {
            lines.extend(title.lines().map(str::to_string));
        }

        lines.join("\n")
    }
}

impl Connection for VirtualKey {
    fn set_title(&mut self, title: Option<&str>) {
        self.title = title.map(str::to_string);
    }

    fn set_image(&mut self, image: Option<&Bitmap>) {
        self.image = image.cloned();
    }

    fn show_alert(&mut self) {
        self.alerts += 1;
    }

    fn set_settings(&mut self, settings: &Settings) {
        self.saved = Some(settings.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    #[test]
    fn test_records_title_and_image() {
        let mut key = VirtualKey::new();
        key.set_title(Some("00:01\n00"));
        key.set_image(Some(&Bitmap::key()));

        assert_eq!(key.title(), Some("00:01\n00"));
        assert!(key.image().is_some());

        key.set_title(None);
        key.set_image(None);
        assert_eq!(key.title(), None);
        assert!(key.image().is_none());
    }

    #[test]
    fn test_counts_alerts_and_saves_settings() {
        let mut key = VirtualKey::new();
        key.show_alert();
        key.show_alert();
        key.set_settings(&Settings::default());

        assert_eq!(key.alerts(), 2);
        assert_eq!(key.saved_settings(), Some(&Settings::default()));
    }

    #[test]
    fn test_view_title_only() {
        let mut key = VirtualKey::new();
        key.set_title(Some("00:00\n42"));
        assert_eq!(key.view(), "00:00\n42");
    }

    #[test]
    fn test_view_draws_image_grid() {
        let mut key = VirtualKey::new();
        key.set_image(Some(&Bitmap::new(144, 144, Rgba::RED)));

        let view = key.view();
        let clean = lipgloss::strip_ansi(&view);
        assert_eq!(clean.lines().count(), VIEW_ROWS as usize);
        assert!(clean
            .lines()
            .all(|line| line.chars().count() == VIEW_COLUMNS as usize));
    }
}
