//! Hourglass rendering: a bar that drains as the countdown runs.
//!
//! The filled region always reaches the bottom of the key; its top edge
//! drops as time passes. With the default black fill color the bar changes
//! from green to yellow to red as the countdown nears zero.

use crate::bitmap::Bitmap;
use crate::color::Rgba;
use std::time::Duration;

/// Above this fraction remaining the derived color is green.
pub const GREEN_THRESHOLD: f64 = 0.5;
/// Above this fraction remaining (and up to [`GREEN_THRESHOLD`]) it is yellow.
pub const YELLOW_THRESHOLD: f64 = 0.20;

/// Fraction of the countdown still remaining, in `(0, 1]`.
///
/// Returns `None` once nothing remains. A zero `total` counts as full so a
/// timer with an unparsable interval still draws.
pub fn remaining_percentage(total: Duration, remaining_secs: u64) -> Option<f64> {
    if remaining_secs == 0 {
        return None;
    }
    let total_secs = total.as_secs();
    if total_secs == 0 {
        return Some(1.0);
    }
    Some((remaining_secs as f64 / total_secs as f64).min(1.0))
}

/// Fill color for `remaining` with the configured color `configured`.
///
/// Any non-black configured color is used as-is.
pub fn fill_color(configured: Rgba, remaining: f64) -> Rgba {
    if !configured.is_black() {
        return configured;
    }

    if remaining > GREEN_THRESHOLD {
        Rgba::GREEN
    } else if remaining > YELLOW_THRESHOLD {
        Rgba::YELLOW
    } else {
        Rgba::RED
    }
}

/// Row at which the fill starts on a key `height` pixels tall.
pub fn fill_origin(height: u32, remaining: f64) -> u32 {
    let filled = (height as f64 * remaining).round() as u32;
    height.saturating_sub(filled)
}

/// Draws the hourglass for the current countdown.
///
/// # Arguments
///
/// * `total` - The full countdown interval
/// * `remaining_secs` - Whole seconds left
/// * `configured` - The configured fill color; black derives it from the time left
///
/// # Returns
///
/// A key-sized image filled from [`fill_origin`] down to the bottom edge,
/// or `None` once nothing remains.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use streamtimer_widgets::color::Rgba;
/// use streamtimer_widgets::hourglass::render;
///
/// let image = render(Duration::from_secs(100), 80, Rgba::BLACK).unwrap();
/// assert_eq!(image.pixel(0, 143), Some(Rgba::GREEN));
/// assert_eq!(image.pixel(0, 0), Some(Rgba::BLACK));
///
/// assert!(render(Duration::from_secs(100), 0, Rgba::BLACK).is_none());
/// ```
pub fn render(total: Duration, remaining_secs: u64, configured: Rgba) -> Option<Bitmap> {
    let remaining = remaining_percentage(total, remaining_secs)?;

    let mut image = Bitmap::key();
    let origin = fill_origin(image.height(), remaining);
    let (width, height) = (image.width(), image.height());
    image.fill_rect(
        0,
        origin,
        width,
        height - origin,
        fill_color(configured, remaining),
    );
    Some(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::KEY_SIZE;

    #[test]
    fn test_nothing_remaining_draws_nothing() {
        assert_eq!(remaining_percentage(Duration::from_secs(100), 0), None);
        assert!(render(Duration::from_secs(100), 0, Rgba::BLACK).is_none());
    }

    #[test]
    fn test_percentage_is_clamped() {
        assert_eq!(remaining_percentage(Duration::from_secs(100), 40), Some(0.4));
        assert_eq!(remaining_percentage(Duration::from_secs(100), 400), Some(1.0));
        assert_eq!(remaining_percentage(Duration::ZERO, 10), Some(1.0));
    }

    #[test]
    fn test_derived_color_bands() {
        assert_eq!(fill_color(Rgba::BLACK, 1.0), Rgba::GREEN);
        assert_eq!(fill_color(Rgba::BLACK, 0.51), Rgba::GREEN);
        assert_eq!(fill_color(Rgba::BLACK, 0.5), Rgba::YELLOW);
        assert_eq!(fill_color(Rgba::BLACK, 0.21), Rgba::YELLOW);
        assert_eq!(fill_color(Rgba::BLACK, 0.20), Rgba::RED);
        assert_eq!(fill_color(Rgba::BLACK, 0.01), Rgba::RED);
    }

    #[test]
    fn test_configured_color_wins() {
        let blue = Rgba::rgb(0, 0, 255);
        for remaining in [1.0, 0.4, 0.1] {
            assert_eq!(fill_color(blue, remaining), blue);
        }
    }

    #[test]
    fn test_fill_origin_rounds() {
        assert_eq!(fill_origin(100, 0.4), 60);
        assert_eq!(fill_origin(144, 0.4), 86);
        assert_eq!(fill_origin(144, 1.0), 0);
    }

    #[test]
    fn test_render_forty_percent() {
        let image = render(Duration::from_secs(100), 40, Rgba::BLACK).unwrap();
        let origin = fill_origin(KEY_SIZE, 0.4);

        assert_eq!(image.pixel(0, origin - 1), Some(Rgba::BLACK));
        assert_eq!(image.pixel(0, origin), Some(Rgba::YELLOW));
        assert_eq!(image.pixel(KEY_SIZE - 1, KEY_SIZE - 1), Some(Rgba::YELLOW));
    }
}
