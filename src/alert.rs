//! Expiry flash for the key.
//!
//! When a countdown reaches zero the key flashes its alert color. The flash
//! cycles through [`TOTAL_ALERT_STAGES`] stages, each a darker shade of the
//! configured color, one stage every [`FLASH_INTERVAL`].
//!
//! The flasher drives itself through bubbletea-rs tick commands, the same way
//! a spinner does: every accepted [`FlashMsg`] returns the command for the
//! next one. Each message carries a tag; stopping the flasher bumps the tag so
//! a tick that is already in flight is dropped when it arrives.
//!
//! ```rust
//! use streamtimer_widgets::alert::stage_color;
//! use streamtimer_widgets::color::Rgba;
//!
//! let base = Rgba::rgb(200, 100, 50);
//! assert_eq!(stage_color(base, 0), base);
//! assert_eq!(stage_color(base, 2), Rgba::rgb(50, 25, 12));
//! // The last stage brightens back up instead of going nearly black.
//! assert_eq!(stage_color(base, 3), stage_color(base, 1));
//! ```

use crate::bitmap::Bitmap;
use crate::color::Rgba;
use crate::registry::TimerHandle;
use bubbletea_rs::{tick as bubbletea_tick, Cmd, Msg};
use std::time::Duration;

/// Number of shades in one flash cycle.
pub const TOTAL_ALERT_STAGES: usize = 4;

/// Time between two flash frames.
pub const FLASH_INTERVAL: Duration = Duration::from_millis(200);

/// Delivered every [`FLASH_INTERVAL`] while a key is alerting.
#[derive(Debug, Clone)]
pub struct FlashMsg {
    /// Key the flash belongs to.
    pub handle: TimerHandle,
    tag: i64,
}

/// Color of flash stage `stage` for base color `base`.
///
/// Every stage halves red, green and blue once more; alpha is kept. The last
/// stage is drawn like stage 1.
pub fn stage_color(base: Rgba, stage: usize) -> Rgba {
    let stage = if stage == TOTAL_ALERT_STAGES - 1 { 1 } else { stage };

    let (mut r, mut g, mut b) = (base.r as f64, base.g as f64, base.b as f64);
    for _ in 0..stage {
        r /= 2.0;
        g /= 2.0;
        b /= 2.0;
    }

    Rgba::rgba(r as u8, g as u8, b as u8, base.a)
}

/// Flash state of one key.
#[derive(Debug, Clone)]
pub struct Flasher {
    handle: TimerHandle,
    stage: usize,
    active: bool,
    tag: i64,
}

impl Flasher {
    /// Creates an idle flasher for `handle`.
    pub fn new(handle: TimerHandle) -> Self {
        Self {
            handle,
            stage: 0,
            active: false,
            tag: 0,
        }
    }

    /// True between [`start`](Self::start) and [`stop`](Self::stop).
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stage the next frame will be drawn with.
    pub fn stage(&self) -> usize {
        self.stage
    }

    /// Starts flashing from stage 0.
    ///
    /// Bumps the tag, so ticks left over from an earlier flash are rejected
    /// by [`accepts`](Self::accepts).
    ///
    /// # Returns
    ///
    /// The command that delivers the first [`FlashMsg`] after
    /// [`FLASH_INTERVAL`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use streamtimer_widgets::alert::Flasher;
    /// use streamtimer_widgets::registry::TimerHandle;
    ///
    /// let mut flasher = Flasher::new(TimerHandle::new("key-1"));
    /// let _first_tick = flasher.start();
    /// assert!(flasher.is_active());
    /// assert_eq!(flasher.stage(), 0);
    ///
    /// flasher.stop();
    /// assert!(!flasher.is_active());
    /// ```
    pub fn start(&mut self) -> Cmd {
        self.active = true;
        self.stage = 0;
        self.tag += 1;
        self.tick()
    }

    /// Stops flashing. Ticks already scheduled are ignored when they arrive.
    pub fn stop(&mut self) {
        self.active = false;
        self.tag += 1;
    }

    /// True if `msg` is the tick this flasher is waiting for.
    pub fn accepts(&self, msg: &FlashMsg) -> bool {
        self.active && msg.handle == self.handle && msg.tag == self.tag
    }

    /// Draws the current stage and advances to the next one.
    pub fn frame(&mut self, base: Rgba) -> Bitmap {
        let mut image = Bitmap::key();
        image.fill(stage_color(base, self.stage));
        self.stage = (self.stage + 1) % TOTAL_ALERT_STAGES;
        image
    }

    /// Schedules the next [`FlashMsg`].
    pub fn tick(&self) -> Cmd {
        let handle = self.handle.clone();
        let tag = self.tag;

        bubbletea_tick(FLASH_INTERVAL, move |_| {
            Box::new(FlashMsg {
                handle: handle.clone(),
                tag,
            }) as Msg
        })
    }

    #[cfg(test)]
    pub(crate) fn pending_msg(&self) -> FlashMsg {
        FlashMsg {
            handle: self.handle.clone(),
            tag: self.tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flasher() -> Flasher {
        Flasher::new(TimerHandle::new("ctx"))
    }

    #[test]
    fn test_stage_color_halves_per_stage() {
        let base = Rgba::rgba(255, 129, 7, 200);

        assert_eq!(stage_color(base, 0), base);
        assert_eq!(stage_color(base, 1), Rgba::rgba(127, 64, 3, 200));
        assert_eq!(stage_color(base, 2), Rgba::rgba(63, 32, 1, 200));
    }

    #[test]
    fn test_last_stage_matches_stage_one() {
        let base = Rgba::RED;
        assert_eq!(
            stage_color(base, TOTAL_ALERT_STAGES - 1),
            stage_color(base, 1)
        );
    }

    #[test]
    fn test_stage_wraps_after_each_frame() {
        let mut f = flasher();
        let _cmd = f.start();

        for n in 1..=9 {
            f.frame(Rgba::RED);
            assert_eq!(f.stage(), n % TOTAL_ALERT_STAGES);
        }
    }

    #[test]
    fn test_frame_fills_whole_key() {
        let mut f = flasher();
        let _cmd = f.start();

        let first = f.frame(Rgba::RED);
        assert_eq!(first.pixel(0, 0), Some(Rgba::RED));
        assert_eq!(
            first.pixel(first.width() - 1, first.height() - 1),
            Some(Rgba::RED)
        );

        let second = f.frame(Rgba::RED);
        assert_eq!(second.pixel(10, 10), Some(Rgba::rgb(127, 0, 0)));
    }

    #[test]
    fn test_start_resets_stage() {
        let mut f = flasher();
        let _cmd = f.start();
        f.frame(Rgba::RED);
        f.frame(Rgba::RED);
        f.stop();

        let _cmd = f.start();
        assert_eq!(f.stage(), 0);
    }

    #[test]
    fn test_stop_rejects_in_flight_tick() {
        let mut f = flasher();
        let _cmd = f.start();
        let in_flight = f.pending_msg();
        assert!(f.accepts(&in_flight));

        f.stop();
        assert!(!f.is_active());
        assert!(!f.accepts(&in_flight));

        let _cmd = f.start();
        assert!(!f.accepts(&in_flight));
        assert!(f.accepts(&f.pending_msg()));
    }

    #[test]
    fn test_rejects_other_keys() {
        let mut f = flasher();
        let _cmd = f.start();
        let mut msg = f.pending_msg();
        msg.handle = TimerHandle::new("other");
        assert!(!f.accepts(&msg));
    }

    #[tokio::test]
    async fn test_tick_delivers_flash_msg() {
        let mut f = flasher();
        let cmd = f.start();

        let msg = cmd.await.expect("tick should produce a message");
        let flash = msg
            .downcast_ref::<FlashMsg>()
            .expect("tick should produce a FlashMsg");
        assert!(f.accepts(flash));
    }
}
