// Elapsed-time clock for a game
// Ticks cooperatively: the UI loop calls `pump` and sleeps at most `until_next_tick`

use chrono::Utc;
use std::time::Duration;

/// Interval at which the elapsed seconds are republished
pub const TICK: Duration = Duration::from_secs(1);

/// Source of wall-clock time in epoch milliseconds
pub trait Clock {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Seconds as shown in the status bar: two digits under 10, plain above
pub fn format_seconds(secs: u64) -> String {
    format!("{secs:02}")
}

type Listener = Box<dyn FnMut(&str)>;

pub struct GameTimer<C: Clock = SystemClock> {
    clock: C,
    anchor_millis: i64, // Epoch millis the elapsed time counts from
    frozen_millis: u64, // Elapsed value held while stopped
    running: bool,
    published: Option<u64>, // Last seconds value sent to the listener
    listener: Option<Listener>,
}

impl GameTimer<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for GameTimer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> GameTimer<C> {
    pub fn with_clock(clock: C) -> Self {
        GameTimer {
            clock,
            anchor_millis: 0,
            frozen_millis: 0,
            running: false,
            published: None,
            listener: None,
        }
    }

    /// Register the observer that receives the display string on every tick
    pub fn set_listener(&mut self, listener: impl FnMut(&str) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn start(&mut self) {
        self.start_at(0);
    }

    /// Start counting from an existing elapsed time, e.g. a loaded game
    pub fn start_at(&mut self, elapsed_millis: u64) {
        let offset = i64::try_from(elapsed_millis).unwrap_or(i64::MAX);
        self.anchor_millis = self.clock.now_millis().saturating_sub(offset);
        self.running = true;
        self.published = None;
        self.pump();
    }

    /// Freeze the clock. Ticks arriving afterwards are ignored.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.frozen_millis = self.elapsed_millis();
        self.running = false;
        self.publish(self.frozen_millis / 1000);
    }

    /// Stop and zero the clock for a fresh game
    pub fn reset(&mut self) {
        self.running = false;
        self.frozen_millis = 0;
        self.publish(0);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_millis(&self) -> u64 {
        if self.running {
            self.clock.now_millis().saturating_sub(self.anchor_millis).max(0) as u64
        } else {
            self.frozen_millis
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_millis() / 1000
    }

    pub fn display(&self) -> String {
        format_seconds(self.elapsed_secs())
    }

    /// Publish the elapsed seconds if a new second has started.
    /// Returns whether the listener was called.
    pub fn pump(&mut self) -> bool {
        if !self.running {
            return false;
        }
        let secs = self.elapsed_secs();
        if self.published == Some(secs) {
            return false;
        }
        self.publish(secs);
        true
    }

    /// Time left until the next whole second, for use as a poll timeout
    pub fn until_next_tick(&self) -> Duration {
        if !self.running {
            return TICK;
        }
        let into_second = self.elapsed_millis() % 1000;
        Duration::from_millis(1000 - into_second)
    }

    fn publish(&mut self, secs: u64) {
        self.published = Some(secs);
        let text = format_seconds(secs);
        if let Some(listener) = self.listener.as_mut() {
            listener(&text);
        }
    }
}
