use std::time::{Duration, Instant};

pub const TIMER_HZ: u32 = 60;

#[derive(Debug, Default, Clone, Copy)]
pub struct Timer {
    pub count: u8,
}

impl Timer {
    pub fn new(init_count: u8) -> Self {
        Self { count: init_count }
    }

    pub fn set(&mut self, value: u8) {
        self.count = value;
    }

    /// Counts down by one, stopping at zero.
    pub fn tick(&mut self) {
        self.count = self.count.saturating_sub(1);
    }

    pub fn is_active(&self) -> bool {
        self.count > 0
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Timers {
    pub delay: Timer,
    pub sound: Timer,
}

impl Timers {
    pub fn tick(&mut self) {
        self.delay.tick();
        self.sound.tick();
    }
}

/// Fixed rate clock, independent of how often it is polled. Each call to
/// `due` reports how many whole periods elapsed since the last reported one.
#[derive(Debug)]
pub struct TickSchedule {
    period: Duration,
    next: Instant,
}

impl TickSchedule {
    pub fn new(hz: u32, start: Instant) -> Self {
        let period = Duration::from_secs(1) / hz.max(1);
        Self {
            period,
            next: start + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn due(&mut self, now: Instant) -> u32 {
        let mut ticks = 0;
        while now >= self.next {
            self.next += self.period;
            ticks += 1;
        }
        ticks
    }
}
