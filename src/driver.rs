use std::time::{Duration, Instant};

use log::{debug, error, info};

use crate::{
    display::FrameBuffer,
    emulator::Emulator,
    errors::Result,
    keyboard::KeyUpdate,
    timer::{TickSchedule, TIMER_HZ},
};

pub const DEFAULT_CYCLES_PER_SECOND: u32 = 700;

/// What the driver needs from the presentation layer.
pub trait Host {
    /// Checked once per cycle, false stops the run loop.
    fn is_open(&self) -> bool;
    /// Keypad changes since the last call.
    fn poll_input(&mut self) -> Vec<KeyUpdate>;
    fn present(&mut self, frame: &FrameBuffer) -> Result<()>;
    fn signal_sound(&mut self, _active: bool) {}
}

#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    pub cycles_per_second: u32,
    pub timer_hz: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            cycles_per_second: DEFAULT_CYCLES_PER_SECOND,
            timer_hz: TIMER_HZ,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Halted,
}

// Separately:
// CPU: cycles_per_second
// Display: whenever the framebuffer changed
// Timer: timer_hz, regardless of cpu speed
pub struct Driver {
    pub emu: Emulator,
    config: DriverConfig,
    state: DriverState,
    sound: bool,
}

impl Driver {
    pub fn new(emu: Emulator, config: DriverConfig) -> Self {
        Self {
            emu,
            config,
            state: DriverState::Running,
            sound: false,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Input, one cpu step, due timer ticks, then present if anything changed.
    pub fn cycle<H: Host>(
        &mut self,
        host: &mut H,
        timers: &mut TickSchedule,
        now: Instant,
    ) -> Result<()> {
        for update in host.poll_input() {
            self.emu.apply_input(update);
        }

        if let Err(err) = self.emu.step() {
            self.state = DriverState::Halted;
            error!("halting: {err}");
            return Err(err);
        }

        for _ in 0..timers.due(now) {
            self.emu.sync_timers();
        }

        let sound = self.emu.sound_active();
        if sound != self.sound {
            debug!("sound {}", if sound { "on" } else { "off" });
            self.sound = sound;
            host.signal_sound(sound);
        }

        if let Some(frame) = self.emu.take_frame() {
            host.present(frame)?;
        }
        Ok(())
    }

    /// Runs until the host closes or the program faults.
    pub fn run<H: Host>(&mut self, host: &mut H) -> Result<()> {
        info!(
            "running at {} cycles/s, timers at {} Hz",
            self.config.cycles_per_second, self.config.timer_hz
        );
        let cycle_time = Duration::from_secs(1) / self.config.cycles_per_second.max(1);
        let mut timers = TickSchedule::new(self.config.timer_hz, Instant::now());

        while host.is_open() {
            let started = Instant::now();
            self.cycle(host, &mut timers, started)?;
            let elapsed = started.elapsed();
            if elapsed < cycle_time {
                std::thread::sleep(cycle_time - elapsed);
            }
        }
        info!("host closed, stopping");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::{emulator::CpuState, errors::EmuError};

    #[derive(Default)]
    struct FakeHost {
        cycles_left: usize,
        script: VecDeque<Vec<KeyUpdate>>,
        presented: Vec<Vec<[bool; 64]>>,
        sound: Vec<bool>,
    }

    impl Host for FakeHost {
        fn is_open(&self) -> bool {
            self.cycles_left > 0
        }

        fn poll_input(&mut self) -> Vec<KeyUpdate> {
            self.cycles_left = self.cycles_left.saturating_sub(1);
            self.script.pop_front().unwrap_or_default()
        }

        fn present(&mut self, frame: &FrameBuffer) -> Result<()> {
            self.presented.push(frame.rows().copied().collect());
            Ok(())
        }

        fn signal_sound(&mut self, active: bool) {
            self.sound.push(active);
        }
    }

    fn driver_with(program: &[u16]) -> Driver {
        let bytes: Vec<u8> = program.iter().flat_map(|w| w.to_be_bytes()).collect();
        let mut emu = Emulator::with_seed(1);
        emu.load_rom(&bytes).unwrap();
        Driver::new(
            emu,
            DriverConfig {
                cycles_per_second: 100_000,
                timer_hz: TIMER_HZ,
            },
        )
    }

    #[test]
    fn presents_only_when_changed() {
        // draw the 0 glyph, then spin
        let mut driver = driver_with(&[0xA000, 0xD005, 0x1204]);
        let mut host = FakeHost::default();
        let start = Instant::now();
        let mut timers = TickSchedule::new(TIMER_HZ, start);
        for _ in 0..6 {
            driver.cycle(&mut host, &mut timers, start).unwrap();
        }
        assert_eq!(host.presented.len(), 1);
        assert!(host.presented[0][0][0]);
        assert!(!host.presented[0][0][4]);
    }

    #[test]
    fn timers_follow_the_clock_not_the_cpu() {
        // delay = 0x3C then spin
        let mut driver = driver_with(&[0x603C, 0xF015, 0x1204]);
        let mut host = FakeHost::default();
        let start = Instant::now();
        let mut timers = TickSchedule::new(TIMER_HZ, start);
        let period = timers.period();

        for _ in 0..50 {
            driver.cycle(&mut host, &mut timers, start).unwrap();
        }
        assert_eq!(driver.emu.timers.delay.count, 0x3C);

        driver
            .cycle(&mut host, &mut timers, start + period * 10)
            .unwrap();
        assert_eq!(driver.emu.timers.delay.count, 0x3C - 10);
    }

    #[test]
    fn wait_for_key_keeps_timers_and_input_flowing() {
        // sound = 2, wait for key into V5, then V6 = 1
        let mut driver = driver_with(&[0x6002, 0xF018, 0xF50A, 0x6601]);
        let mut host = FakeHost::default();
        host.script = VecDeque::from(vec![
            vec![],
            vec![],
            vec![],
            vec![],
            vec![KeyUpdate::Pressed(0xC)],
        ]);
        let start = Instant::now();
        let mut timers = TickSchedule::new(TIMER_HZ, start);
        let period = timers.period();

        for i in 0..4 {
            driver
                .cycle(&mut host, &mut timers, start + period * i)
                .unwrap();
        }
        assert_eq!(driver.emu.state(), CpuState::WaitingForKey(5));
        assert_eq!(driver.emu.mem.pc.0, 0x206);
        assert_eq!(driver.emu.timers.sound.count, 0);
        assert_eq!(host.sound, vec![true, false]);

        driver
            .cycle(&mut host, &mut timers, start + period * 4)
            .unwrap();
        assert_eq!(driver.emu.regs.get(5), 0xC);
        assert_eq!(driver.emu.regs.get(6), 1);
    }

    #[test]
    fn fault_halts_the_driver() {
        let mut driver = driver_with(&[0x6001, 0xFFFF]);
        let mut host = FakeHost {
            cycles_left: 10,
            ..FakeHost::default()
        };
        let err = driver.run(&mut host).unwrap_err();
        assert!(matches!(err, EmuError::DecodeFault { pc: 0x202, word: 0xFFFF }));
        assert_eq!(driver.state(), DriverState::Halted);
        assert_eq!(host.cycles_left, 8);
    }

    #[test]
    fn stops_when_host_closes() {
        let mut driver = driver_with(&[0x1200]);
        let mut host = FakeHost {
            cycles_left: 3,
            ..FakeHost::default()
        };
        driver.run(&mut host).unwrap();
        assert_eq!(driver.state(), DriverState::Running);
        assert_eq!(host.cycles_left, 0);
    }
}
