use std::path::PathBuf;

use clap::Parser;

use crate::{
    driver::{DriverConfig, DEFAULT_CYCLES_PER_SECOND},
    timer::TIMER_HZ,
    window::DEFAULT_SCALE,
};

/// Runs a CHIP-8 rom.
///
/// Keypad is mapped onto the left block of the keyboard:
/// 1234 / QWER / ASDF / ZXCV.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Path to the rom image, loaded at 0x200
    pub rom: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = DEFAULT_CYCLES_PER_SECOND, value_parser = clap::value_parser!(u32).range(1..))]
    pub cycles_per_second: u32,

    /// Delay and sound timer rate
    #[arg(long, default_value_t = TIMER_HZ, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub timer_hz: u32,

    /// Window pixels per display cell
    #[arg(short, long, default_value_t = DEFAULT_SCALE, value_parser = clap::value_parser!(u32).range(1..=32))]
    pub scale: u32,
}

impl Config {
    pub fn driver(&self) -> DriverConfig {
        DriverConfig {
            cycles_per_second: self.cycles_per_second,
            timer_hz: self.timer_hz,
        }
    }
}
