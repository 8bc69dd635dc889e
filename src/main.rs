// 16 8-bit data registers named V0 to VF
// I -> address register (12 bits)
// 16 level return stack
//
// Delay timer & Sound timer: Count down at 60 times / s until 0
//
// Display res: 64 width, 32 height
//
// 35 opcodes, each are 2 bytes (big-endian)
//      NNN: address
//      NN: 8-bit constant
//      N: 4-bit constant
//      X and Y: 4-bit register identifier

use std::process;

use clap::Parser;
use env_logger::Env;
use log::info;

use config::Config;
use driver::Driver;
use emulator::Emulator;
use errors::Result;
use window::Screen;

mod config;
mod decode;
mod display;
mod driver;
mod emulator;
mod errors;
mod keyboard;
mod memory;
mod registers;
mod timer;
mod window;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    if let Err(err) = run(&config) {
        if err.is_fault() {
            eprintln!("chipvm: program halted: {err}");
        } else {
            eprintln!("chipvm: {err}");
        }
        process::exit(1);
    }
}

fn run(config: &Config) -> Result<()> {
    let mut emu = Emulator::new();
    emu.mem.load_rom_by_file(&config.rom)?;
    info!("starting {}", config.rom.display());

    let mut screen = Screen::new(config.scale as usize)?;
    let mut driver = Driver::new(emu, config.driver());
    driver.run(&mut screen)
}
