use log::{debug, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    decode::OpCodes,
    display::FrameBuffer,
    errors::{EmuError, Result},
    keyboard::{KeyUpdate, Keypad},
    memory::{Memory, TypeAddr, FONT_GLYPH_LEN, FONT_START},
    registers::Registers,
    timer::Timers,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    Running,
    // FX0A, holds X until a key goes down
    WaitingForKey(u8),
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Executed(OpCodes),
    Waiting,
}

pub struct Emulator {
    pub regs: Registers,
    pub mem: Memory,
    pub fb: FrameBuffer,
    pub keypad: Keypad,
    pub timers: Timers,
    state: CpuState,
    rng: StdRng,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            fb: FrameBuffer::new(),
            keypad: Keypad::new(),
            timers: Timers::default(),
            state: CpuState::Running,
            rng,
        }
    }

    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<()> {
        self.mem.load_rom(bytes)
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    /// Reads the word at pc and moves pc past it.
    pub fn fetch_decode(&mut self) -> Result<OpCodes> {
        let pc = self.mem.pc.0;
        let word = self.mem.fetch()?;
        self.mem.increment_pc();
        OpCodes::decode_raw(word).ok_or(EmuError::DecodeFault { pc, word })
    }

    /// One fetch-decode-execute cycle. Does nothing while waiting for a key.
    /// Any fault halts the cpu for good.
    pub fn step(&mut self) -> Result<Step> {
        match self.state {
            CpuState::Halted => return Err(EmuError::Halted),
            CpuState::WaitingForKey(_) => return Ok(Step::Waiting),
            CpuState::Running => {}
        }

        let pc = self.mem.pc.0;
        let result = self.fetch_decode().and_then(|op| {
            trace!("{pc:03x}: {op}");
            self.execute_ins(op, pc).map(|_| op)
        });
        match result {
            Ok(op) => Ok(Step::Executed(op)),
            Err(err) => {
                self.state = CpuState::Halted;
                Err(err)
            }
        }
    }

    /// Runs `ins`, which was fetched from `pc`. The program counter has
    /// already moved past it.
    pub fn execute_ins(&mut self, ins: OpCodes, pc: TypeAddr) -> Result<()> {
        match ins {
            OpCodes::Jump(addr) => {
                self.mem.set_pc(addr);
            }
            OpCodes::SetRegister(vx, nn) => {
                self.regs.set_register(vx, nn);
            }
            OpCodes::AddToRegister(vx, nn) => {
                self.regs.add_to_register(vx, nn);
            }
            OpCodes::SetIndexRegister(addr) => self.mem.set_index(addr),
            OpCodes::ClearScreen => {
                self.fb.clear_buffer();
            }
            OpCodes::Display(reg_x, reg_y, height) => {
                let (x, y) = (self.regs.get(reg_x), self.regs.get(reg_y));
                // rows I..I+N, one byte (8 pixels) each
                let sprite = self.mem.slice(self.mem.index.addr(), height as usize)?;
                let collision = self.fb.paint(x, y, sprite);
                self.regs.set_flag(collision);
            }
            OpCodes::PushSubroutine(addr) => {
                // pc already points at the instruction after the call
                if !self.mem.stack.push(self.mem.pc.0) {
                    return Err(EmuError::StackOverflow { pc });
                }
                self.mem.set_pc(addr);
            }
            OpCodes::PopSubroutine => {
                let addr = self
                    .mem
                    .stack
                    .pop()
                    .ok_or(EmuError::StackUnderflow { pc })?;
                self.mem.set_pc(addr);
            }
            OpCodes::CopyRegister(vx, vy) => {
                self.regs.set_register(vx, self.regs.get(vy));
            }
            OpCodes::Or(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) | self.regs.get(vx));
            }
            OpCodes::And(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) & self.regs.get(vx));
            }
            OpCodes::XOr(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) ^ self.regs.get(vx));
            }
            // flags are computed from the operands before VX is written, and
            // written last so they win when X is F
            OpCodes::Add(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                let (sum, carry) = x.overflowing_add(y);
                self.regs.set_register(vx, sum);
                self.regs.set_flag(carry);
            }
            OpCodes::SubtractForward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, x.wrapping_sub(y));
                self.regs.set_flag(x > y);
            }
            OpCodes::SubtractBackward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, y.wrapping_sub(x));
                self.regs.set_flag(y > x);
            }
            OpCodes::LeftShift(vx, _) => {
                let vx_value = self.regs.get(vx);

                let vf = (vx_value >> 7) & 1;
                let vx_value = vx_value << 1;

                self.regs.set_register(vx, vx_value);
                self.regs.set_register(0xf, vf);
            }
            OpCodes::RightShift(vx, _) => {
                let vx_value = self.regs.get(vx);

                let vf = vx_value & 1;
                let vx_value = vx_value >> 1;

                self.regs.set_register(vx, vx_value);
                self.regs.set_register(0xf, vf);
            }
            OpCodes::Random(vx, nn) => {
                let ransuu: u8 = self.rng.gen();
                self.regs.set_register(vx, nn & ransuu);
            }
            OpCodes::JumpWithOffset(addr) => {
                // may leave memory, which faults on the next fetch
                self.mem.set_pc(addr + self.regs.get(0) as u16);
            }
            OpCodes::AddToIndex(vx) => {
                self.mem
                    .set_index(self.mem.index.0.wrapping_add(self.regs.get(vx) as u16));
            }
            OpCodes::SkipEqualConstant(vx, nn) => {
                if self.regs.get(vx) == nn {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SkipNotEqualConstant(vx, nn) => {
                if self.regs.get(vx) != nn {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SkipEqualRegister(vx, vy) => {
                if self.regs.get(vx) == self.regs.get(vy) {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SkipNotEqualRegister(vx, vy) => {
                if self.regs.get(vx) != self.regs.get(vy) {
                    self.mem.increment_pc();
                }
            }
            OpCodes::PointChar(vx) => {
                let addr = FONT_START as u16 + self.regs.get(vx) as u16 * FONT_GLYPH_LEN;
                self.mem.set_index(addr);
            }
            OpCodes::ToDecimal(vx) => {
                let value = self.regs.get(vx);
                let start = self.mem.index.addr();
                // reject before writing anything
                self.mem.slice(start, 3)?;
                let digits = [value / 100, (value / 10) % 10, value % 10];
                for (i, digit) in digits.into_iter().enumerate() {
                    self.mem.set(start + i, digit)?;
                }
            }
            OpCodes::SkipIfPressed(vx) => {
                if self.keypad.is_pressed(self.regs.get(vx)) {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SkipIfNotPressed(vx) => {
                if !self.keypad.is_pressed(self.regs.get(vx)) {
                    self.mem.increment_pc();
                }
            }
            OpCodes::CopyDelayToRegister(vx) => {
                self.regs.set_register(vx, self.timers.delay.count)
            }
            OpCodes::CopyRegisterToDelay(vx) => self.timers.delay.set(self.regs.get(vx)),
            OpCodes::CopyRegisterToSound(vx) => self.timers.sound.set(self.regs.get(vx)),
            OpCodes::GetKey(vx) => {
                debug!("waiting for key into V{vx:X}");
                self.state = CpuState::WaitingForKey(vx);
            }
            OpCodes::LoadRegisterFromMemory(vx) => {
                let values = self.mem.slice(self.mem.index.addr(), vx as usize + 1)?;
                for (reg, reg_val) in values.iter().enumerate() {
                    self.regs.set_register(reg as u8, *reg_val);
                }
            }
            OpCodes::StoreRegisterToMemory(vx) => {
                let start = self.mem.index.addr();
                self.mem.slice(start, vx as usize + 1)?;
                for reg in 0..=vx {
                    self.mem.set(start + reg as usize, self.regs.get(reg))?;
                }
            }
        }
        Ok(())
    }

    /// Applies a keypad change. A key going down resumes a pending FX0A.
    pub fn apply_input(&mut self, update: KeyUpdate) {
        let Some(key) = self.keypad.apply(update) else {
            return;
        };
        if let CpuState::WaitingForKey(vx) = self.state {
            debug!("key {key:X} pressed, resuming with V{vx:X} = {key:X}");
            self.regs.set_register(vx, key);
            self.state = CpuState::Running;
        }
    }

    pub fn sync_timers(&mut self) {
        self.timers.tick();
    }

    pub fn sound_active(&self) -> bool {
        self.timers.sound.is_active()
    }

    /// The framebuffer, if it changed since the last call.
    pub fn take_frame(&mut self) -> Option<&FrameBuffer> {
        if self.fb.take_dirty() {
            Some(&self.fb)
        } else {
            None
        }
    }
}
