use crate::memory::{TypeAddr, PROGRAM_START};

pub const REGISTER_COUNT: usize = 16;
pub const FLAG: u8 = 0xF;

/// V0..VF. VF is an ordinary slot here; instructions that use it as a flag
/// write it explicitly after their result.
#[derive(Debug, Default, Clone)]
pub struct Registers {
    registers: [u8; REGISTER_COUNT],
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_register(&mut self, reg_num: u8, value: u8) {
        self.registers[reg_num as usize & 0xF] = value;
    }

    pub fn add_to_register(&mut self, reg_num: u8, value: u8) {
        let total = self.get(reg_num).wrapping_add(value);
        self.set_register(reg_num, total);
    }

    pub fn get(&self, reg_num: u8) -> u8 {
        self.registers[reg_num as usize & 0xF]
    }

    pub fn set_flag(&mut self, flag: bool) {
        self.set_register(FLAG, flag as u8);
    }
}

// Special registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCounter(pub TypeAddr);

impl Default for ProgramCounter {
    fn default() -> Self {
        Self(PROGRAM_START as TypeAddr)
    }
}

impl ProgramCounter {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(2);
    }

    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexRegister(pub TypeAddr);

impl IndexRegister {
    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }

    /// I widened so offsets from it can be range checked.
    pub fn addr(&self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_wraps_without_touching_flag() {
        let mut regs = Registers::new();
        regs.set_register(0xF, 7);
        regs.set_register(2, 250);
        regs.add_to_register(2, 10);
        assert_eq!(regs.get(2), 4);
        assert_eq!(regs.get(0xF), 7);
    }

    #[test]
    fn pc_starts_at_program() {
        let mut pc = ProgramCounter::default();
        assert_eq!(pc.0, 0x200);
        pc.increment();
        assert_eq!(pc.0, 0x202);
    }
}
