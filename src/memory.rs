use std::{fs, path::Path};

use log::info;

use crate::{
    errors::{EmuError, Result},
    registers::{IndexRegister, ProgramCounter},
};

pub type TypeAddr = u16; // in reality u12

pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_START: usize = 0x200;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START;
pub const FONT_START: usize = 0x000;
pub const FONT_GLYPH_LEN: u16 = 5;
pub const STACK_DEPTH: usize = 16;

type FontBytes = [u8; 5 * 16];

const DEFAULT_FONT: FontBytes = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

pub struct Memory {
    // 4k bytes
    // font glyphs at 000 -> 04F, program from 200
    bytes: [u8; MEMORY_SIZE],
    pub pc: ProgramCounter,
    pub index: IndexRegister,
    pub stack: Stack,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        let mut bytes = [0; MEMORY_SIZE];
        bytes[FONT_START..FONT_START + DEFAULT_FONT.len()].copy_from_slice(&DEFAULT_FONT);
        Self {
            bytes,
            pc: ProgramCounter::default(),
            index: IndexRegister::default(),
            stack: Stack::new(),
        }
    }

    pub fn set(&mut self, addr: usize, val: u8) -> Result<()> {
        let slot = self
            .bytes
            .get_mut(addr)
            .ok_or(EmuError::AddressOutOfRange { addr })?;
        *slot = val;
        Ok(())
    }

    pub fn get(&self, addr: usize) -> Result<u8> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(EmuError::AddressOutOfRange { addr })
    }

    /// `len` bytes starting at `start`, rejected whole if any byte falls outside memory.
    pub fn slice(&self, start: usize, len: usize) -> Result<&[u8]> {
        let end = start + len;
        if end > MEMORY_SIZE {
            return Err(EmuError::AddressOutOfRange { addr: end - 1 });
        }
        Ok(&self.bytes[start..end])
    }

    /// Big-endian word at `pc`, without moving it.
    pub fn fetch(&self) -> Result<u16> {
        let addr = self.pc.0 as usize;
        let (l, r) = (self.get(addr)?, self.get(addr + 1)?);
        Ok(((l as u16) << 8) | r as u16)
    }

    pub fn increment_pc(&mut self) {
        self.pc.increment();
    }

    pub fn set_pc(&mut self, addr: TypeAddr) {
        self.pc.set_addr(addr);
    }

    pub fn set_index(&mut self, addr: TypeAddr) {
        self.index.set_addr(addr);
    }

    // loads program instructions starting at address 0x200
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > MAX_ROM_SIZE {
            return Err(EmuError::RomTooLarge {
                size: bytes.len(),
                max: MAX_ROM_SIZE,
            });
        }
        self.bytes[PROGRAM_START..PROGRAM_START + bytes.len()].copy_from_slice(bytes);
        info!("loaded rom of {} bytes at {:#05x}", bytes.len(), PROGRAM_START);
        Ok(())
    }

    pub fn load_rom_by_file(&mut self, path: &Path) -> Result<()> {
        let program = fs::read(path).map_err(|source| EmuError::RomRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_rom(program.as_slice())
    }
}

/// Return addresses for 2NNN/00EE. `sp` is the next free slot.
pub struct Stack {
    addresses: [TypeAddr; STACK_DEPTH],
    sp: usize,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    pub fn new() -> Self {
        Self {
            addresses: [0; STACK_DEPTH],
            sp: 0,
        }
    }

    /// Returns false, leaving the stack untouched, when every slot is taken.
    pub fn push(&mut self, addr: TypeAddr) -> bool {
        if self.sp == STACK_DEPTH {
            return false;
        }
        self.addresses[self.sp] = addr;
        self.sp += 1;
        true
    }

    pub fn pop(&mut self) -> Option<TypeAddr> {
        if self.sp == 0 {
            return None;
        }
        self.sp -= 1;
        Some(self.addresses[self.sp])
    }

    pub fn sp(&self) -> usize {
        self.sp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_is_preloaded_at_zero() {
        let mem = Memory::new();
        assert_eq!(mem.slice(0, 5).unwrap(), &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        // glyph F
        assert_eq!(mem.get(0x4F).unwrap(), 0x80);
        assert_eq!(mem.get(0x50).unwrap(), 0x00);
    }

    #[test]
    fn rom_lands_at_program_start() {
        let mut mem = Memory::new();
        mem.load_rom(&[0x12, 0x34, 0x56]).unwrap();
        assert_eq!(mem.fetch().unwrap(), 0x1234);
        assert_eq!(mem.get(0x202).unwrap(), 0x56);
    }

    #[test]
    fn rom_size_bounds() {
        let mut mem = Memory::new();
        assert!(mem.load_rom(&vec![0xAA; MAX_ROM_SIZE]).is_ok());
        assert_eq!(mem.get(MEMORY_SIZE - 1).unwrap(), 0xAA);

        let err = mem.load_rom(&vec![0; MAX_ROM_SIZE + 1]).unwrap_err();
        assert!(matches!(err, EmuError::RomTooLarge { size: 3585, max: 3584 }));
    }

    #[test]
    fn missing_rom_file_is_reported() {
        let mut mem = Memory::new();
        let err = mem
            .load_rom_by_file(Path::new("/nonexistent/definitely/missing.ch8"))
            .unwrap_err();
        assert!(matches!(err, EmuError::RomRead { .. }));
    }

    #[test]
    fn out_of_range_access_is_rejected() {
        let mut mem = Memory::new();
        assert!(matches!(
            mem.set(MEMORY_SIZE, 1),
            Err(EmuError::AddressOutOfRange { addr: 4096 })
        ));
        assert!(mem.get(MEMORY_SIZE).is_err());
        assert!(mem.slice(MEMORY_SIZE - 2, 3).is_err());
        assert!(mem.slice(MEMORY_SIZE - 3, 3).is_ok());

        mem.set_pc(0xFFF);
        assert!(matches!(
            mem.fetch(),
            Err(EmuError::AddressOutOfRange { addr: 4096 })
        ));
    }

    #[test]
    fn stack_is_bounded() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), None);
        for i in 0..STACK_DEPTH {
            assert!(stack.push(0x200 + i as u16 * 2));
        }
        assert!(!stack.push(0x300));
        assert_eq!(stack.sp(), STACK_DEPTH);
        assert_eq!(stack.pop(), Some(0x21E));
        assert_eq!(stack.sp(), STACK_DEPTH - 1);
    }
}
