use std::fmt;

use crate::memory::TypeAddr;

pub struct RawInstruction {
    code: u16,
    i: u8,
}

impl RawInstruction {
    pub fn new(code: u16) -> Self {
        RawInstruction { code, i: 1 }
    }
    // n is starting digit, m is length
    pub fn nth_m_digits(&self, n: u8, m: u8) -> u16 {
        // 0110 1100 1111 0001
        // -------------------
        // 1111 1111 1111 1111
        //      1111 1111 1111
        //           1111 1111
        //                1111
        //
        // 4 - (m) - (n - 1), n = 2
        let shift_places = (4 - m - (n - 1)) * 4;
        let mut mask = 0;
        for _ in 0..m {
            mask = (mask << 4) | 0b1111;
        }
        (self.code & (mask << shift_places)) >> shift_places
    }

    // iterator like methods for decoding convenience, digits are consumed left to right
    pub fn start_identifier(&mut self) -> u8 {
        debug_assert_eq!(self.i, 1);
        self.take(1) as u8
    }

    pub fn next_register(&mut self) -> u8 {
        self.take(1) as u8
    }

    pub fn next_address(&mut self) -> TypeAddr {
        self.take(3)
    }

    pub fn next_u8(&mut self) -> u8 {
        self.take(2) as u8
    }

    pub fn next_u4(&mut self) -> u8 {
        self.next_register()
    }

    fn take(&mut self, m: u8) -> u16 {
        debug_assert!(self.i + m <= 5, "instruction only has 4 digits");
        let value = self.nth_m_digits(self.i, m);
        self.i += m;
        value
    }
}

/// Register named by the second nibble.
pub fn x_index(word: u16) -> u8 {
    ((word >> 8) & 0xF) as u8
}

/// Register named by the third nibble.
pub fn y_index(word: u16) -> u8 {
    ((word >> 4) & 0xF) as u8
}

#[test]
fn test_bit_manip() {
    assert_eq!(RawInstruction::new(0x4CEE).nth_m_digits(2, 1), 0xC);
    assert_eq!(RawInstruction::new(0x4CEE).nth_m_digits(3, 1), 0xE);
    assert_eq!(RawInstruction::new(0x4CEE).nth_m_digits(1, 1), 0x4);

    assert_eq!(RawInstruction::new(0x4CEE).nth_m_digits(1, 2), 0x4C);
    assert_eq!(RawInstruction::new(0x4CEE).nth_m_digits(2, 2), 0xCE);
    assert_eq!(RawInstruction::new(0x4CEE).nth_m_digits(2, 3), 0xCEE);
}

#[test]
fn test_operand_indices() {
    assert_eq!(x_index(0x8AB4), 0xA);
    assert_eq!(y_index(0x8AB4), 0xB);
    assert_eq!(x_index(0xFF65), 0xF);
    assert_eq!(y_index(0x0000), 0x0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCodes {
    // 00E0
    // turn all pixels to 0
    ClearScreen,
    // 1NNN
    // set PC to address NNN, "jump" to memory location
    Jump(TypeAddr),
    // 6XNN
    // set register VX to value NN
    SetRegister(u8, u8),
    // 7XNN
    // add value NN to VX, wrapping, VF untouched
    AddToRegister(u8, u8),
    // ANNN
    // set index register I to address NNN
    SetIndexRegister(TypeAddr),
    // DXYN
    // draw an N pixel tall sprite starting at I
    // at Coordinates (VX, VY), wrapping around the screen
    // XOR pixels on screen using sprite data
    // if any set pixel was hit: VF set to 1
    Display(u8, u8, u8),

    // 2NNN
    PushSubroutine(TypeAddr),
    // 00EE
    PopSubroutine,

    // 3XNN
    SkipEqualConstant(u8, u8),
    // 4XNN
    SkipNotEqualConstant(u8, u8),
    // 5XY0
    SkipEqualRegister(u8, u8),
    // 9XY0
    SkipNotEqualRegister(u8, u8),

    // 8XY0
    CopyRegister(u8, u8),
    // 8XY1
    Or(u8, u8),
    // 8XY2
    And(u8, u8),
    // 8XY3
    XOr(u8, u8),
    /// 8XY4
    Add(u8, u8),
    // 8XY5
    SubtractForward(u8, u8),
    // 8XY7
    SubtractBackward(u8, u8),
    // 8XYE
    LeftShift(u8, u8),
    // 8XY6
    RightShift(u8, u8),

    // BNNN
    JumpWithOffset(TypeAddr),
    // CXNN
    Random(u8, u8),

    // EX9E
    SkipIfPressed(u8),
    // EXA1
    SkipIfNotPressed(u8),

    // FX07
    CopyDelayToRegister(u8),
    // FX15
    CopyRegisterToDelay(u8),
    // FX18
    CopyRegisterToSound(u8),

    // FX1E
    AddToIndex(u8),
    // FX0A
    GetKey(u8),
    // FX29
    PointChar(u8),
    // FX33
    ToDecimal(u8),

    // FX65
    LoadRegisterFromMemory(u8),
    // FX55
    StoreRegisterToMemory(u8),
}

impl OpCodes {
    /// `None` when the word matches no instruction, including undefined
    /// sub-nibbles inside a known family.
    pub fn decode_raw(ins: u16) -> Option<Self> {
        let mut raw = RawInstruction::new(ins);

        let op = match raw.start_identifier() {
            0x0 => match ins {
                0x00E0 => Self::ClearScreen,
                0x00EE => Self::PopSubroutine,
                _ => return None,
            },
            0x1 => Self::Jump(raw.next_address()),
            0x2 => Self::PushSubroutine(raw.next_address()),
            0x3 => Self::SkipEqualConstant(raw.next_register(), raw.next_u8()),
            0x4 => Self::SkipNotEqualConstant(raw.next_register(), raw.next_u8()),
            0x5 => {
                let (x, y) = (x_index(ins), y_index(ins));
                match raw.nth_m_digits(4, 1) {
                    0x0 => Self::SkipEqualRegister(x, y),
                    _ => return None,
                }
            }
            0x6 => Self::SetRegister(raw.next_register(), raw.next_u8()),
            0x7 => Self::AddToRegister(raw.next_register(), raw.next_u8()),
            0x8 => {
                let (x, y) = (x_index(ins), y_index(ins));
                let alu_type = raw.nth_m_digits(4, 1);
                match alu_type {
                    0x0 => Self::CopyRegister(x, y),
                    0x1 => Self::Or(x, y),
                    0x2 => Self::And(x, y),
                    0x3 => Self::XOr(x, y),
                    0x4 => Self::Add(x, y),
                    0x5 => Self::SubtractForward(x, y),
                    0x6 => Self::RightShift(x, y),
                    0x7 => Self::SubtractBackward(x, y),
                    0xE => Self::LeftShift(x, y),
                    _ => return None,
                }
            }
            0x9 => {
                let (x, y) = (x_index(ins), y_index(ins));
                match raw.nth_m_digits(4, 1) {
                    0x0 => Self::SkipNotEqualRegister(x, y),
                    _ => return None,
                }
            }
            0xA => Self::SetIndexRegister(raw.next_address()),
            0xB => Self::JumpWithOffset(raw.next_address()),
            0xC => Self::Random(raw.next_register(), raw.next_u8()),
            0xD => Self::Display(raw.next_register(), raw.next_register(), raw.next_u4()),
            0xE => {
                let x = raw.next_register();
                let k_type = raw.next_u8();
                match k_type {
                    0x9E => Self::SkipIfPressed(x),
                    0xA1 => Self::SkipIfNotPressed(x),
                    _ => return None,
                }
            }
            0xF => {
                let x = raw.next_register();
                let f_type = raw.next_u8();
                match f_type {
                    0x07 => Self::CopyDelayToRegister(x),
                    0x0A => Self::GetKey(x),
                    0x15 => Self::CopyRegisterToDelay(x),
                    0x18 => Self::CopyRegisterToSound(x),
                    0x1E => Self::AddToIndex(x),
                    0x29 => Self::PointChar(x),
                    0x33 => Self::ToDecimal(x),
                    0x55 => Self::StoreRegisterToMemory(x),
                    0x65 => Self::LoadRegisterFromMemory(x),
                    _ => return None,
                }
            }
            _ => unreachable!("identifier is a single nibble"),
        };
        Some(op)
    }
}

// Disassembly, used when tracing execution
impl fmt::Display for OpCodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ClearScreen => write!(f, "CLS"),
            Self::PopSubroutine => write!(f, "RET"),
            Self::Jump(addr) => write!(f, "JP {addr:#05X}"),
            Self::PushSubroutine(addr) => write!(f, "CALL {addr:#05X}"),
            Self::SkipEqualConstant(x, nn) => write!(f, "SE V{x:X}, {nn:#04X}"),
            Self::SkipNotEqualConstant(x, nn) => write!(f, "SNE V{x:X}, {nn:#04X}"),
            Self::SkipEqualRegister(x, y) => write!(f, "SE V{x:X}, V{y:X}"),
            Self::SkipNotEqualRegister(x, y) => write!(f, "SNE V{x:X}, V{y:X}"),
            Self::SetRegister(x, nn) => write!(f, "LD V{x:X}, {nn:#04X}"),
            Self::AddToRegister(x, nn) => write!(f, "ADD V{x:X}, {nn:#04X}"),
            Self::CopyRegister(x, y) => write!(f, "LD V{x:X}, V{y:X}"),
            Self::Or(x, y) => write!(f, "OR V{x:X}, V{y:X}"),
            Self::And(x, y) => write!(f, "AND V{x:X}, V{y:X}"),
            Self::XOr(x, y) => write!(f, "XOR V{x:X}, V{y:X}"),
            Self::Add(x, y) => write!(f, "ADD V{x:X}, V{y:X}"),
            Self::SubtractForward(x, y) => write!(f, "SUB V{x:X}, V{y:X}"),
            Self::RightShift(x, y) => write!(f, "SHR V{x:X}, V{y:X}"),
            Self::SubtractBackward(x, y) => write!(f, "SUBN V{x:X}, V{y:X}"),
            Self::LeftShift(x, y) => write!(f, "SHL V{x:X}, V{y:X}"),
            Self::SetIndexRegister(addr) => write!(f, "LD I, {addr:#05X}"),
            Self::JumpWithOffset(addr) => write!(f, "JP V0, {addr:#05X}"),
            Self::Random(x, nn) => write!(f, "RND V{x:X}, {nn:#04X}"),
            Self::Display(x, y, n) => write!(f, "DRW V{x:X}, V{y:X}, {n}"),
            Self::SkipIfPressed(x) => write!(f, "SKP V{x:X}"),
            Self::SkipIfNotPressed(x) => write!(f, "SKNP V{x:X}"),
            Self::CopyDelayToRegister(x) => write!(f, "LD V{x:X}, DT"),
            Self::GetKey(x) => write!(f, "LD V{x:X}, K"),
            Self::CopyRegisterToDelay(x) => write!(f, "LD DT, V{x:X}"),
            Self::CopyRegisterToSound(x) => write!(f, "LD ST, V{x:X}"),
            Self::AddToIndex(x) => write!(f, "ADD I, V{x:X}"),
            Self::PointChar(x) => write!(f, "LD F, V{x:X}"),
            Self::ToDecimal(x) => write!(f, "LD B, V{x:X}"),
            Self::StoreRegisterToMemory(x) => write!(f, "LD [I], V{x:X}"),
            Self::LoadRegisterFromMemory(x) => write!(f, "LD V{x:X}, [I]"),
        }
    }
}
