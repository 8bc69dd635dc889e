use std::{io, path::PathBuf};

use crate::memory::TypeAddr;

#[derive(Debug, thiserror::Error)]
pub enum EmuError {
    #[error("unable to read rom {path:?}: {source}")]
    RomRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("rom is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    #[error("unknown instruction {word:#06X} at pc {pc:#05X}")]
    DecodeFault { pc: TypeAddr, word: u16 },

    #[error("stack overflow: call at pc {pc:#05X} with all 16 slots in use")]
    StackOverflow { pc: TypeAddr },

    #[error("stack underflow: return at pc {pc:#05X} with an empty stack")]
    StackUnderflow { pc: TypeAddr },

    #[error("memory access out of range at address {addr:#06X}")]
    AddressOutOfRange { addr: usize },

    #[error("cpu is halted")]
    Halted,

    #[error("window error: {0}")]
    Window(String),
}

impl EmuError {
    /// Faults raised by the running program, as opposed to host or loading errors.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::DecodeFault { .. }
                | Self::StackOverflow { .. }
                | Self::StackUnderflow { .. }
                | Self::AddressOutOfRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EmuError>;
