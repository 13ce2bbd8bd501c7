use thiserror::Error;

/// Reasons a ROM could not be loaded.
/// Either way no ROM bytes end up in memory.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("ROM is {size} bytes but at most {max} bytes fit in program memory")]
    CapacityExceeded { size: usize, max: usize },

    #[error("unable to read ROM: {0}")]
    SourceUnavailable(#[from] std::io::Error),
}

/// Something odd about an instruction that doesn't stop execution
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    #[error("unknown opcode {0:#06X}")]
    UnknownOpcode(u16),
}

/// A step that can't be carried out without corrupting the machine.
/// The engine halts on the first fault and keeps reporting it until it is reset.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum Fault {
    #[error("stack overflow: subroutine calls nested deeper than 16")]
    StackOverflow,

    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,

    #[error("address {address:#06X} is outside of usable memory")]
    AddressOutOfRange { address: usize },

    #[error("key {key:#04X} is not on the keypad")]
    KeyOutOfRange { key: u8 },

    #[error("there is no font glyph for {digit:#04X}")]
    GlyphOutOfRange { digit: u8 },
}
