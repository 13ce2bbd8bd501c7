/// Behaviors that differ between interpreters of the same opcode
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quirks {
    /// `FX1E` (I += Vx) sets VF to 1 when I passes 0xFFF and to 0 otherwise.
    /// Canonical interpreters leave VF alone.
    pub index_overflow_flag: bool,
}

impl Quirks {
    /// Only the operations every interpreter agrees on
    pub fn strict() -> Self {
        Quirks {
            index_overflow_flag: false,
        }
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            index_overflow_flag: true,
        }
    }
}

/// Settings that survive `reset`
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    pub quirks: Quirks,
    /// Seeds the random source on every reset; entropy from the OS when `None`
    pub seed: Option<u64>,
}
