use crate::constants::{
    DISPLAY_SIZE, DISPLAY_WIDTH, MEMORY_SIZE, PROGRAM_START, REGISTER_COUNT, SPRITE_SHEET,
    STACK_DEPTH,
};

/// A snapshot of the Chip-8 internal state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the flag register written by arithmetic, shifts and draws
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Pointer
/// - (sp) the number of return addresses on the stack, 0..=16
///
/// Timers
/// - 2 8-bit timers (delay & sound) that count down at 60Hz
/// - The sound timer beeps when it runs out
///
/// ## Memory
/// - 16 level stack of return addresses
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the font sprite sheet
///     - 0x000..0x200 is reserved for the interpreter
///     - 0x200..0x1000 holds the program and its working RAM
/// - 64x32 frame buffer, one byte (0 or 1) per pixel
///
/// ## Input
/// - Emulation pauses in `Mode::WaitingForKey` until some key is pressed
#[derive(Copy, Clone)]
pub struct State {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_DEPTH],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub mode: Mode,
}

impl State {
    /// A freshly reset machine: everything zeroed apart from the sprite sheet,
    /// the program counter parked at the load address and a pending redraw.
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[0..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_DEPTH],
            memory,
            frame_buffer: [0; DISPLAY_SIZE],
            draw_flag: true,
            mode: Mode::Running,
        }
    }

    /// The pixel at column `x`, row `y`
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.frame_buffer[y * DISPLAY_WIDTH + x]
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// What the next call to `step` will do
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Fetch, decode and execute the instruction at PC
    Running,
    /// Poll the keypad; the first pressed key is stored in the given register
    WaitingForKey(u8),
}

/// The FrameBuffer is stored row-major: pixel (x, y) lives at y * 64 + x
pub type FrameBuffer = [u8; DISPLAY_SIZE];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PROGRAM_START;

    #[test]
    fn test_new_state_is_reset() {
        let state = State::new();
        assert_eq!(state.v, [0; 16]);
        assert_eq!(state.i, 0);
        assert_eq!(state.sp, 0);
        assert_eq!(state.delay_timer, 0);
        assert_eq!(state.sound_timer, 0);
        assert_eq!(state.pc, PROGRAM_START);
        assert_eq!(state.mode, Mode::Running);
        assert!(state.draw_flag);
    }

    #[test]
    fn test_new_state_loads_sprite_sheet() {
        let state = State::new();
        assert_eq!(state.memory[0..80], SPRITE_SHEET[..]);
        assert!(state.memory[80..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pixel_is_row_major() {
        let mut state = State::new();
        state.frame_buffer[2 * 64 + 5] = 1;
        assert_eq!(state.pixel(5, 2), 1);
        assert_eq!(state.pixel(2, 5), 0);
    }
}
