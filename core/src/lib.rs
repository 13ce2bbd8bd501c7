pub use chip8::{Chip8, StepOutcome, TimerOutcome};
pub use config::{Config, Quirks};
pub use constants::{CLOCK_HZ, TIMER_HZ};
pub use error::{DecodeWarning, Fault, LoadError};
pub use render::render_text;

mod chip8;
mod config;
pub mod constants;
mod error;
mod instruction;
mod opcode;
mod operations;
mod render;
pub mod state;
