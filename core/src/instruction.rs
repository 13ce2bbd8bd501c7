use rand::Rng;

use crate::config::Quirks;
use crate::constants::KEY_COUNT;
use crate::error::{DecodeWarning, Fault};
use crate::opcode::Opcode;
use crate::operations::*;
use crate::state::State;

/// A decoded Chip-8 instruction with its operands pulled out of the opcode
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Clear,
    /// 00EE
    Return,
    /// 1nnn
    Jump(u16),
    /// 2nnn
    Call(u16),
    /// 3xnn
    SkipEqual { x: u8, nn: u8 },
    /// 4xnn
    SkipNotEqual { x: u8, nn: u8 },
    /// 5xy0
    SkipRegistersEqual { x: u8, y: u8 },
    /// 6xnn
    Load { x: u8, nn: u8 },
    /// 7xnn
    Add { x: u8, nn: u8 },
    /// 8xy0
    Move { x: u8, y: u8 },
    /// 8xy1
    Or { x: u8, y: u8 },
    /// 8xy2
    And { x: u8, y: u8 },
    /// 8xy3
    Xor { x: u8, y: u8 },
    /// 8xy4
    AddCarry { x: u8, y: u8 },
    /// 8xy5
    Sub { x: u8, y: u8 },
    /// 8xy6
    ShiftRight { x: u8 },
    /// 8xy7
    SubReverse { x: u8, y: u8 },
    /// 8xyE
    ShiftLeft { x: u8 },
    /// 9xy0
    SkipRegistersNotEqual { x: u8, y: u8 },
    /// Annn
    LoadIndex(u16),
    /// Bnnn
    JumpOffset(u16),
    /// Cxnn
    Random { x: u8, nn: u8 },
    /// Dxyn
    Draw { x: u8, y: u8, n: u8 },
    /// Ex9E
    SkipKeyPressed { x: u8 },
    /// ExA1
    SkipKeyReleased { x: u8 },
    /// Fx07
    LoadDelay { x: u8 },
    /// Fx0A
    WaitKey { x: u8 },
    /// Fx15
    SetDelay { x: u8 },
    /// Fx18
    SetSound { x: u8 },
    /// Fx1E
    AddIndex { x: u8 },
    /// Fx29
    LoadGlyph { x: u8 },
    /// Fx33
    StoreBcd { x: u8 },
    /// Fx55
    StoreRegisters { x: u8 },
    /// Fx65
    LoadRegisters { x: u8 },
}

/// Everything outside of `State` an instruction may look at
pub struct Context<'a, R: Rng> {
    pub keys: &'a [bool; KEY_COUNT],
    pub rng: &'a mut R,
    pub quirks: Quirks,
}

impl Instruction {
    /// Selects the correct Instruction for a given Opcode
    pub fn decode(op: u16) -> Result<Instruction, DecodeWarning> {
        let (x, y, n, nn, nnn) = (op.x(), op.y(), op.n(), op.nn(), op.nnn());
        let instruction = match op.nibbles() {
            (0x0, 0x0, 0xE, 0x0) => Instruction::Clear,
            (0x0, 0x0, 0xE, 0xE) => Instruction::Return,
            (0x1, ..) => Instruction::Jump(nnn),
            (0x2, ..) => Instruction::Call(nnn),
            (0x3, ..) => Instruction::SkipEqual { x, nn },
            (0x4, ..) => Instruction::SkipNotEqual { x, nn },
            (0x5, .., 0x0) => Instruction::SkipRegistersEqual { x, y },
            (0x6, ..) => Instruction::Load { x, nn },
            (0x7, ..) => Instruction::Add { x, nn },
            (0x8, .., 0x0) => Instruction::Move { x, y },
            (0x8, .., 0x1) => Instruction::Or { x, y },
            (0x8, .., 0x2) => Instruction::And { x, y },
            (0x8, .., 0x3) => Instruction::Xor { x, y },
            (0x8, .., 0x4) => Instruction::AddCarry { x, y },
            (0x8, .., 0x5) => Instruction::Sub { x, y },
            (0x8, .., 0x6) => Instruction::ShiftRight { x },
            (0x8, .., 0x7) => Instruction::SubReverse { x, y },
            (0x8, .., 0xE) => Instruction::ShiftLeft { x },
            (0x9, .., 0x0) => Instruction::SkipRegistersNotEqual { x, y },
            (0xA, ..) => Instruction::LoadIndex(nnn),
            (0xB, ..) => Instruction::JumpOffset(nnn),
            (0xC, ..) => Instruction::Random { x, nn },
            (0xD, ..) => Instruction::Draw { x, y, n },
            (0xE, _, 0x9, 0xE) => Instruction::SkipKeyPressed { x },
            (0xE, _, 0xA, 0x1) => Instruction::SkipKeyReleased { x },
            (0xF, _, 0x0, 0x7) => Instruction::LoadDelay { x },
            (0xF, _, 0x0, 0xA) => Instruction::WaitKey { x },
            (0xF, _, 0x1, 0x5) => Instruction::SetDelay { x },
            (0xF, _, 0x1, 0x8) => Instruction::SetSound { x },
            (0xF, _, 0x1, 0xE) => Instruction::AddIndex { x },
            (0xF, _, 0x2, 0x9) => Instruction::LoadGlyph { x },
            (0xF, _, 0x3, 0x3) => Instruction::StoreBcd { x },
            (0xF, _, 0x5, 0x5) => Instruction::StoreRegisters { x },
            (0xF, _, 0x6, 0x5) => Instruction::LoadRegisters { x },
            _ => return Err(DecodeWarning::UnknownOpcode(op)),
        };
        Ok(instruction)
    }

    /// Produces the state that follows `state` once this instruction has run
    pub fn execute<R: Rng>(self, state: &State, ctx: &mut Context<R>) -> Result<State, Fault> {
        let next = match self {
            Instruction::Clear => clr(state),
            Instruction::Return => rts(state)?,
            Instruction::Jump(nnn) => jump(state, nnn),
            Instruction::Call(nnn) => call(state, nnn)?,
            Instruction::SkipEqual { x, nn } => ske(state, x, nn),
            Instruction::SkipNotEqual { x, nn } => skne(state, x, nn),
            Instruction::SkipRegistersEqual { x, y } => skre(state, x, y),
            Instruction::Load { x, nn } => load(state, x, nn),
            Instruction::Add { x, nn } => add(state, x, nn),
            Instruction::Move { x, y } => mv(state, x, y),
            Instruction::Or { x, y } => or(state, x, y),
            Instruction::And { x, y } => and(state, x, y),
            Instruction::Xor { x, y } => xor(state, x, y),
            Instruction::AddCarry { x, y } => addr(state, x, y),
            Instruction::Sub { x, y } => sub(state, x, y),
            Instruction::ShiftRight { x } => shr(state, x),
            Instruction::SubReverse { x, y } => subn(state, x, y),
            Instruction::ShiftLeft { x } => shl(state, x),
            Instruction::SkipRegistersNotEqual { x, y } => skrne(state, x, y),
            Instruction::LoadIndex(nnn) => loadi(state, nnn),
            Instruction::JumpOffset(nnn) => jumpi(state, nnn),
            Instruction::Random { x, nn } => rand(state, x, nn, &mut *ctx.rng),
            Instruction::Draw { x, y, n } => draw(state, x, y, n)?,
            Instruction::SkipKeyPressed { x } => skpr(state, x, ctx.keys)?,
            Instruction::SkipKeyReleased { x } => skup(state, x, ctx.keys)?,
            Instruction::LoadDelay { x } => moved(state, x),
            Instruction::WaitKey { x } => keyd(state, x),
            Instruction::SetDelay { x } => loads(state, x),
            Instruction::SetSound { x } => ld(state, x),
            Instruction::AddIndex { x } => addi(state, x, ctx.quirks)?,
            Instruction::LoadGlyph { x } => ldspr(state, x)?,
            Instruction::StoreBcd { x } => bcd(state, x)?,
            Instruction::StoreRegisters { x } => stor(state, x)?,
            Instruction::LoadRegisters { x } => read(state, x)?,
        };
        Ok(next)
    }
}
