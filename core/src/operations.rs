use std::ops::Range;

use rand::Rng;

use crate::config::Quirks;
use crate::constants::{
    ADDRESS_MASK, DISPLAY_HEIGHT, DISPLAY_SIZE, DISPLAY_WIDTH, GLYPH_HEIGHT, KEY_COUNT,
    MEMORY_SIZE, SPRITE_SHEET, STACK_DEPTH,
};
use crate::error::Fault;
use crate::state::{Mode, State};

/// The `len` bytes of memory starting at `start`, provided they all exist
fn span(start: u16, len: usize) -> Result<Range<usize>, Fault> {
    let start = start as usize;
    let end = start + len;
    if end > MEMORY_SIZE {
        Err(Fault::AddressOutOfRange { address: end - 1 })
    } else {
        Ok(start..end)
    }
}

/// Like `span`, but the sprite sheet at the bottom of memory is read-only
fn span_mut(start: u16, len: usize) -> Result<Range<usize>, Fault> {
    if (start as usize) < SPRITE_SHEET.len() {
        return Err(Fault::AddressOutOfRange {
            address: start as usize,
        });
    }
    span(start, len)
}

fn key(state: &State, x: u8, keys: &[bool; KEY_COUNT]) -> Result<bool, Fault> {
    let key = state.v[x as usize];
    keys.get(key as usize)
        .copied()
        .ok_or(Fault::KeyOutOfRange { key })
}

fn skip_if(state: &State, condition: bool) -> State {
    let pc = if condition {
        state.pc + 0x4
    } else {
        state.pc + 0x2
    };
    State { pc, ..*state }
}

/// clear
pub fn clr(state: &State) -> State {
    State {
        pc: state.pc + 0x2,
        frame_buffer: [0; DISPLAY_SIZE],
        draw_flag: true,
        ..*state
    }
}

/// PC = STACK.pop()
pub fn rts(state: &State) -> Result<State, Fault> {
    let sp = state.sp.checked_sub(0x1).ok_or(Fault::StackUnderflow)?;
    Ok(State {
        pc: state.stack[sp as usize] + 0x2,
        sp,
        ..*state
    })
}

/// PC = nnn
pub fn jump(state: &State, nnn: u16) -> State {
    State { pc: nnn, ..*state }
}

/// STACK.push(PC); PC = nnn
pub fn call(state: &State, nnn: u16) -> Result<State, Fault> {
    if state.sp as usize >= STACK_DEPTH {
        return Err(Fault::StackOverflow);
    }
    let mut stack = state.stack;
    stack[state.sp as usize] = state.pc;
    Ok(State {
        pc: nnn,
        sp: state.sp + 0x1,
        stack,
        ..*state
    })
}

/// if Vx == nn then pc += 2
pub fn ske(state: &State, x: u8, nn: u8) -> State {
    skip_if(state, state.v[x as usize] == nn)
}

/// if Vx != nn then pc += 2
pub fn skne(state: &State, x: u8, nn: u8) -> State {
    skip_if(state, state.v[x as usize] != nn)
}

/// if Vx == Vy then pc += 2
pub fn skre(state: &State, x: u8, y: u8) -> State {
    skip_if(state, state.v[x as usize] == state.v[y as usize])
}

/// if Vx != Vy then pc += 2
pub fn skrne(state: &State, x: u8, y: u8) -> State {
    skip_if(state, state.v[x as usize] != state.v[y as usize])
}

/// Vx = nn
pub fn load(state: &State, x: u8, nn: u8) -> State {
    let mut v = state.v;
    v[x as usize] = nn;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx += nn
/// Add nn to Vx; allow for overflow but implicitly drop it
pub fn add(state: &State, x: u8, nn: u8) -> State {
    let mut v = state.v;
    v[x as usize] = v[x as usize].wrapping_add(nn);
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx = Vy
pub fn mv(state: &State, x: u8, y: u8) -> State {
    let mut v = state.v;
    v[x as usize] = v[y as usize];
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx |= Vy
pub fn or(state: &State, x: u8, y: u8) -> State {
    let mut v = state.v;
    v[x as usize] |= v[y as usize];
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx &= Vy
pub fn and(state: &State, x: u8, y: u8) -> State {
    let mut v = state.v;
    v[x as usize] &= v[y as usize];
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx ^= Vy
pub fn xor(state: &State, x: u8, y: u8) -> State {
    let mut v = state.v;
    v[x as usize] ^= v[y as usize];
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx += Vy; VF = overflow
pub fn addr(state: &State, x: u8, y: u8) -> State {
    let (res, over) = state.v[x as usize].overflowing_add(state.v[y as usize]);
    let mut v = state.v;
    v[x as usize] = res;
    v[0xF] = over as u8;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx -= Vy; VF = !underflow
pub fn sub(state: &State, x: u8, y: u8) -> State {
    let (res, under) = state.v[x as usize].overflowing_sub(state.v[y as usize]);
    let mut v = state.v;
    v[x as usize] = res;
    v[0xF] = !under as u8;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx >>= 1; VF = lsb
pub fn shr(state: &State, x: u8) -> State {
    let mut v = state.v;
    let lsb = v[x as usize] & 0x1;
    v[x as usize] >>= 1;
    v[0xF] = lsb;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx = Vy - Vx; VF = !underflow
pub fn subn(state: &State, x: u8, y: u8) -> State {
    let (res, under) = state.v[y as usize].overflowing_sub(state.v[x as usize]);
    let mut v = state.v;
    v[x as usize] = res;
    v[0xF] = !under as u8;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// Vx <<= 1; VF = msb
pub fn shl(state: &State, x: u8) -> State {
    let mut v = state.v;
    let msb = v[x as usize] >> 7;
    v[x as usize] <<= 1;
    v[0xF] = msb;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// I = nnn
pub fn loadi(state: &State, nnn: u16) -> State {
    State {
        pc: state.pc + 0x2,
        i: nnn,
        ..*state
    }
}

/// PC = V0 + nnn
pub fn jumpi(state: &State, nnn: u16) -> State {
    State {
        pc: u16::from(state.v[0x0]) + nnn,
        ..*state
    }
}

/// Vx = rand_byte & nn
pub fn rand(state: &State, x: u8, nn: u8, rng: &mut impl Rng) -> State {
    let rand_byte: u8 = rng.gen();
    let mut v = state.v;
    v[x as usize] = rand_byte & nn;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory i..i+n at position x, y on the FrameBuffer with wrapping.
/// Sets VF if any pixels are erased
pub fn draw(state: &State, x: u8, y: u8, n: u8) -> Result<State, Fault> {
    let sprite = &state.memory[span(state.i, n as usize)?];
    let mut v = state.v;
    let mut frame_buffer = state.frame_buffer;

    // Reset the flag register (used for collision detection)
    v[0xF] = 0x0;

    for (row, byte) in sprite.iter().enumerate() {
        let py = (state.v[y as usize] as usize + row) % DISPLAY_HEIGHT;
        for bit in 0..8 {
            let px = (state.v[x as usize] as usize + bit) % DISPLAY_WIDTH;
            let pixel_value = (byte >> (7 - bit)) & 0x1;
            let index = py * DISPLAY_WIDTH + px;
            v[0xF] |= pixel_value & frame_buffer[index];
            frame_buffer[index] ^= pixel_value;
        }
    }

    Ok(State {
        pc: state.pc + 0x2,
        draw_flag: true,
        v,
        frame_buffer,
        ..*state
    })
}

/// if Vx.pressed then pc += 2
pub fn skpr(state: &State, x: u8, keys: &[bool; KEY_COUNT]) -> Result<State, Fault> {
    Ok(skip_if(state, key(state, x, keys)?))
}

/// if !Vx.pressed then pc += 2
pub fn skup(state: &State, x: u8, keys: &[bool; KEY_COUNT]) -> Result<State, Fault> {
    Ok(skip_if(state, !key(state, x, keys)?))
}

/// Vx = DT
pub fn moved(state: &State, x: u8) -> State {
    let mut v = state.v;
    v[x as usize] = state.delay_timer;
    State {
        pc: state.pc + 0x2,
        v,
        ..*state
    }
}

/// await keypress for Vx
/// PC stays put until the key arrives, see `keyp`
pub fn keyd(state: &State, x: u8) -> State {
    State {
        mode: Mode::WaitingForKey(x),
        ..*state
    }
}

/// Vx = first pressed key, if there is one
pub fn keyp(state: &State, x: u8, keys: &[bool; KEY_COUNT]) -> State {
    match keys.iter().position(|&pressed| pressed) {
        Some(key) => {
            let mut v = state.v;
            v[x as usize] = key as u8;
            State {
                pc: state.pc + 0x2,
                mode: Mode::Running,
                v,
                ..*state
            }
        }
        None => *state,
    }
}

/// DT = Vx
pub fn loads(state: &State, x: u8) -> State {
    State {
        pc: state.pc + 0x2,
        delay_timer: state.v[x as usize],
        ..*state
    }
}

/// ST = Vx
pub fn ld(state: &State, x: u8) -> State {
    State {
        pc: state.pc + 0x2,
        sound_timer: state.v[x as usize],
        ..*state
    }
}

/// I += Vx
/// With the overflow quirk VF records whether I went past the last address.
/// I itself never wraps back around to 0x0000.
pub fn addi(state: &State, x: u8, quirks: Quirks) -> Result<State, Fault> {
    let vx = u16::from(state.v[x as usize]);
    let i = state
        .i
        .checked_add(vx)
        .ok_or(Fault::AddressOutOfRange {
            address: state.i as usize + vx as usize,
        })?;
    let mut v = state.v;
    if quirks.index_overflow_flag {
        v[0xF] = (u32::from(state.i) + u32::from(state.v[x as usize]) > u32::from(ADDRESS_MASK))
            as u8;
    }
    Ok(State {
        pc: state.pc + 0x2,
        i,
        v,
        ..*state
    })
}

/// I = Vx * 5
/// Set I to the memory address of the glyph for Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(state: &State, x: u8) -> Result<State, Fault> {
    let digit = state.v[x as usize];
    if digit > 0xF {
        return Err(Fault::GlyphOutOfRange { digit });
    }
    Ok(State {
        pc: state.pc + 0x2,
        i: u16::from(digit) * GLYPH_HEIGHT,
        ..*state
    })
}

/// mem[I..I+3] = bcd(Vx)
/// Store BCD repr of Vx in memory starting at address i
pub fn bcd(state: &State, x: u8) -> Result<State, Fault> {
    let vx = state.v[x as usize];
    let bcd = [vx / 100, vx / 10 % 10, vx % 10];
    let mut memory = state.memory;
    memory[span_mut(state.i, bcd.len())?].copy_from_slice(&bcd);
    Ok(State {
        pc: state.pc + 0x2,
        memory,
        ..*state
    })
}

/// mem[I..=I+x] = V0..=Vx; I += x + 1
pub fn stor(state: &State, x: u8) -> Result<State, Fault> {
    let count = x as usize + 1;
    let mut memory = state.memory;
    memory[span_mut(state.i, count)?].copy_from_slice(&state.v[..count]);
    Ok(State {
        pc: state.pc + 0x2,
        i: state.i + count as u16,
        memory,
        ..*state
    })
}

/// V0..=Vx = mem[I..=I+x]; I += x + 1
pub fn read(state: &State, x: u8) -> Result<State, Fault> {
    let count = x as usize + 1;
    let mut v = state.v;
    v[..count].copy_from_slice(&state.memory[span(state.i, count)?]);
    Ok(State {
        pc: state.pc + 0x2,
        i: state.i + count as u16,
        v,
        ..*state
    })
}
