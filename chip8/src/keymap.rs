use sdl2::keyboard::Keycode;

/// Something the player asked for with a key
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Input {
    /// A key on the hexadecimal keypad
    Keypad(u8),
    /// Run the CPU unthrottled while held
    FastForward,
    /// Reload the ROM from scratch
    Reset,
}

/// # Keymap
/// Chip-8 input is generated with a hexadecimal keypad.
///
/// This original layout is mapped to the left 4 alphanumeric columns.
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |Q|W|E|R|
/// |7|8|9|E|  ->  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
/// Space fast-forwards and Backspace resets.
pub fn keymap(key: Keycode) -> Option<Input> {
    let keypad = match key {
        Keycode::X => 0x0,
        Keycode::Num1 => 0x1,
        Keycode::Num2 => 0x2,
        Keycode::Num3 => 0x3,
        Keycode::Q => 0x4,
        Keycode::W => 0x5,
        Keycode::E => 0x6,
        Keycode::A => 0x7,
        Keycode::S => 0x8,
        Keycode::D => 0x9,
        Keycode::Z => 0xA,
        Keycode::C => 0xB,
        Keycode::Num4 => 0xC,
        Keycode::R => 0xD,
        Keycode::F => 0xE,
        Keycode::V => 0xF,
        Keycode::Space => return Some(Input::FastForward),
        Keycode::Backspace => return Some(Input::Reset),
        _ => return None,
    };
    Some(Input::Keypad(keypad))
}
