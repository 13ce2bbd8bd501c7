use crate::constants::DISPLAY_WIDTH;
use crate::state::FrameBuffer;

const LIT: char = '#';
const DARK: char = '.';

/// Renders a FrameBuffer as 32 lines of 64 characters for eyeballing in a terminal.
pub fn render_text(frame: &FrameBuffer) -> String {
    frame
        .chunks(DISPLAY_WIDTH)
        .map(|row| {
            let mut line: String = row
                .iter()
                .map(|&pixel| if pixel == 0 { DARK } else { LIT })
                .collect();
            line.push('\n');
            line
        })
        .collect()
}
