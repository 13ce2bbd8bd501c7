use std::fs;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{error, info};
use sdl2::event::Event;

use c8_core::{Chip8, Config, LoadError, Quirks, TIMER_HZ};
use c8_display::Display;

use crate::keymap::{keymap, Input};
use crate::Args;

pub fn run(args: Args) -> Result<()> {
    let config = Config {
        quirks: if args.strict {
            Quirks::strict()
        } else {
            Quirks::default()
        },
        seed: args.seed,
    };
    let mut chip8 = Chip8::with_config(config);

    // Load ROM
    let rom = fs::read(&args.rom)
        .map_err(LoadError::from)
        .with_context(|| format!("loading {}", args.rom.display()))?;
    chip8
        .load(&rom)
        .with_context(|| format!("loading {}", args.rom.display()))?;
    info!("loaded {} ({} bytes)", args.rom.display(), rom.len());

    // Get SDL2 context
    let sdl = sdl2::init().map_err(anyhow::Error::msg)?;
    let mut display = Display::new(&sdl, "c8", args.scale).map_err(anyhow::Error::msg)?;
    let mut events = sdl.event_pump().map_err(anyhow::Error::msg)?;

    // The CPU and the timers run off separate clocks
    let cycle_time = Duration::from_secs_f64(1.0 / f64::from(args.clock_hz));
    let timer_time = Duration::from_secs_f64(1.0 / f64::from(TIMER_HZ));
    let mut last_cycle = Instant::now();
    let mut next_tick = Instant::now() + timer_time;

    // Whether or not the clock speed should be respected
    let mut fast_forward = false;

    'event: loop {
        // If the draw flag is set, render the current frame and unset it
        if let Some(frame) = chip8.get_frame() {
            display.render(frame).map_err(anyhow::Error::msg)?;
            if args.dump {
                println!("{}", chip8.debug_render());
            }
            chip8.clear_redraw();
        }

        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. } => break 'event,
                Event::KeyDown {
                    keycode: Some(key),
                    repeat: false,
                    ..
                } => match keymap(key) {
                    Some(Input::Keypad(kc)) => chip8.key_press(kc),
                    Some(Input::FastForward) => fast_forward = true,
                    Some(Input::Reset) => {
                        info!("resetting {}", args.rom.display());
                        chip8.load(&rom)?;
                    }
                    None => continue,
                },
                Event::KeyUp {
                    keycode: Some(key), ..
                } => match keymap(key) {
                    Some(Input::Keypad(kc)) => chip8.key_release(kc),
                    Some(Input::FastForward) => fast_forward = false,
                    _ => continue,
                },
                _ => continue,
            };
        }

        // Timers tick at 60Hz whatever the CPU is doing
        let now = Instant::now();
        while next_tick <= now {
            next_tick += timer_time;
            if chip8.tick_timers().beep {
                info!("BEEP!");
            }
        }

        // Update state; unknown opcodes are already logged by the core
        if chip8.fault().is_none() {
            if let Err(fault) = chip8.step() {
                error!("{}; press backspace to restart", fault);
            }
        }

        // Handle timing
        let current_time = Instant::now();
        let elapsed_cycle_time = current_time - last_cycle;
        if !fast_forward && cycle_time > elapsed_cycle_time {
            std::thread::sleep(cycle_time - elapsed_cycle_time);
        }
        last_cycle = Instant::now();
    }

    Ok(())
}
