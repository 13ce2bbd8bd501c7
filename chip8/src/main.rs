use std::path::PathBuf;

use clap::Parser;

use c8_core::CLOCK_HZ;

mod keymap;
mod run;

/// Runs a Chip-8 ROM in an SDL2 window
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// ROM file to load
    pub rom: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = CLOCK_HZ, value_parser = clap::value_parser!(u32).range(1..))]
    pub clock_hz: u32,

    /// Size of one Chip-8 pixel on screen
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub scale: u32,

    /// Leave VF alone on I += Vx
    #[arg(long)]
    pub strict: bool,

    /// Seed for the random number instruction
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the screen as text whenever it changes
    #[arg(long)]
    pub dump: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    run::run(Args::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["c8", "pong.ch8"]).unwrap();
        assert_eq!(args.rom, PathBuf::from("pong.ch8"));
        assert_eq!(args.clock_hz, CLOCK_HZ);
        assert_eq!(args.scale, 10);
        assert!(!args.strict);
        assert_eq!(args.seed, None);
        assert!(!args.dump);
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::try_parse_from([
            "c8",
            "--clock-hz",
            "1000",
            "--scale",
            "4",
            "--strict",
            "--seed",
            "42",
            "--dump",
            "pong.ch8",
        ])
        .unwrap();
        assert_eq!(args.clock_hz, 1000);
        assert_eq!(args.scale, 4);
        assert!(args.strict);
        assert_eq!(args.seed, Some(42));
        assert!(args.dump);
    }

    #[test]
    fn test_args_rejects_zero_clock() {
        assert!(Args::try_parse_from(["c8", "--clock-hz", "0", "pong.ch8"]).is_err());
    }
}
