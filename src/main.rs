//! Torus Arena headless runner
//!
//! Plays a seeded run on autopilot and prints a summary. Useful for
//! balancing passes and for checking that a seed replays identically.

use std::path::PathBuf;

use clap::Parser;

use torus_arena::persistence::{FileStorage, MemoryStorage, Storage};
use torus_arena::sim::TickInput;
use torus_arena::{DifficultyPreset, Session, Settings};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seed for the simulation RNG
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Stop after this many ticks (60 per second)
    #[arg(short, long, default_value_t = 36_000)]
    ticks: u64,

    /// easy, normal or hard (overrides stored settings)
    #[arg(short, long, value_parser = parse_difficulty)]
    difficulty: Option<DifficultyPreset>,

    /// Directory for profile, settings and leaderboard; in-memory if omitted
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Name recorded on the leaderboard
    #[arg(short, long)]
    name: Option<String>,
}

fn parse_difficulty(s: &str) -> Result<DifficultyPreset, String> {
    DifficultyPreset::parse(s).ok_or_else(|| format!("unknown difficulty '{s}'"))
}

fn run<S: Storage>(storage: S, args: &Args) {
    let mut settings = Settings::load(&storage);
    if let Some(difficulty) = args.difficulty {
        settings.difficulty = difficulty;
    }
    if let Some(name) = &args.name {
        settings.player_name = name.clone();
    }

    let mut session = Session::start_with(storage, args.seed, settings);
    let input = TickInput {
        autopilot: true,
        ..TickInput::default()
    };

    for _ in 0..args.ticks {
        if session.state().is_leveling_up {
            if let Some(upgrade) = session.choose_upgrade(0) {
                log::debug!("Autopilot took {upgrade:?}");
            }
        }
        if !session.advance(&input) {
            break;
        }
    }
    let rank = session.finish();

    let state = session.state();
    println!("Seed:     {}", args.seed);
    println!("Ticks:    {}", state.tick_count);
    println!("Wave:     {}", state.wave.wave);
    println!("Level:    {}", state.player.level);
    println!("Kills:    {}", state.total_kills);
    println!("Score:    {}", state.score);
    println!(
        "Outcome:  {}",
        if state.is_game_over { "died" } else { "survived" }
    );
    if let Some(rank) = rank {
        println!("Leaderboard rank #{rank}");
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::info!("Torus Arena (headless) starting with seed {}", args.seed);

    match &args.data_dir {
        Some(dir) => run(FileStorage::new(dir), &args),
        None => run(MemoryStorage::default(), &args),
    }
}
