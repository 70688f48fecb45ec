//! Math Muncher headless demo
//!
//! Plays an autopilot game on a virtual clock and prints the board whenever
//! something interesting happens.
//!
//! Usage: `math-muncher [mode] [enemies] [safe_zones] [seed]`

use std::process::ExitCode;

use clap::Parser;
use math_muncher::GameConfig;
use math_muncher::consts::DEMO_STEP_MS;
use math_muncher::settings::parse_mode;
use math_muncher::sim::{GameEvent, Mode, RoundController, VirtualClock, next_intent};

/// Stop the demo after this much virtual time
const DEMO_LIMIT_MS: u64 = 5 * 60 * 1000;

#[derive(Parser, Debug)]
#[command(name = "math-muncher")]
#[command(about = "Plays an autopilot game of Math Muncher on a virtual clock")]
struct Args {
    /// equals, multiples, factors or inequality
    #[arg(value_parser = parse_mode, default_value = "equals")]
    mode: Mode,
    /// Number of roaming enemies
    #[arg(default_value_t = 2)]
    enemies: usize,
    /// Number of safe zones
    #[arg(default_value_t = 1)]
    safe_zones: usize,
    /// RNG seed; the same seed replays the same game
    #[arg(default_value_t = 1)]
    seed: u64,
}

fn main() -> ExitCode {
    env_logger::init();

    let Args {
        mode,
        enemies,
        safe_zones,
        seed,
    } = Args::parse();
    let config = GameConfig::new(mode, enemies, safe_zones);

    log::info!("Math Muncher demo starting with seed: {}", seed);
    let mut game = RoundController::new(VirtualClock::new(), seed);
    if let Err(err) = game.start_game(config) {
        eprintln!("invalid configuration: {}", err);
        return ExitCode::FAILURE;
    }

    let mut elapsed = 0;
    print!("{}", game.snapshot());
    while elapsed < DEMO_LIMIT_MS {
        let snapshot = game.snapshot();
        if snapshot.game_over {
            break;
        }
        if let Some(intent) = next_intent(&snapshot) {
            game.apply(intent);
        }
        game.advance(DEMO_STEP_MS);
        elapsed += DEMO_STEP_MS;

        for event in game.drain_events() {
            match event {
                GameEvent::LevelStarted { .. } => print!("\n{}", game.snapshot()),
                GameEvent::WrongAnswer { message } => println!("{}", message),
                GameEvent::LifeLost { lives_left } => {
                    println!("Caught! {} lives left", lives_left)
                }
                GameEvent::LevelComplete { level } => println!("Level {} cleared!", level),
                GameEvent::GameOver { won, score, level } => {
                    let outcome = if won { "You win" } else { "Game over" };
                    println!("{}: score {} at level {}", outcome, score, level);
                }
                other => log::debug!("{:?}", other),
            }
        }
    }

    let snapshot = game.snapshot();
    if !snapshot.game_over {
        println!(
            "Demo stopped after {}s: score {} at level {}",
            elapsed / 1000,
            snapshot.score,
            snapshot.level
        );
    }
    ExitCode::SUCCESS
}
