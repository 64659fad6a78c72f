// Standalone replay tool for analyzing routesnake debug logs
//
// Usage:
//   cargo run --bin replay -- <log_file> [options]
//
// Options:
//   --all                  Replay all turns
//   --turns <turn1,turn2>  Replay specific turns (comma-separated)
//   --validate             Run validation mode with expected moves
//   --verbose              Show detailed output for each turn
//   --config <path>        Path to Snake.toml (default: Snake.toml)

use std::env;
use std::process;

use routesnake::config::Config;
use routesnake::replay::{parse_expected_moves, parse_turns, ReplayEngine};

enum Mode {
    All,
    Turns(String),
    Validate(String),
}

fn print_usage() {
    eprintln!("routesnake replay tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  replay <log_file> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --all                   Replay all turns in the log");
    eprintln!("  --turns <T1,T2,...>     Replay specific turns (comma-separated)");
    eprintln!("  --validate <T:M,...>    Validate expected moves (format: turn:move|move,...)");
    eprintln!("  --verbose               Show detailed output for each turn");
    eprintln!("  --config <path>         Path to Snake.toml (default: Snake.toml)");
    eprintln!("  --help                  Show this help message");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("  # Replay all turns");
    eprintln!("  replay routesnake_debug.jsonl --all");
    eprintln!();
    eprintln!("  # Replay specific turns");
    eprintln!("  replay routesnake_debug.jsonl --turns 5,10,15");
    eprintln!();
    eprintln!("  # Validate expected moves");
    eprintln!("  replay routesnake_debug.jsonl --validate 5:up,10:right|down");
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Returns the value following an option, or exits
fn option_value(args: &[String], i: usize, option: &str) -> String {
    args.get(i + 1)
        .cloned()
        .unwrap_or_else(|| fail(&format!("{} requires an argument", option)))
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.iter().any(|a| a == "--help") {
        print_usage();
        process::exit(if args.iter().any(|a| a == "--help") { 0 } else { 1 });
    }

    let log_file = &args[1];
    let mut config_path = "Snake.toml".to_string();
    let mut verbose = false;
    let mut mode = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--all" => mode = Some(Mode::All),
            "--turns" => {
                mode = Some(Mode::Turns(option_value(&args, i, "--turns")));
                i += 1;
            }
            "--validate" => {
                mode = Some(Mode::Validate(option_value(&args, i, "--validate")));
                i += 1;
            }
            "--config" => {
                config_path = option_value(&args, i, "--config");
                i += 1;
            }
            "--verbose" => verbose = true,
            other => {
                eprintln!("Error: Unknown option '{}'", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(mode) = mode else {
        eprintln!("Error: Must specify --all, --turns, or --validate");
        print_usage();
        process::exit(1);
    };

    let config = Config::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });

    println!("Loaded configuration from: {}", config_path);
    println!("Replay log file: {}", log_file);
    println!();

    let engine = ReplayEngine::new(config, verbose);

    let entries = engine
        .load_log_file(log_file)
        .unwrap_or_else(|e| fail(&format!("loading log file: {}", e)));

    if entries.is_empty() {
        fail("Log file is empty");
    }

    println!("Loaded {} log entries\n", entries.len());

    match mode {
        Mode::All => {
            println!("Replaying all {} turns...\n", entries.len());
            let results = engine.replay_all(&entries);
            engine.print_report(&results);
        }
        Mode::Turns(arg) => {
            let turns = parse_turns(&arg).unwrap_or_else(|e| fail(&format!("parsing turns: {}", e)));

            println!("Replaying {} specific turn(s)...\n", turns.len());
            match engine.replay_turns(&entries, &turns) {
                Ok(results) => engine.print_report(&results),
                Err(e) => fail(&format!("during replay: {}", e)),
            }
        }
        Mode::Validate(arg) => {
            let expected_moves = parse_expected_moves(&arg)
                .unwrap_or_else(|e| fail(&format!("parsing expected moves: {}", e)));

            println!("Validating {} expected move(s)...\n", expected_moves.len());
            match engine.validate_expected_moves(&entries, &expected_moves) {
                Ok(()) => println!("✓ All expected moves validated successfully!"),
                Err(e) => {
                    eprintln!("✗ Validation failed: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}
