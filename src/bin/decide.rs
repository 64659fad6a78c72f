// One-shot decision tool
//
// Reads a single move request (as sent to POST /move) and prints the
// occupancy map, every resolved route and the chosen direction.
//
// Usage:
//   cargo run --bin decide -- [request.json] [--seed <u64>] [--config <path>]
//
// Without a file argument the request is read from stdin.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use rand::rngs::StdRng;
use rand::SeedableRng;

use routesnake::config::Config;
use routesnake::planner::plan;
use routesnake::types::GameState;

struct Options {
    input: Option<String>,
    seed: Option<u64>,
    config_path: Option<String>,
}

fn print_usage() {
    eprintln!("routesnake decide tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  decide [request.json] [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --seed <u64>       Seed for decoy selection (random by default)");
    eprintln!("  --config <path>    Path to Snake.toml (default: Snake.toml, then built-in)");
    eprintln!("  --help             Show this help message");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        input: None,
        seed: None,
        config_path: None,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => {
                let value = iter.next().ok_or("--seed requires an argument")?;
                let seed = value
                    .parse::<u64>()
                    .map_err(|e| format!("Invalid seed '{}': {}", value, e))?;
                options.seed = Some(seed);
            }
            "--config" => {
                let value = iter.next().ok_or("--config requires an argument")?;
                options.config_path = Some(value.clone());
            }
            other if other.starts_with("--") => {
                return Err(format!("Unknown option '{}'", other));
            }
            path => {
                if options.input.is_some() {
                    return Err(format!("Unexpected argument '{}'", path));
                }
                options.input = Some(path.to_string());
            }
        }
    }

    Ok(options)
}

fn read_request(input: Option<&str>) -> Result<GameState, String> {
    let raw = match input {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("Failed to read request '{}': {}", path, e))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("Failed to read request from stdin: {}", e))?;
            buffer
        }
    };

    serde_json::from_str(&raw).map_err(|e| format!("Failed to decode request: {}", e))
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help") {
        print_usage();
        return;
    }

    let options = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage();
        process::exit(1);
    });

    let config = match &options.config_path {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => Config::load_or_default(),
    };

    let state = read_request(options.input.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let seed = options.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let decision = plan(&state, &config, &mut rng).unwrap_or_else(|e| {
        eprintln!("Error: malformed state: {}", e);
        process::exit(2);
    });

    println!("Turn {} (seed {})", state.turn, seed);
    println!();
    print!("{}", decision.grid);
    println!();

    for route in decision.routes.simulations() {
        println!("  {}", route);
    }
    for (rank, route) in decision.routes.candidates().iter().enumerate() {
        println!("{:>2}. {}", rank + 1, route);
    }
    println!();
    println!("{}", decision.direction);
}
