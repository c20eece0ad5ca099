// Headless driver for maze_chase sessions.
//
// Loads a map (and optionally a config and an input script), runs the sim at
// a fixed frame step, and prints every event as one JSON object per line on
// stdout. Logs go to stderr. The run stops when the game is over or the
// frame limit is reached. Identical arguments always produce identical
// output, which makes this the tool for recording and diffing replays.
//
// Usage:
//   headless --map <FILE> [OPTIONS]
//     --map <FILE>         JSON map file (tile rows + elevations), required; must
//                          contain the player and pursuer start cells
//     --config <FILE>      JSON GameConfig, partial files allowed (default: built-in)
//     --seed <N>           Session seed (default: 0)
//     --frame-ms <MS>      Frame step in milliseconds (default: 16)
//     --frames <N>         Frame limit (default: 36000)
//     --inputs <FILE>      JSON input script, see `script.rs`
//     --verbose            Debug logging (RUST_LOG overrides)

mod script;

use std::cell::Cell;
use std::rc::Rc;

use env_logger::{Builder, Env};
use log::{LevelFilter, info, warn};
use maze_chase_sim::config::GameConfig;
use maze_chase_sim::event::SimEventKind;
use maze_chase_sim::map::GameMap;
use maze_chase_sim::session::Session;
use script::InputScript;

struct Args {
    map: String,
    config: Option<String>,
    seed: u64,
    frame_ms: f64,
    frames: u64,
    inputs: Option<String>,
    verbose: bool,
}

fn main() {
    let args = parse_args();
    init_logging(args.verbose);

    let map = read_or_exit(&args.map, "map", GameMap::from_json);
    let config = match &args.config {
        Some(path) => read_or_exit(path, "config", GameConfig::from_json),
        None => GameConfig::default(),
    };
    let mut script = match &args.inputs {
        Some(path) => read_or_exit(path, "input script", InputScript::from_json),
        None => InputScript::default(),
    };

    let mut session = Session::try_new(&map, args.seed, config).unwrap_or_else(|e| {
        eprintln!("Unusable map {}: {e}", args.map);
        std::process::exit(1);
    });
    info!(
        "session start: seed {}, {} vertices, {} items",
        args.seed,
        session.sim().graph().vertex_count(),
        session.sim().items_remaining()
    );

    let captures = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&captures);
    session.subscribe(move |event| {
        if matches!(event.kind, SimEventKind::PursuerCaught { .. }) {
            counter.set(counter.get() + 1);
        }
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!("unprintable event at {} ms: {e}", event.time_ms),
        }
    });

    let mut frame = 0;
    while frame < args.frames && !session.sim().state().is_over() {
        for command in script.due(session.sim().time_ms()) {
            session.set_player_command(command.direction);
        }
        session.update(args.frame_ms);
        frame += 1;
    }

    let sim = session.sim();
    info!(
        "session end after {frame} frames ({:.0} ms): {:?}, score {}, lives {}, \
         {} captures, {} items left, {} unused inputs",
        sim.time_ms(),
        sim.state(),
        sim.score(),
        sim.lives(),
        captures.get(),
        sim.items_remaining(),
        script.remaining()
    );
}

/// Logs go to stderr so stdout stays a clean JSON event stream. `RUST_LOG`
/// overrides the level picked by `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = Builder::from_env(Env::default().default_filter_or(level.as_str()))
        .target(env_logger::Target::Stderr)
        .try_init();
}

/// Read `path` and parse it with `parse`, exiting with a message on failure.
fn read_or_exit<T, E: std::fmt::Display>(
    path: &str,
    what: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> T {
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {what} {path}: {e}");
        std::process::exit(1);
    });
    parse(&text).unwrap_or_else(|e| {
        eprintln!("Invalid {what} {path}: {e}");
        std::process::exit(1);
    })
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> Args {
    let mut map = None;
    let mut parsed = Args {
        map: String::new(),
        config: None,
        seed: 0,
        frame_ms: 16.0,
        frames: 36_000,
        inputs: None,
        verbose: false,
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--map" => {
                i += 1;
                map = Some(value(&args, i, "--map requires a file path"));
            }
            "--config" => {
                i += 1;
                parsed.config = Some(value(&args, i, "--config requires a file path"));
            }
            "--seed" => {
                i += 1;
                parsed.seed = number(&args, i, "--seed requires an unsigned integer");
            }
            "--frame-ms" => {
                i += 1;
                parsed.frame_ms = number(&args, i, "--frame-ms requires a number");
                if parsed.frame_ms.is_nan() || parsed.frame_ms <= 0.0 {
                    eprintln!("--frame-ms must be positive");
                    std::process::exit(1);
                }
            }
            "--frames" => {
                i += 1;
                parsed.frames = number(&args, i, "--frames requires an unsigned integer");
            }
            "--inputs" => {
                i += 1;
                parsed.inputs = Some(value(&args, i, "--inputs requires a file path"));
            }
            "--verbose" => parsed.verbose = true,
            "--help" | "-h" => {
                println!(
                    "Usage: headless --map <FILE> [--config <FILE>] [--seed <N>] \
                     [--frame-ms <MS>] [--frames <N>] [--inputs <FILE>] [--verbose]"
                );
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed.map = map.unwrap_or_else(|| {
        eprintln!("--map is required");
        std::process::exit(1);
    });
    parsed
}

fn value(args: &[String], i: usize, message: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| {
        eprintln!("{message}");
        std::process::exit(1);
    })
}

fn number<T: std::str::FromStr>(args: &[String], i: usize, message: &str) -> T {
    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
        eprintln!("{message}");
        std::process::exit(1);
    })
}
