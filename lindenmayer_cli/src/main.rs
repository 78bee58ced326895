// CLI entry point: load an L-system description, grow it, print the result.
//
// The system comes from a JSON file (see `lindenmayer_engine::config`) or
// one of the embedded presets. After iterating, every final action the
// description declares is bound to a dry-run stand-in: `trace` logs each
// position it fires at, any other name is tallied, so the run reports how
// often a renderer would have drawn, turned, pushed, and so on.
//
// Usage:
//   lsys [CONFIG.json | --preset NAME] [OPTIONS]
//     --preset <NAME>       Use an embedded preset instead of a file
//     --iterations <N>      Generations to apply (default: from the description)
//     --seed <N>            Random seed (default: from the description)
//     --json                Print tokens with parameters as JSON
//     --verbose             Log each generation (RUST_LOG overrides)
//     --list-presets        Print the embedded preset names

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use lindenmayer_engine::{BoxError, FinalAction, LSystem, Symbol, SystemConfig, presets};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Parsed command line.
#[derive(Debug, Default)]
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    iterations: Option<u32>,
    seed: Option<u64>,
    json: bool,
    verbose: bool,
}

/// `--json` output.
#[derive(Serialize)]
struct Report<'a> {
    generations: u64,
    axiom: &'a [Symbol],
    actions: &'a BTreeMap<String, usize>,
}

fn main() {
    let args = parse_args();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &CliArgs) -> Result<(), BoxError> {
    let mut config = load_config(args)?;
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let mut system = LSystem::from_config(&config)?;
    info!(
        iterations = config.iterations,
        seed = config.seed,
        axiom_len = system.axiom().len(),
        "growing system"
    );
    system.iterate(config.iterations as usize)?;

    let tallies = Arc::new(Mutex::new(BTreeMap::new()));
    bind_dry_run_finals(&mut system, &tallies);
    system.final_pass()?;

    let tallies = tallies
        .lock()
        .map_err(|_| "final action tally lock poisoned")?
        .clone();
    if args.json {
        let report = Report {
            generations: system.generation(),
            axiom: system.axiom().symbols(),
            actions: &tallies,
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", system.get_string(true)?);
        for (action, count) in &tallies {
            eprintln!("{action}: {count}");
        }
    }
    Ok(())
}

fn load_config(args: &CliArgs) -> Result<SystemConfig, BoxError> {
    match (&args.preset, &args.config_path) {
        (Some(_), Some(_)) => Err("give either a config file or --preset, not both".into()),
        (Some(name), None) => Ok(presets::load(name)?),
        (None, Some(path)) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {path}: {e}"))?;
            Ok(SystemConfig::from_json(&json)?)
        }
        (None, None) => Err("no system given (pass CONFIG.json or --preset NAME)".into()),
    }
}

/// Bind every declared final action to a stand-in that records its use.
fn bind_dry_run_finals(system: &mut LSystem, tallies: &Arc<Mutex<BTreeMap<String, usize>>>) {
    let declared: Vec<(String, String)> = system
        .declared_finals()
        .map(|(symbol, name)| (symbol.to_string(), name.to_string()))
        .collect();

    for (symbol, name) in declared {
        let action = if name == "trace" {
            FinalAction::callback(|ctx| {
                debug!(index = ctx.index, symbol = %ctx.symbol.name(), "final");
                Ok(())
            })
        } else {
            let tallies = Arc::clone(tallies);
            FinalAction::callback(move |_| {
                let mut tallies = tallies.lock().map_err(|_| "final action tally lock poisoned")?;
                *tallies.entry(name.clone()).or_insert(0) += 1;
                Ok(())
            })
        };
        system.set_final(symbol, action);
    }
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> CliArgs {
    let mut args = CliArgs::default();
    let argv: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < argv.len() {
        match argv[i].as_str() {
            "--preset" => {
                i += 1;
                args.preset = Some(argv.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--preset requires a name");
                    std::process::exit(1);
                }));
            }
            "--iterations" => {
                i += 1;
                args.iterations =
                    Some(argv.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--iterations requires a non-negative number");
                        std::process::exit(1);
                    }));
            }
            "--seed" => {
                i += 1;
                args.seed = Some(argv.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires a non-negative number");
                    std::process::exit(1);
                }));
            }
            "--json" => args.json = true,
            "--verbose" | "-v" => args.verbose = true,
            "--list-presets" => {
                for name in presets::PRESET_NAMES {
                    println!("{name}");
                }
                std::process::exit(0);
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
            path => {
                if args.config_path.is_some() {
                    eprintln!("Only one config file may be given");
                    std::process::exit(1);
                }
                args.config_path = Some(path.to_string());
            }
        }
        i += 1;
    }

    args
}

fn print_usage() {
    println!("Usage: lsys [CONFIG.json | --preset NAME] [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --preset <NAME>     Use an embedded preset instead of a file");
    println!("  --iterations <N>    Generations to apply (default: from the description)");
    println!("  --seed <N>          Random seed (default: from the description)");
    println!("  --json              Print tokens with parameters as JSON");
    println!("  --verbose, -v       Log each generation (RUST_LOG overrides)");
    println!("  --list-presets      Print the embedded preset names");
    println!("  --help, -h          Show this help");
}
