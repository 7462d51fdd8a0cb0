//! rvpipe command-line front end.
//!
//! Single entry point for running the simulator:
//! 1. **Run:** load a flat binary at address 0, simulate until halt (or a
//!    cycle budget), print statistics.
//! 2. **Config:** optional JSON file overriding cache geometry and memory
//!    size; built-in defaults otherwise.
//! 3. **Trace:** optional JSON-lines per-cycle pipeline trace.

use std::fs::{self, File};
use std::io::BufWriter;
use std::process;

use clap::{Parser, Subcommand};

use rvpipe_core::pipeline::record::{JsonTrace, NullSink, SnapshotSink};
use rvpipe_core::{MemoryStore, Pipeline, RunStatus, SimConfig};

#[derive(Parser, Debug)]
#[command(
    name = "rvpipe",
    author,
    version,
    about = "Cycle-accurate five-stage RV32I pipeline simulator",
    long_about = "Run a flat RV32I binary through a five-stage in-order pipeline \
                  with split LRU caches.\n\nExamples:\n  \
                  rvpipe run -f program.bin\n  \
                  rvpipe run -f program.bin --config caches.json --trace pipe.jsonl"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate a binary until halt, exception, or a cycle budget.
    Run {
        /// Flat binary image, loaded at address 0.
        #[arg(short, long)]
        file: String,

        /// JSON configuration file (cache geometry, memory size).
        #[arg(short, long)]
        config: Option<String>,

        /// Cycle budget; 0 means run until halt or exception.
        #[arg(long, default_value_t = 0)]
        cycles: u64,

        /// Write a JSON-lines per-cycle trace to this path.
        #[arg(long)]
        trace: Option<String>,

        /// Dump PC and registers after the run.
        #[arg(long)]
        dump_regs: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            config,
            cycles,
            trace,
            dump_regs,
        } => cmd_run(file, config, cycles, trace, dump_regs),
    }
}

/// Loads config and program, runs the pipeline, prints the outcome.
fn cmd_run(
    file: String,
    config: Option<String>,
    cycles: u64,
    trace: Option<String>,
    dump_regs: bool,
) {
    let config = match config {
        Some(path) => load_config(&path),
        None => SimConfig::default(),
    };
    if let Err(e) = config.validate() {
        eprintln!("Error: invalid configuration: {}", e);
        process::exit(1);
    }

    let image = fs::read(&file).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", file, e);
        process::exit(1);
    });

    let mut mem = MemoryStore::new(config.memory_bytes);
    mem.load_image(&image, 0);

    let sink: Box<dyn SnapshotSink> = match trace {
        Some(path) => {
            let out = File::create(&path).unwrap_or_else(|e| {
                eprintln!("Error creating trace file {}: {}", path, e);
                process::exit(1);
            });
            Box::new(JsonTrace::new(BufWriter::new(out)))
        }
        None => Box::new(NullSink),
    };

    println!("[*] Simulating {} ({} bytes)", file, image.len());
    let mut sim = Pipeline::new(&config.icache, &config.dcache, mem, sink);

    let status = sim.run_cycles(cycles);
    match status {
        RunStatus::Halt => println!("[*] Halted after {} cycles", sim.cycle_count()),
        RunStatus::Success => println!("[*] Cycle budget reached ({})", sim.cycle_count()),
        RunStatus::Error(e) => eprintln!("[!] EXCEPTION: {}", e),
    }

    if dump_regs {
        sim.dump_state();
    }

    let stats = sim.finalize();
    stats.print();

    if matches!(status, RunStatus::Error(_)) {
        process::exit(1);
    }
}

/// Reads and parses a JSON configuration file.
fn load_config(path: &str) -> SimConfig {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config {}: {}", path, e);
        process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing config {}: {}", path, e);
        process::exit(1);
    })
}
