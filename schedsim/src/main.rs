//! # SchedSim
//!
//! Main entry point for the scheduling simulator.

use clap::Parser;
use schedsim::{
    comparison_exit_code, outcome_exit_code, Console, SimRuntime, SimRuntimeConfig,
    SimRuntimeError, Workload,
};
use sim_scheduler::{AlgorithmChoice, DEFAULT_MAX_TICKS};
use std::io;
use std::path::PathBuf;
use std::process;
use trace_logger::LogLevel;
use trace_renderer::OutputFormat;

/// Single-processor scheduling simulator over shared resources R1, R2 and R3
#[derive(Debug, Parser)]
#[command(name = "schedsim", version)]
struct Args {
    /// Workload file; prompts interactively when absent
    #[arg(short, long, value_name = "FILE")]
    workload: Option<PathBuf>,

    /// Scheduling algorithm: 1-4 or sjf, fcfs, rr, hrrn
    #[arg(short, long, value_name = "ID")]
    algorithm: Option<AlgorithmChoice>,

    /// Round-robin time quantum
    #[arg(short, long, value_name = "N")]
    quantum: Option<u64>,

    /// Stop a run after this many ticks
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    format: OutputFormat,

    /// Run the workload under all four algorithms and print a comparison
    #[arg(long)]
    compare: bool,

    /// Write audit log entries at or above LEVEL to stderr
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Omit the per-task statistics table
    #[arg(long)]
    no_summary: bool,

    /// Keep running when no progress is made (until --max-ticks)
    #[arg(long)]
    no_livelock_detection: bool,
}

fn main() {
    let args = Args::parse();

    let code = match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    process::exit(code);
}

fn run(args: Args) -> Result<i32, SimRuntimeError> {
    let config = SimRuntimeConfig {
        format: args.format,
        max_ticks: Some(args.max_ticks),
        log_level: args.log_level,
        show_summary: !args.no_summary,
        livelock_detection: !args.no_livelock_detection,
    };

    let workload = match &args.workload {
        Some(path) => Workload::from_file(path)?,
        None => read_interactive(&args)?,
    };

    let mut runtime = SimRuntime::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.compare {
        let outcomes = runtime.compare(&workload, args.quantum, &mut out)?;
        return Ok(comparison_exit_code(&outcomes));
    }

    let algorithm = workload.resolve_algorithm(args.algorithm, args.quantum)?;
    let outcome = runtime.run(&workload, algorithm, &mut out, &mut io::stderr())?;
    Ok(outcome_exit_code(&outcome))
}

/// Prompts only for what the command line left open
fn read_interactive(args: &Args) -> Result<Workload, SimRuntimeError> {
    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());

    let ask_algorithm = !args.compare && args.algorithm.is_none();
    let mut workload = console.read_workload(ask_algorithm)?;

    let needs_quantum = args.algorithm.is_some_and(|c| c.needs_quantum());
    if !args.compare && needs_quantum && args.quantum.is_none() {
        workload.quantum = Some(console.read_quantum()?);
    }
    Ok(workload)
}
