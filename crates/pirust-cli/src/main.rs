//! PiRust CLI - Hybrid parallel Pi calculator.
//!
//! Computes Pi to a requested number of decimals with a group of ranks, each
//! running a pool of worker threads. By default every rank but the root is
//! a child process of this executable; `--in-process` runs the ranks as
//! threads of a single process instead.
//!
//! Built with the `mpi` feature, the ranks can also be started by an MPI
//! runtime, which decides the rank count:
//!
//! ```text
//! mpirun -n 4 pirust 1000 -t 4 --mpi
//! ```

mod launcher;

use std::io::BufWriter;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pirust_core::comm::{PipeRoot, PipeWorker};
use pirust_core::float::BACKEND;
use pirust_core::{codec, compute_pi, run_rank, Algorithm, PiConfig, PiReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

use launcher::WorkerGroup;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI arguments structure.
#[derive(Parser)]
#[command(name = "pirust", version, about = "Hybrid parallel Pi calculator", long_about = None)]
struct Cli {
    /// Number of decimal digits to compute.
    digits: u64,

    /// Series to evaluate: bbp (0), bellard (1), chudnovsky-blocks (2) or chudnovsky (3).
    #[arg(short, long, default_value = "chudnovsky")]
    algorithm: Algorithm,

    /// Number of ranks (processes).
    #[arg(short, long, default_value_t = 1)]
    procs: usize,

    /// Worker threads per rank.
    #[arg(short, long, default_value_t = 1)]
    threads: usize,

    /// Print a single CSV row instead of the human-readable report.
    #[arg(long)]
    csv: bool,

    /// Run every rank as a thread of this process.
    #[arg(long)]
    in_process: bool,

    /// Run as the given non-root rank and write its payload to stdout.
    #[arg(long, hide = true, conflicts_with = "in_process")]
    worker_rank: Option<usize>,

    /// Run as one rank of an MPI job; the rank count comes from `mpirun`.
    #[cfg(feature = "mpi")]
    #[arg(long, conflicts_with_all = ["in_process", "worker_rank"])]
    mpi: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    #[cfg(feature = "mpi")]
    if cli.mpi {
        return run_mpi(&cli);
    }

    let config = PiConfig::new(cli.digits, cli.procs, cli.threads, cli.algorithm);
    config.validate()?;

    if let Some(rank) = cli.worker_rank {
        return run_worker(&config, rank);
    }

    if !cli.csv {
        let ranks = if cli.in_process { "in-process ranks" } else { "processes" };
        print_configuration(&config, ranks);
    }

    let spinner = (!cli.csv).then(start_spinner).transpose()?;
    let outcome = if cli.in_process {
        compute_pi(&config).context("in-process run failed")
    } else {
        run_processes(&config)
    };
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = outcome?;

    if cli.csv {
        print_csv(&report);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Worker side of a multi-process run: computes one rank and streams its
/// payload to the root over stdout.
fn run_worker(config: &PiConfig, rank: usize) -> Result<()> {
    anyhow::ensure!(
        (1..config.procs).contains(&rank),
        "worker rank {rank} is outside 1..{}",
        config.procs
    );
    let out = BufWriter::new(std::io::stdout().lock());
    let mut comm = PipeWorker::new(rank, config.procs, out);
    run_rank(config, &mut comm).with_context(|| format!("worker rank {rank} failed"))?;
    Ok(())
}

/// Root side of a multi-process run.
///
/// Workers are spawned before the root starts its own block so all ranks
/// compute concurrently; the root then folds their payloads in rank order.
fn run_processes(config: &PiConfig) -> Result<PiReport> {
    let start = Instant::now();
    let mut workers = WorkerGroup::spawn(config)?;
    info!(workers = config.procs - 1, "worker processes started");

    let mut root = PipeRoot::new(
        workers.take_outputs()?,
        codec::max_payload_len(config.precision()),
    );
    let pi = run_rank(config, &mut root)
        .context("root rank failed")?
        .context("root rank produced no result")?;
    drop(root);
    workers.wait()?;

    Ok(PiReport::new(*config, pi, start.elapsed()))
}

/// One rank of an MPI job.
///
/// Every rank validates the configuration, but only the root reports a
/// failure, so an invalid run prints one error instead of one per rank.
#[cfg(feature = "mpi")]
fn run_mpi(cli: &Cli) -> Result<()> {
    use pirust_core::comm::{Communicator, MpiComm};
    use pirust_core::Precision;
    use tracing::warn;

    let slot = codec::max_payload_len(Precision::for_digits(cli.digits));
    let mut comm = MpiComm::init(slot)?;
    if cli.procs != 1 && cli.procs != comm.size() {
        warn!(requested = cli.procs, world = comm.size(), "--procs ignored under MPI");
    }

    let config = PiConfig::new(cli.digits, comm.size(), cli.threads, cli.algorithm);
    if let Err(err) = config.validate() {
        return if comm.is_root() { Err(err.into()) } else { Ok(()) };
    }

    let root = comm.is_root();
    if root && !cli.csv {
        print_configuration(&config, "MPI ranks");
    }
    let spinner = (root && !cli.csv).then(start_spinner).transpose()?;

    let start = Instant::now();
    let outcome = run_rank(&config, &mut comm)
        .with_context(|| format!("MPI rank {} failed", comm.rank()));
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if let Some(pi) = outcome? {
        let report = PiReport::new(config, pi, start.elapsed());
        if cli.csv {
            print_csv(&report);
        } else {
            print_report(&report);
        }
    }
    Ok(())
}

fn start_spinner() -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?,
    );
    spinner.set_message("Computing Pi...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    Ok(spinner)
}

fn print_configuration(config: &PiConfig, ranks: &str) {
    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);

    println!("--- Execution Configuration ---");
    println!("PiRust v{}", VERSION);
    println!("Environment: {} logical processors.", num_cpus);
    println!("Algorithm: {}", config.algorithm);
    println!(
        "Precision: {} digits ({}), {} iterations.",
        format_number(config.digits),
        config.precision(),
        format_number(config.iterations())
    );
    println!("Workers: {} {} x {} threads.", config.procs, ranks, config.threads);
    println!();
}

fn print_report(report: &PiReport) {
    println!("--- Execution Complete ---");
    println!("Pi = {}", report.pi_string());
    println!();
    println!(
        "Decimals computed    : {} / {}",
        format_number(report.decimals_computed),
        format_number(report.config.digits)
    );
    println!("Iterations           : {}", format_number(report.iterations));
    println!("Execution time       : {}", format_duration(report.elapsed));
}

fn print_csv(report: &PiReport) {
    let config = &report.config;
    println!(
        "{},{},{},{},{},{},{},{:.6}",
        BACKEND,
        config.algorithm.name(),
        config.digits,
        report.iterations,
        config.procs,
        config.threads,
        report.decimals_computed,
        report.elapsed.as_secs_f64()
    );
}

/// Formats a duration into a human-readable string (ms or s).
fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1 {
        format!("{:.2}ms", duration.as_micros() as f64 / 1000.0)
    } else if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Formats a number with comma separators (e.g., "1,000,000").
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}
