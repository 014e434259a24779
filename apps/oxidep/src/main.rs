use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, error, info};
use oxidep_check::{CheckArgs, OutputFormat};
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "oxidep")]
#[command(about = "Check that Python projects declare what they import", long_about = None)]
struct Cli {
    /// Log progress (same as RUST_LOG=info)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare declared dependencies with the modules the code imports
    Check(CheckArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let start = Instant::now();

    match cli.command {
        Commands::Check(args) => {
            let num_threads = rayon::current_num_threads();
            info!("Running dependency check (using {} threads)", num_threads);
            debug!(
                "Args: paths={:?}, project={:?}, tests={:?}, python={}",
                args.paths, args.project, args.tests, args.python
            );

            let result = oxidep_check::run_dependency_check(&args)?;
            debug!("Found {} warnings", result.warnings.len());

            let elapsed_ms = start.elapsed().as_millis();

            if args.format == OutputFormat::Json {
                oxidep_check::print_warnings_json(&mut stdout, &result.warnings)?;
            } else {
                if result.is_clean() {
                    oxidep_check::print_no_problems_message(&mut stdout)?;
                } else {
                    oxidep_check::print_warnings(&mut stdout, &result.warnings)?;
                }
                writeln!(
                    stdout,
                    "\n{} Finished in {}ms on {} files (using {} threads).",
                    "●".bright_blue(),
                    elapsed_ms.to_string().cyan(),
                    result.files_analyzed.to_string().cyan(),
                    num_threads.to_string().cyan()
                )?;
            }
            stdout.flush()?;

            let missing = result.missing_packages();
            if let Some(advice) = oxidep_check::missing_packages_advice(&missing) {
                error!("{}", advice);
            }

            if !result.is_clean() {
                // Non-zero exit to fail CI
                std::process::exit(1);
            }

            Ok(())
        }
    }
}
