use clap::Parser;
use scrub::cli;
use scrub::run;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Parse args early to get the verbose flag for logging initialization.
    let args = cli::Args::parse();

    // Use RUST_LOG if set, otherwise the verbose flag.
    // Examples: RUST_LOG=debug, RUST_LOG=scrub=trace, RUST_LOG=scrub::archive=trace
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if args.verbose {
        EnvFilter::new("scrub=debug")
    } else {
        EnvFilter::new("scrub=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    debug!("logging initialized (verbose={})", args.verbose);

    let cli::Command::Sanitize(sanitize) = args.command;
    let opts = match sanitize.to_run_options() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    if !opts.config.quiet {
        // Status info never goes to stdout; the report may live there.
        eprintln!("scrub v{}", env!("CARGO_PKG_VERSION"));
    }

    match run::run(&opts) {
        Ok(outcome) => ExitCode::from(outcome.exit_code as u8),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
