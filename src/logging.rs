//! Diagnostic logging setup.
//!
//! Progress lines go to stdout with `println!`; everything routed through
//! `tracing` goes to stderr so the two never interleave in a pipe.

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count. `RUST_LOG` wins when set.
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace,reqwest=debug,hyper=debug",
    }
}

pub fn init_logging(verbose: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3)
        .try_init();

    tracing::debug!("logging initialized at verbosity {}", verbose);
}
