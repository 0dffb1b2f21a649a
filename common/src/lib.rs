//! Shared runtime bootstrap for the rupload tools
//!
//! Every tool builds its configuration from the command line and hands an async entry point to
//! [`run`], which sets up logging, builds the tokio runtime, drives the future to completion and
//! reports the outcome.

use std::io::IsTerminal;

pub mod config;

pub use config::OutputConfig;
pub use config::RuntimeConfig;

fn init_tracing(output: &OutputConfig) {
    // RUST_LOG overrides the verbosity flags, but never --quiet
    let filter = if output.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(output.log_level()))
    };
    // stdout belongs to the external tools we spawn, keep our own output on stderr
    let res = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
    if let Err(error) = res {
        // only happens when a subscriber is already installed, e.g. in tests
        eprintln!("tracing subscriber already initialized: {error}");
    }
}

fn build_runtime(runtime: &RuntimeConfig) -> anyhow::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if runtime.max_workers > 0 {
        builder.worker_threads(runtime.max_workers);
    }
    if runtime.max_blocking_threads > 0 {
        builder.max_blocking_threads(runtime.max_blocking_threads);
    }
    let runtime = builder.build()?;
    Ok(runtime)
}

/// Run `func` to completion on a freshly built tokio runtime.
///
/// Returns `None` if the runtime could not be created or `func` failed; the error is logged
/// (unless `quiet` was requested) and the caller is expected to exit with a non-zero status.
pub fn run<Fut, Summary, Error>(
    output: OutputConfig,
    runtime: RuntimeConfig,
    func: impl FnOnce() -> Fut,
) -> Option<Summary>
where
    Summary: std::fmt::Display,
    Error: std::fmt::Display,
    Fut: std::future::Future<Output = Result<Summary, Error>>,
{
    init_tracing(&output);
    let runtime = match build_runtime(&runtime) {
        Ok(runtime) => runtime,
        Err(error) => {
            tracing::error!("failed to create tokio runtime: {:#}", &error);
            return None;
        }
    };
    let res = runtime.block_on(func());
    match res {
        Ok(summary) => {
            if output.wants_summary() {
                println!("{summary}");
            }
            Some(summary)
        }
        Err(error) => {
            tracing::error!("{:#}", &error);
            None
        }
    }
}
