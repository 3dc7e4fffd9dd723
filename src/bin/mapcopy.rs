//! Copy benchmark for host-mapped Vulkan memory
//!
//! Usage: `mapcopy <memcpy|dumb|reference>`
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `warn`);
//! stdout carries only the report.

use std::io;
use std::process;

use mapcopy::{report, runner, strategy, GpuContext, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // Every Vulkan object is dropped inside `run`, before the exit code is set.
    if let Err(e) = run() {
        println!("{}", e);
        process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    let args = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned());
    let strategy = strategy::from_args(args)?;
    println!("{}", report::banner(strategy));

    let ctx = GpuContext::new_observed(|name| println!("{}", report::gpu_line(name)))?;
    debug!(validation = ctx.validation_enabled(), "Context ready");

    let result = runner::run_on(&ctx, strategy)?;
    report::write_result(&mut io::stdout().lock(), &result)?;
    Ok(())
}
