mod cli;

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use oracle_install::{InstallConfig, InstallReport};

/// Conventional exit status for a run cut short by a signal
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let _args = cli::Args::parse();

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let code = rt.block_on(real_main());
    // Drop the runtime (and anything it still owns) before exiting.
    drop(rt);
    std::process::exit(code);
}

async fn real_main() -> i32 {
    // Handlers go in before the pipeline starts, so a signal arriving while
    // the workspace is being set up is still caught.
    let mut shutdown = Shutdown::register();

    // The install future owns the workspace; losing the race to a signal drops
    // it, which removes the workspace before we report.
    tokio::select! {
        biased;

        signal = shutdown.recv() => {
            eprintln!("error: interrupted by {signal}, nothing was installed");
            EXIT_INTERRUPTED
        }
        result = install() => match result {
            Ok(report) => {
                println!("{report}");
                0
            }
            Err(e) => {
                eprintln!("error: {e:#}");
                1
            }
        },
    }
}

async fn install() -> Result<InstallReport> {
    let config = InstallConfig::load().context("failed to load configuration")?;
    let report = oracle_install::run(&config).await?;
    Ok(report)
}

/// SIGINT/SIGTERM listeners, registered eagerly
///
/// A listener that fails to register is logged and never fires.
struct Shutdown {
    #[cfg(unix)]
    interrupt: Option<tokio::signal::unix::Signal>,
    #[cfg(unix)]
    terminate: Option<tokio::signal::unix::Signal>,
    #[cfg(windows)]
    ctrl_c: Option<tokio::signal::windows::CtrlC>,
}

impl Shutdown {
    #[cfg(unix)]
    fn register() -> Self {
        use tokio::signal::unix::{SignalKind, signal};

        Self {
            interrupt: signal(SignalKind::interrupt())
                .map_err(|e| warn!("Failed to register SIGINT handler: {e}"))
                .ok(),
            terminate: signal(SignalKind::terminate())
                .map_err(|e| warn!("Failed to register SIGTERM handler: {e}"))
                .ok(),
        }
    }

    #[cfg(windows)]
    fn register() -> Self {
        Self {
            ctrl_c: tokio::signal::windows::ctrl_c()
                .map_err(|e| warn!("Failed to register Ctrl-C handler: {e}"))
                .ok(),
        }
    }

    /// Resolves with the signal's name once one arrives
    #[cfg(unix)]
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            Some(()) = next_signal(&mut self.interrupt) => "SIGINT",
            Some(()) = next_signal(&mut self.terminate) => "SIGTERM",
            else => std::future::pending().await,
        }
    }

    #[cfg(windows)]
    async fn recv(&mut self) -> &'static str {
        if let Some(ctrl_c) = &mut self.ctrl_c {
            if ctrl_c.recv().await.is_some() {
                return "Ctrl-C";
            }
        }
        std::future::pending().await
    }
}

#[cfg(unix)]
async fn next_signal(listener: &mut Option<tokio::signal::unix::Signal>) -> Option<()> {
    match listener {
        Some(listener) => listener.recv().await,
        None => std::future::pending().await,
    }
}
