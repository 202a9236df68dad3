// Copyright (c) 2025 The Shibartum developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use log::*;
use mimalloc::MiMalloc;
use shibartum::global::*;
use shibartum::settings::Settings;
use tokio::runtime::Builder;
use tracing_subscriber::prelude::*;
use triomphe::Arc;

#[cfg(not(windows))]
use signal_hook::consts::TERM_SIGNALS;
#[cfg(not(windows))]
use signal_hook::flag;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> anyhow::Result<()> {
    #[cfg(not(windows))]
    for sig in TERM_SIGNALS {
        // When terminated by a second term signal, exit with exit code 1.
        // This will do nothing the first time (because term_now is false).
        flag::register_conditional_shutdown(*sig, 1, EXIT_SIGNAL.clone())?;
        // But this will "arm" the above for the second time, by setting it to true.
        // The order of registering these is important, if you put this one first, it will
        // first arm and then terminate, all in the first round.
        flag::register(*sig, EXIT_SIGNAL.clone())?;
    }

    let settings = Arc::new(Settings::new()?);
    start_runtime(settings)
}

fn start_runtime(settings: Arc<Settings>) -> anyhow::Result<()> {
    let worker_threads = if settings.network.worker_threads == 0 {
        num_cpus::get()
    } else {
        settings.network.worker_threads as usize
    };

    let runtime = Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_io()
        .enable_time()
        .build()?;

    runtime.block_on(async {
        init_tracing()?;
        perform_sanity_checks(&settings);

        let (addr, server) = shibartum::api::bind(settings.clone(), wait_for_exit_signal())?;

        info!(
            "Starting Shibartum Presale Backend v{} at http://{}",
            env!("CARGO_PKG_VERSION"),
            addr
        );
        info!("Available endpoints:");
        info!("   GET  /api/health - Health check");
        info!("   POST /api/confirm-purchase - Confirm token purchase");
        info!("   GET  /api/config - Presale configuration");
        info!("   GET  /api/quote?amount=N - Price quote");

        if let Some(dir) = settings.network.static_dir.as_deref() {
            info!("Serving front-end from {}", dir);
        }

        server.await;

        info!(
            "Shibartum Presale Backend v{} shutting down...",
            env!("CARGO_PKG_VERSION")
        );

        Ok::<(), anyhow::Error>(())
    })
}

/// Installs a fmt subscriber filtered by `RUST_LOG`. Records emitted through
/// `log` are captured as well.
fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

fn perform_sanity_checks(settings: &Settings) {
    // Problems are reported but the server still starts, the confirmation
    // endpoint answers 500 until the owner key is set
    for problem in settings.validate() {
        warn!("Configuration problem: {}", problem);
    }

    info!(
        "Presale: {} ({}) at {} SOL on {}",
        settings.presale.token_name,
        settings.presale.token_symbol,
        settings.presale.token_price_sol,
        settings.presale.network_name
    );
}
