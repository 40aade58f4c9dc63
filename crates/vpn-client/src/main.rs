//! vpn-client — VPN Sentinel client agent binary.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vpn_client::config::ClientConfig;
use vpn_client::supervisor;

#[derive(Parser)]
#[command(name = "vpn-client")]
#[command(about = "VPN Sentinel client agent")]
#[command(version)]
struct Cli {}

#[tokio::main]
async fn main() {
    let _ = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("vpn_client=info".parse().expect("static directive parses")),
        )
        .init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let stop = CancellationToken::new();
    let signal_stop = stop.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install ctrl-c handler");
            return;
        }
        signal_stop.cancel();
    });

    #[cfg(unix)]
    {
        let term_stop = stop.clone();
        tokio::spawn(async move {
            let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(term) => term,
                Err(err) => {
                    error!(error = %err, "failed to install sigterm handler");
                    return;
                }
            };
            term.recv().await;
            term_stop.cancel();
        });
    }

    supervisor::run(config, stop).await;
}
