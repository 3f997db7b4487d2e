//! Entry point for the Sunday Pay binary.
//!
//! Running this binary starts an HTTP server that exposes the pay
//! projection engine and shift-allocation simulator.  See
//! [`sunday_pay::config`] for the environment variables it reads.
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use sunday_pay::config::AppConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {err:#}");
            std::process::exit(1);
        }
    };
    info!(
        tax_law_dir = %config.tax_law_dir.display(),
        max_trials = config.max_trials,
        "starting sunday pay server"
    );
    if let Err(err) = sunday_pay::api::serve(config).await {
        error!("error running server: {err:#}");
        std::process::exit(1);
    }
}
