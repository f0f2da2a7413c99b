use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use price_audit::cli::Cli;
use price_audit::pipeline::{exit_code, EXIT_FAIL, EXIT_INTERRUPTED};
use price_audit::report::render;
use price_audit::{logging, CoinGeckoTransport, PriceAudit};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_FAIL)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let settings = cli.into_settings().context("Invalid configuration")?;
    let _log_guard = logging::init(&settings.log_dir)?;

    info!("Price audit v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Coins: {} | Currency: {} | Attempts: {}",
        settings.coins_csv(),
        settings.currency,
        settings.retry.max_attempts
    );

    let output = settings.output;
    let transport = CoinGeckoTransport::new(settings.endpoint.clone(), settings.retry.timeout())?;
    let audit = PriceAudit::new(settings, transport);

    let report = tokio::select! {
        result = audit.execute() => result?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for interrupt")?;
            warn!("Interrupted by user, no report written");
            return Ok(EXIT_INTERRUPTED);
        }
    };

    println!("{}", render(&report, output)?);
    Ok(exit_code(&report))
}
