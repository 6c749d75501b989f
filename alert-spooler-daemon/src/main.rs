use anyhow::Result;
use clap::Parser;

use alert_spooler_daemon::cli::DaemonCli;
use alert_spooler_daemon::{logging, metrics_server, settings};
use alert_spooler_pipeline::{Runner, TcpSyslogSender};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let config = settings::load_config(&cli).await?;

    if cli.validate {
        println!("configuration is valid");
        return Ok(());
    }

    logging::init_tracing(config.effective_log_level(), &config.general.log_format)?;

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
    }

    let runner_config = settings::runner_config(&config, &cli)?;
    let sender = TcpSyslogSender::new(config.delivery.syslog_addr.as_str());
    let mut runner = Runner::new(runner_config, sender)
        .map_err(|e| anyhow::anyhow!("failed to start runner: {}", e))?;

    tracing::info!(
        syslog_addr = %config.delivery.syslog_addr,
        once = cli.once,
        replay = cli.replay_from.is_some(),
        "alert-spooler starting"
    );

    // The store handle is not Sync, so cycles run on the main task rather than a spawned one.
    if cli.once {
        let result = runner.run_once().await;
        runner.close();
        result.map_err(|e| anyhow::anyhow!("cycle failed: {}", e))?;
        return Ok(());
    }

    let interval = settings::poll_interval(&cli);
    loop {
        if let Err(e) = runner.run_once().await {
            tracing::error!(error = %e, "cycle failed");
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }

    runner.close();
    tracing::info!("alert-spooler shut down");
    Ok(())
}
