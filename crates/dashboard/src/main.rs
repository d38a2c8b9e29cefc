use dotenvy::dotenv;
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

use common::actors::{Actor, ActorType};
use common::config::DashboardConfig;
use common::logger;
use signal_feed::{DashboardClient, SignalPoller, SignalSource};
use storage::{LogBuffer, SignalStore};

use crate::actors::supervisor::Supervisor;
use crate::services::terminal_view::{self, TerminalView};

mod actors;
mod services;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = DashboardConfig::from_env()?;

    // The view redraws stdout; on a tty stderr shares that screen.
    let _log_guard = if std::io::stdout().is_terminal() {
        let guard = logger::setup_file_logger(&config.log_dir);
        terminal_view::install_panic_hook();
        Some(guard)
    } else {
        logger::setup_logger();
        None
    };
    debug!("Dashboard starting up...");

    let client = DashboardClient::from_config(&config)?;
    info!(
        "Polling {} every {:?}",
        client.endpoint(),
        config.poll_interval
    );
    let source: Arc<dyn SignalSource> = Arc::new(client);

    let store = Arc::new(SignalStore::new(config.signal_capacity));
    let log = Arc::new(LogBuffer::new(config.log_capacity));
    debug!(
        "Keeping up to {} signals and {} log lines",
        store.capacity(),
        log.capacity()
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let view = TerminalView::new(store.subscribe(), log.subscribe());
    let view_handle = tokio::spawn(view.run(shutdown_rx.clone()));

    let mut supervisor = Supervisor::new();
    let period = config.poll_interval;
    supervisor.register_actor(
        ActorType::SignalPoller,
        Box::new(move || -> Box<dyn Actor> {
            Box::new(SignalPoller::new(
                source.clone(),
                store.clone(),
                log.clone(),
                period,
            ))
        }),
    );

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, shutting down"),
            Err(e) => error!("Failed to listen for Ctrl-C, shutting down: {}", e),
        }
        shutdown_tx.send_replace(true);
    });

    supervisor.start(shutdown_rx).await;

    if let Err(e) = view_handle.await {
        terminal_view::restore_terminal();
        error!("Terminal view task failed: {}", e);
    }
    info!(
        "Dashboard stopped, {} poller error reports",
        supervisor.reported_errors(ActorType::SignalPoller)
    );
    Ok(())
}
