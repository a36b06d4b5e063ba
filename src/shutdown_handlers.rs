use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use volley::work::Work;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Stops `work` on the first Ctrl+C or SIGTERM. The task exits once a signal
/// was handled or `finished` fires.
pub fn setup_signal_stop_handler(
    work: Arc<Work>,
    finished: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = finished => {}
            () = wait_for_signal() => {
                info!("Signal received, letting in-flight requests finish");
                if let Err(err) = work.stop() {
                    debug!("Stop ignored: {}", err);
                }
            }
        }
    })
}

async fn wait_for_signal() {
    #[cfg(unix)]
    let mut term_signal = match signal(SignalKind::terminate()) {
        Ok(signal) => Some(signal),
        Err(err) => {
            warn!("Failed to register SIGTERM handler: {}", err);
            None
        }
    };

    #[cfg(unix)]
    {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    warn!("Failed to listen for Ctrl+C: {}", err);
                    std::future::pending::<()>().await;
                }
            }
            () = async {
                if let Some(signal) = term_signal.as_mut() {
                    signal.recv().await;
                } else {
                    std::future::pending::<()>().await;
                }
            } => {}
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    }
}
