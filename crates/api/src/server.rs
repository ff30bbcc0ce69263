//! Listener supervision and graceful shutdown.

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::app::Routers;

/// Serves `router` on `listener` until `shutdown` is cancelled.
pub async fn serve_until(
    name: &'static str,
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(listener = name, %addr, "Server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!(listener = name, "Server stopped");
    Ok(())
}

/// Runs the public and internal listeners as two supervised tasks.
///
/// Whichever listener stops first cancels `shutdown`, taking the other down
/// with it. Returns the first error encountered.
pub async fn run(
    public: TcpListener,
    internal: TcpListener,
    routers: Routers,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let mut tasks = JoinSet::new();
    tasks.spawn(serve_until(
        "public",
        public,
        routers.public,
        shutdown.clone(),
    ));
    tasks.spawn(serve_until(
        "internal",
        internal,
        routers.internal,
        shutdown.clone(),
    ));

    let mut result = Ok(());
    while let Some(joined) = tasks.join_next().await {
        shutdown.cancel();

        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(join_error) => Err(std::io::Error::new(std::io::ErrorKind::Other, join_error)),
        };
        if let Err(e) = outcome {
            error!(error = %e, "Listener failed");
            if result.is_ok() {
                result = Err(e);
            }
        }
    }

    result
}

/// Cancels `shutdown` on Ctrl-C or SIGTERM.
pub async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
        _ = shutdown.cancelled() => {}
    }

    shutdown.cancel();
}
