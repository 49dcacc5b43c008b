//! Graceful shutdown trigger for the HTTP server.

use std::future::Future;

use tokio::signal;

/// Resolves once Ctrl+C or SIGTERM arrives.
///
/// A signal source that cannot be installed never fires, so the other one
/// still governs shutdown.
pub async fn shutdown_signal() {
    let ctrl_c = until_signal("Ctrl+C", signal::ctrl_c());

    #[cfg(unix)]
    let terminate = until_signal("SIGTERM", async {
        let mut sig = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        sig.recv().await;
        Ok::<(), std::io::Error>(())
    });

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

async fn until_signal<F>(name: &'static str, wait: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(err) = wait.await {
        tracing::error!(signal = name, error = %err, "Failed to install signal handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[tokio::test]
    async fn failed_handler_install_never_resolves() {
        let waited = tokio::time::timeout(
            Duration::from_millis(50),
            until_signal("TEST", async { Err::<(), _>(io::Error::other("no signal support")) }),
        )
        .await;

        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn delivered_signal_resolves() {
        let waited =
            tokio::time::timeout(Duration::from_millis(50), until_signal("TEST", async { Ok::<(), io::Error>(()) }))
                .await;

        assert!(waited.is_ok());
    }
}
