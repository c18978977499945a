// server.rs - listener, graceful shutdown and background-task drain
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::routes::app;
use crate::state::AppState;

/// How long in-flight requests get to finish once shutdown starts.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("in-flight requests did not finish within {0:?}")]
    ShutdownTimeout(Duration),
}

/// Bind to `0.0.0.0:<port>` and serve until SIGINT or SIGTERM.
pub async fn serve(state: AppState) -> Result<(), ServerError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    serve_with_shutdown(listener, state, shutdown_signal()).await
}

/// Serve on an already bound listener until `signal` resolves. After the
/// signal, requests in flight get `SHUTDOWN_GRACE` to finish, then tracked
/// background tasks are awaited.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: AppState,
    signal: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let tasks = state.tasks.clone();
    let environment = state.config.environment;
    let local = listener.local_addr()?;

    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown = async move {
        signal.await;
        tracing::info!("shutting down server");
        let _ = signalled_tx.send(());
    };

    tracing::info!(addr = %local, env = %environment, "starting server");

    let server = axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown);
    let mut server = std::pin::pin!(server.into_future());

    tokio::select! {
        result = &mut server => result?,
        _ = signalled_rx => {
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
                Ok(result) => result?,
                Err(_) => return Err(ServerError::ShutdownTimeout(SHUTDOWN_GRACE)),
            }
        }
    }

    tracing::info!(tasks = tasks.len(), "completing background tasks");
    tasks.close();
    tasks.wait().await;

    tracing::info!(addr = %local, "stopped server");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for SIGINT: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
