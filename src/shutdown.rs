/**
* filename : shutdown
* date: 2025. 6. 5.
* description: OS signal -> stop token
**/

use log::info;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Resolves on Ctrl+C or SIGTERM and returns the signal name.
pub async fn shutdown_signal() -> &'static str {
  let ctrl_c = async {
    signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{signal, SignalKind};
    let mut stream = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
    stream.recv().await;
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => "SIGINT",
    _ = terminate => "SIGTERM",
  }
}

/// Cancels `token` on the first shutdown signal.
pub async fn cancel_on_signal(token: CancellationToken) {
  tokio::select! {
    name = shutdown_signal() => {
      info!("[Shutdown] {} received, stopping workers", name);
      token.cancel();
    }
    _ = token.cancelled() => {}
  }
}
