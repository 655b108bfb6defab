use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Token that ends the interactive session when the terminal asks it to.
///
/// SIGINT and SIGTERM end the read loop at the next prompt. SIGHUP does the
/// same when the controlling terminal goes away. Foreground children share
/// the terminal and get the signal themselves; a scheduling pass or pipeline
/// already in progress is not interrupted by the shell.
pub fn install_shutdown_handler() -> std::io::Result<CancellationToken> {
    let session = CancellationToken::new();

    let signals = [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
        (SignalKind::hangup(), "SIGHUP"),
    ];
    for (kind, name) in signals {
        let mut stream = signal(kind)?;
        let session = session.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = session.cancelled() => {}
                Some(()) = stream.recv() => {
                    tracing::info!(signal = name, "Ending shell session");
                    session.cancel();
                }
            }
        });
    }

    Ok(session)
}
