use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::buildings;
use crate::debounce::Debouncer;
use crate::session::{Session, SessionStore};
use crate::AppError;

/// Quiet period applied to manual refresh triggers; bounds the request
/// volume under rapid repeated input.
const REFRESH_QUIET_PERIOD: Duration = Duration::from_millis(400);

const MIN_INTERVAL_SECS: u64 = 5;

/// Live status rollup. One fetch cycle at a time; a failed cycle is
/// terminal for that tick and the loop waits for the next trigger. A 401
/// ends the watch through the global session-expiry path.
pub async fn run(
    base: &str,
    store: &SessionStore,
    session: &Session,
    interval_secs: u64,
) -> Result<(), AppError> {
    let interval = Duration::from_secs(interval_secs.max(MIN_INTERVAL_SECS));
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    println!(
        "Watching building status every {}s. Press Enter to refresh, Ctrl-C to exit.",
        interval.as_secs()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let debouncer = Debouncer::new(REFRESH_QUIET_PERIOD);

    loop {
        refresh(base, store, session).await?;

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => {}
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(_)) => {
                        // Absorb the burst, then refresh once.
                        debouncer.trigger();
                        loop {
                            tokio::select! {
                                _ = cancel.cancelled() => return Ok(()),
                                _ = debouncer.settled() => break,
                                more = lines.next_line() => match more {
                                    Ok(Some(_)) => debouncer.trigger(),
                                    _ => {
                                        stdin_open = false;
                                        break;
                                    }
                                }
                            }
                        }
                    }
                    _ => stdin_open = false,
                }
            }
        }
    }

    info!("watch stopped");
    Ok(())
}

async fn refresh(base: &str, store: &SessionStore, session: &Session) -> Result<(), AppError> {
    println!();
    println!("--- {} ---", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    match buildings::render_status(base, store, session, None).await {
        Ok(()) => Ok(()),
        Err(AppError::SessionExpired) => Err(AppError::SessionExpired),
        Err(e) => {
            // Terminal for this tick only; the next trigger retries.
            error!(error = %e, "status refresh failed");
            Ok(())
        }
    }
}
