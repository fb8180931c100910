use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use remedy_logging::{remedy_debug, remedy_info, remedy_warn};

use crate::{
    EngineEvent, FailureKind, GrantIssuer, JobId, ObjectStore, PollSettings, ProgressSink,
    TransferAction, TransferError,
};

/// How a failed attempt affects the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptClass {
    /// Object not there yet; the expected steady state.
    NotReady,
    /// Worth another attempt, but logged.
    Transient,
    /// Polling again cannot help.
    Definitive,
}

pub fn classify(kind: &FailureKind) -> AttemptClass {
    match kind {
        FailureKind::NotFound => AttemptClass::NotReady,
        FailureKind::Signing | FailureKind::Network | FailureKind::Timeout => {
            AttemptClass::Transient
        }
        FailureKind::HttpStatus(status) if *status == 429 || (500..600).contains(status) => {
            AttemptClass::Transient
        }
        _ => AttemptClass::Definitive,
    }
}

/// Polls for `result_name` until it can be fetched, the attempt ceiling is
/// reached, a definitive failure occurs, or `cancel` fires.
///
/// Every attempt requests its own download grant. The interval is owned by this
/// future and dropped on every return path, so no timer outlives the loop.
pub async fn poll_for_result(
    job_id: JobId,
    result_name: &str,
    issuer: &dyn GrantIssuer,
    store: &dyn ObjectStore,
    settings: &PollSettings,
    cancel: &CancellationToken,
    sink: &dyn ProgressSink,
) -> Result<String, TransferError> {
    let mut ticker = interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempt: u32 = 0;

    remedy_info!(
        "Polling for {} every {:?} (max {} attempts)",
        result_name,
        settings.interval,
        settings.max_attempts
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                remedy_info!("Polling for {} cancelled after {} attempts", result_name, attempt);
                return Err(TransferError::new(FailureKind::Cancelled, "poll cancelled"));
            }
            _ = ticker.tick() => {}
        }

        attempt += 1;
        sink.emit(EngineEvent::PollAttempted { job_id, attempt });
        remedy_debug!("Attempt {} for {}", attempt, result_name);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                remedy_info!("Polling for {} cancelled during attempt {}", result_name, attempt);
                return Err(TransferError::new(FailureKind::Cancelled, "poll cancelled"));
            }
            outcome = fetch_once(issuer, store, result_name) => outcome,
        };

        let err = match outcome {
            Ok(payload) => {
                remedy_info!(
                    "Fetched {} on attempt {} ({} bytes)",
                    result_name,
                    attempt,
                    payload.len()
                );
                return Ok(payload);
            }
            Err(err) => err,
        };

        match classify(&err.kind) {
            AttemptClass::NotReady => {}
            AttemptClass::Transient => {
                remedy_warn!(
                    "Attempt {} for {} failed transiently: {}",
                    attempt,
                    result_name,
                    err
                );
            }
            AttemptClass::Definitive => {
                remedy_warn!("Giving up on {}: {}", result_name, err);
                return Err(err);
            }
        }

        if attempt >= settings.max_attempts {
            remedy_warn!("No {} after {} attempts", result_name, attempt);
            return Err(TransferError::new(
                FailureKind::PollTimeout { attempts: attempt },
                format!("last attempt: {err}"),
            ));
        }
    }
}

async fn fetch_once(
    issuer: &dyn GrantIssuer,
    store: &dyn ObjectStore,
    result_name: &str,
) -> Result<String, TransferError> {
    let grant = issuer.issue(TransferAction::Download, result_name).await?;
    store.get_text(&grant).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_polling_quietly() {
        assert_eq!(classify(&FailureKind::NotFound), AttemptClass::NotReady);
    }

    #[test]
    fn transport_and_server_errors_are_transient() {
        for kind in [
            FailureKind::Signing,
            FailureKind::Network,
            FailureKind::Timeout,
            FailureKind::HttpStatus(500),
            FailureKind::HttpStatus(503),
            FailureKind::HttpStatus(429),
        ] {
            assert_eq!(classify(&kind), AttemptClass::Transient, "{kind}");
        }
    }

    #[test]
    fn client_errors_are_definitive() {
        for kind in [
            FailureKind::HttpStatus(400),
            FailureKind::HttpStatus(403),
            FailureKind::HttpStatus(410),
            FailureKind::TooLarge { max_bytes: 1 },
            FailureKind::Decode,
        ] {
            assert_eq!(classify(&kind), AttemptClass::Definitive, "{kind}");
        }
    }
}
