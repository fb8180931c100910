use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use remedy_logging::remedy_trace;

use crate::{EngineEvent, JobId, ProgressSink, TimelineSettings};

/// Emits the decorative stage sequence for a processing job.
///
/// Runs on its own schedule and knows nothing about the poller; it ends after
/// the last step or as soon as `cancel` fires.
pub async fn run_stage_timeline(
    job_id: JobId,
    settings: &TimelineSettings,
    cancel: &CancellationToken,
    sink: &dyn ProgressSink,
) {
    let started = Instant::now();
    for &(offset, stage) in &settings.steps {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = sleep_until(started + offset) => {}
        }
        remedy_trace!("Job {} timeline reached {:?}", job_id, stage);
        sink.emit(EngineEvent::StageReached { job_id, stage });
    }
}
