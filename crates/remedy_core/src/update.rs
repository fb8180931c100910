use crate::{AppState, Effect, Msg, Phase};

/// Pure update function: applies a message to state and returns any effects.
///
/// Engine messages carry the id of the job they belong to; anything addressed
/// to a job that is no longer current is dropped so a superseded flow can never
/// touch the new job.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(path) => {
            let previous = state.replace_job(path);
            match previous {
                Some(job) if job.phase().is_active() => vec![Effect::CancelJob { job_id: job.id() }],
                _ => Vec::new(),
            }
        }
        Msg::StartClicked => {
            let Some(phase) = state.job().map(|job| job.phase()) else {
                return (state, Vec::new());
            };
            if phase.is_active() {
                return (state, Vec::new());
            }
            if phase.is_terminal() {
                // Retry: same file, fresh job.
                let path = state
                    .job()
                    .map(|job| job.source_path().to_path_buf())
                    .unwrap_or_default();
                state.replace_job(path);
            }
            match state.job_mut() {
                Some(job) => {
                    job.begin_upload();
                    let effect = Effect::UploadSource {
                        job_id: job.id(),
                        source_path: job.source_path().to_path_buf(),
                        source_name: job.source_name().to_string(),
                    };
                    state.mark_dirty();
                    vec![effect]
                }
                None => Vec::new(),
            }
        }
        Msg::UploadFinished { job_id, result } => match state.current_job_mut(job_id) {
            Some(job) if job.phase() == Phase::Uploading => {
                let effects = match result {
                    Ok(()) => {
                        job.begin_processing();
                        vec![
                            Effect::PollForResult {
                                job_id,
                                result_name: job.result_name().to_string(),
                            },
                            Effect::StartStageTimeline { job_id },
                        ]
                    }
                    Err(failure) => {
                        job.fail(failure);
                        Vec::new()
                    }
                };
                state.mark_dirty();
                effects
            }
            _ => Vec::new(),
        },
        Msg::PollAttempted { job_id, attempt } => {
            let changed = state
                .current_job_mut(job_id)
                .filter(|job| job.phase() == Phase::Processing)
                .is_some_and(|job| job.record_attempt(attempt));
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ResultFetched { job_id, payload } => match state.current_job_mut(job_id) {
            Some(job) if job.phase() == Phase::Processing => {
                job.complete(payload.clone());
                let effect = Effect::SaveResult {
                    job_id,
                    result_name: job.result_name().to_string(),
                    payload,
                };
                state.mark_dirty();
                vec![effect]
            }
            _ => Vec::new(),
        },
        Msg::PollFailed { job_id, failure } => {
            if let Some(job) = state
                .current_job_mut(job_id)
                .filter(|job| job.phase() == Phase::Processing)
            {
                job.fail(failure);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StageReached { job_id, stage } => {
            let changed = state
                .current_job_mut(job_id)
                .filter(|job| job.phase() == Phase::Processing)
                .is_some_and(|job| job.advance_stage(stage));
            if changed {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ResultSaved { job_id, result } => {
            if let Some(job) = state
                .current_job_mut(job_id)
                .filter(|job| job.phase() == Phase::Done)
            {
                job.record_saved(result);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
