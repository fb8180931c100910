use std::time::Duration;

use remedy_core::{Effect, JobFailure, Msg, Stage};
use remedy_engine::{EngineEvent, EngineHandle, FailureKind, TimelineStage, TransferError};
use remedy_logging::{remedy_info, remedy_warn};

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CancelJob { job_id } => {
                    remedy_info!("CancelJob job_id={}", job_id);
                    self.engine.cancel(job_id);
                }
                Effect::UploadSource {
                    job_id,
                    source_path,
                    source_name,
                } => {
                    remedy_info!("UploadSource job_id={} path={:?}", job_id, source_path);
                    self.engine.upload(job_id, source_path, source_name);
                }
                Effect::PollForResult {
                    job_id,
                    result_name,
                } => {
                    remedy_info!("PollForResult job_id={} name={}", job_id, result_name);
                    self.engine.poll(job_id, result_name);
                }
                Effect::StartStageTimeline { job_id } => {
                    self.engine.start_timeline(job_id);
                }
                Effect::SaveResult {
                    job_id,
                    result_name,
                    payload,
                } => {
                    self.engine.save(job_id, result_name, payload);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event, translated for `update`.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadCompleted { job_id, result } => Msg::UploadFinished {
            job_id,
            result: result.map_err(|err| {
                remedy_warn!("Job {} upload failed: {}", job_id, err);
                map_upload_failure(err)
            }),
        },
        EngineEvent::PollAttempted { job_id, attempt } => Msg::PollAttempted { job_id, attempt },
        EngineEvent::ResultFetched { job_id, payload } => Msg::ResultFetched { job_id, payload },
        EngineEvent::PollFailed { job_id, error } => {
            remedy_warn!("Job {} polling failed: {}", job_id, error);
            Msg::PollFailed {
                job_id,
                failure: map_poll_failure(error),
            }
        }
        EngineEvent::StageReached { job_id, stage } => Msg::StageReached {
            job_id,
            stage: map_stage(stage),
        },
        EngineEvent::ResultSaved { job_id, result } => Msg::ResultSaved { job_id, result },
    }
}

fn map_upload_failure(err: TransferError) -> JobFailure {
    match err.kind {
        FailureKind::Signing => JobFailure::Signing {
            message: err.message,
        },
        _ => JobFailure::Upload {
            message: err.to_string(),
        },
    }
}

fn map_poll_failure(err: TransferError) -> JobFailure {
    match err.kind {
        FailureKind::PollTimeout { attempts } => JobFailure::PollTimeout { attempts },
        FailureKind::HttpStatus(status) => JobFailure::Rejected { status },
        _ => JobFailure::Download {
            message: err.to_string(),
        },
    }
}

fn map_stage(stage: TimelineStage) -> Stage {
    match stage {
        TimelineStage::Analyst => Stage::Analyst,
        TimelineStage::Strategist => Stage::Strategist,
        TimelineStage::Generator => Stage::Generator,
    }
}
