use std::fmt;
use std::path::{Path, PathBuf};

use crate::view_model::{AppViewModel, StageView};
use crate::{derive_result_name, source_name_of, Stage};

pub type JobId = u64;

/// Coarse lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Processing,
    Done,
    Error,
}

impl Phase {
    /// True while network work for the job may still be in flight.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Uploading | Phase::Processing)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Error)
    }
}

/// Why a job ended in `Phase::Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    /// Signing service unreachable, non-success, or no usable grant.
    Signing { message: String },
    /// Object store refused the upload or the transfer broke.
    Upload { message: String },
    /// Poll ceiling reached without the result appearing.
    PollTimeout { attempts: u32 },
    /// Object store answered a download with a definitive failure status.
    Rejected { status: u16 },
    /// Result arrived but could not be used (too large, undecodable).
    Download { message: String },
}

impl JobFailure {
    /// User-facing hint on what to check next.
    pub fn advice(&self) -> &'static str {
        match self {
            JobFailure::Signing { .. } | JobFailure::Upload { .. } => {
                "Upload failed. Check connectivity and the logs for details."
            }
            JobFailure::PollTimeout { .. } => {
                "Timed out waiting for the result. Check the remote pipeline's execution status."
            }
            JobFailure::Rejected { .. } | JobFailure::Download { .. } => {
                "The result could not be downloaded. Check the logs for details."
            }
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobFailure::Signing { message } => write!(f, "signing failed: {message}"),
            JobFailure::Upload { message } => write!(f, "upload failed: {message}"),
            JobFailure::PollTimeout { attempts } => {
                write!(f, "no result after {attempts} attempts")
            }
            JobFailure::Rejected { status } => write!(f, "download rejected with status {status}"),
            JobFailure::Download { message } => write!(f, "download failed: {message}"),
        }
    }
}

/// One file-to-script lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: JobId,
    source_path: PathBuf,
    source_name: String,
    result_name: String,
    phase: Phase,
    stage: Option<Stage>,
    poll_attempts: u32,
    payload: Option<String>,
    failure: Option<JobFailure>,
    saved: Option<Result<PathBuf, String>>,
}

impl Job {
    pub(crate) fn new(id: JobId, source_path: PathBuf) -> Self {
        let source_name = source_name_of(&source_path);
        let result_name = derive_result_name(&source_name);
        Self {
            id,
            source_path,
            source_name,
            result_name,
            phase: Phase::Idle,
            stage: None,
            poll_attempts: 0,
            payload: None,
            failure: None,
            saved: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn result_name(&self) -> &str {
        &self.result_name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn poll_attempts(&self) -> u32 {
        self.poll_attempts
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        self.failure.as_ref()
    }

    pub(crate) fn begin_upload(&mut self) {
        self.phase = Phase::Uploading;
        self.stage = Some(Stage::Start);
    }

    pub(crate) fn begin_processing(&mut self) {
        self.phase = Phase::Processing;
        self.poll_attempts = 0;
    }

    /// Attempt counts only move forward.
    pub(crate) fn record_attempt(&mut self, attempt: u32) -> bool {
        if attempt > self.poll_attempts {
            self.poll_attempts = attempt;
            true
        } else {
            false
        }
    }

    /// Decorative advance: forward only, never onto the terminal stage.
    pub(crate) fn advance_stage(&mut self, stage: Stage) -> bool {
        if stage > Stage::LAST_DECORATIVE {
            return false;
        }
        if self.stage.is_some_and(|current| current >= stage) {
            return false;
        }
        self.stage = Some(stage);
        true
    }

    pub(crate) fn complete(&mut self, payload: String) {
        self.phase = Phase::Done;
        self.stage = Some(Stage::End);
        self.payload = Some(payload);
    }

    pub(crate) fn fail(&mut self, failure: JobFailure) {
        self.phase = Phase::Error;
        self.failure = Some(failure);
    }

    pub(crate) fn record_saved(&mut self, result: Result<PathBuf, String>) {
        self.saved = Some(result);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    next_job_id: JobId,
    job: Option<Job>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.job.as_ref().map_or(Phase::Idle, Job::phase)
    }

    pub fn view(&self) -> AppViewModel {
        let Some(job) = self.job.as_ref() else {
            return AppViewModel {
                stages: stage_views(None),
                dirty: self.dirty,
                ..AppViewModel::default()
            };
        };

        let (saved_path, save_error) = match &job.saved {
            Some(Ok(path)) => (Some(path.clone()), None),
            Some(Err(err)) => (None, Some(err.clone())),
            None => (None, None),
        };

        AppViewModel {
            job_id: Some(job.id),
            phase: job.phase,
            source_name: Some(job.source_name.clone()),
            result_name: Some(job.result_name.clone()),
            stages: stage_views(job.stage),
            poll_attempts: job.poll_attempts,
            payload: job.payload.clone(),
            failure: job.failure.as_ref().map(ToString::to_string),
            advice: job.failure.as_ref().map(|f| f.advice().to_string()),
            saved_path,
            save_error,
            start_enabled: !job.phase.is_active(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Replaces the current job with a fresh one for `source_path`.
    /// Returns the superseded job, if any.
    pub(crate) fn replace_job(&mut self, source_path: PathBuf) -> Option<Job> {
        self.next_job_id += 1;
        let job = Job::new(self.next_job_id, source_path);
        self.mark_dirty();
        self.job.replace(job)
    }

    pub(crate) fn job_mut(&mut self) -> Option<&mut Job> {
        self.job.as_mut()
    }

    /// The current job, but only if `job_id` still refers to it.
    pub(crate) fn current_job_mut(&mut self, job_id: JobId) -> Option<&mut Job> {
        self.job.as_mut().filter(|job| job.id == job_id)
    }
}

fn stage_views(current: Option<Stage>) -> Vec<StageView> {
    Stage::ALL
        .iter()
        .map(|&stage| StageView {
            stage,
            label: stage.label(),
            reached: current.is_some_and(|c| c >= stage),
        })
        .collect()
}
