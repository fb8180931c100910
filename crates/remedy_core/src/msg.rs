use std::path::PathBuf;

use crate::{JobFailure, JobId, Stage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a (new) incident report.
    FileSelected(PathBuf),
    /// User clicked Start.
    StartClicked,
    /// Grant request plus upload transfer finished.
    UploadFinished {
        job_id: JobId,
        result: Result<(), JobFailure>,
    },
    /// Poller is about to issue attempt number `attempt` (1-based).
    PollAttempted { job_id: JobId, attempt: u32 },
    /// Poller fetched the result object.
    ResultFetched { job_id: JobId, payload: String },
    /// Poller gave up.
    PollFailed { job_id: JobId, failure: JobFailure },
    /// Decorative timeline reached a stage.
    StageReached { job_id: JobId, stage: Stage },
    /// Fetched script was written to disk (or not).
    ResultSaved {
        job_id: JobId,
        result: Result<PathBuf, String>,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
