use std::path::PathBuf;

use crate::JobId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Tear down every task still running for a superseded job.
    CancelJob { job_id: JobId },
    /// Request an upload grant and transfer the source file.
    UploadSource {
        job_id: JobId,
        source_path: PathBuf,
        source_name: String,
    },
    /// Start the completion poller for the derived result object.
    PollForResult { job_id: JobId, result_name: String },
    /// Start the decorative stage timeline.
    StartStageTimeline { job_id: JobId },
    /// Save the fetched script next to the other results.
    SaveResult {
        job_id: JobId,
        result_name: String,
        payload: String,
    },
}
