use std::fmt;
use std::path::PathBuf;

pub type JobId = u64;

/// Direction of a transfer grant. Serialized with the signing service's
/// wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum TransferAction {
    #[serde(rename = "subir")]
    Upload,
    #[serde(rename = "bajar")]
    Download,
}

impl TransferAction {
    pub fn wire_name(self) -> &'static str {
        match self {
            TransferAction::Upload => "subir",
            TransferAction::Download => "bajar",
        }
    }
}

/// Short-lived, single-use URL for one transfer. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferGrant {
    pub url: url::Url,
    pub action: TransferAction,
    pub object_name: String,
}

/// Stages the decorative timeline can light up. The terminal stage is not
/// here: only the poller may finish a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimelineStage {
    Analyst,
    Strategist,
    Generator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    UploadCompleted {
        job_id: JobId,
        result: Result<(), TransferError>,
    },
    PollAttempted {
        job_id: JobId,
        attempt: u32,
    },
    ResultFetched {
        job_id: JobId,
        payload: String,
    },
    PollFailed {
        job_id: JobId,
        error: TransferError,
    },
    StageReached {
        job_id: JobId,
        stage: TimelineStage,
    },
    ResultSaved {
        job_id: JobId,
        result: Result<PathBuf, String>,
    },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

#[derive(Clone)]
pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransferError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransferError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Signing service unreachable, non-2xx, or no usable URL.
    Signing,
    /// Object store refused the upload or the transfer broke.
    Upload,
    /// Result object does not exist yet.
    NotFound,
    /// Download answered with a non-2xx status other than 404.
    HttpStatus(u16),
    /// Download exceeded the configured size cap.
    TooLarge { max_bytes: u64 },
    /// Download body could not be decoded as text.
    Decode,
    Timeout,
    Network,
    PollTimeout { attempts: u32 },
    ReadSource,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Signing => write!(f, "signing error"),
            FailureKind::Upload => write!(f, "upload error"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::TooLarge { max_bytes } => {
                write!(f, "response too large (max {max_bytes})")
            }
            FailureKind::Decode => write!(f, "undecodable payload"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::PollTimeout { attempts } => {
                write!(f, "poll timeout after {attempts} attempts")
            }
            FailureKind::ReadSource => write!(f, "cannot read source file"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}
