//! Remedy engine: signing, transfers, polling and effect execution.
mod config;
mod decode;
mod engine;
mod http;
mod persist;
mod poll;
mod signing;
mod store;
mod timeline;
mod types;
mod upload;

pub use config::{EngineConfig, HttpSettings, PollSettings, TimelineSettings, DEFAULT_SIGNING_ENDPOINT};
pub use decode::{decode_text, DecodeError, DecodedText};
pub use engine::EngineHandle;
pub use persist::{ensure_output_dir, safe_file_name, save_result, PersistError};
pub use poll::{classify, poll_for_result, AttemptClass};
pub use signing::{GrantIssuer, ReqwestGrantIssuer};
pub use store::{ObjectStore, ReqwestObjectStore};
pub use timeline::run_stage_timeline;
pub use types::{
    ChannelProgressSink, EngineEvent, FailureKind, JobId, ProgressSink, TimelineStage,
    TransferAction, TransferError, TransferGrant,
};
pub use upload::{upload_source, SourceFile};
