use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc as async_mpsc;
use tokio_util::sync::CancellationToken;

use remedy_logging::{remedy_debug, remedy_error, remedy_info};

use crate::persist::save_result;
use crate::poll::poll_for_result;
use crate::timeline::run_stage_timeline;
use crate::upload::{upload_source, SourceFile};
use crate::{
    ChannelProgressSink, EngineConfig, EngineEvent, FailureKind, GrantIssuer, JobId, ObjectStore,
    ProgressSink, ReqwestGrantIssuer, ReqwestObjectStore, TransferError,
};

enum EngineCommand {
    Upload {
        job_id: JobId,
        source_path: PathBuf,
        source_name: String,
    },
    Poll {
        job_id: JobId,
        result_name: String,
    },
    Timeline {
        job_id: JobId,
    },
    Save {
        job_id: JobId,
        result_name: String,
        payload: String,
    },
    Cancel {
        job_id: JobId,
    },
}

/// Front door to the IO side.
///
/// All work runs on one current-thread tokio runtime owned by a background
/// thread; commands go in over a channel and `EngineEvent`s come back out.
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

struct Backends {
    issuer: Arc<dyn GrantIssuer>,
    store: Arc<dyn ObjectStore>,
    config: EngineConfig,
    output_dir: PathBuf,
}

impl EngineHandle {
    pub fn new(config: EngineConfig, output_dir: PathBuf) -> Result<Self, TransferError> {
        let issuer = ReqwestGrantIssuer::new(config.signing_endpoint.clone(), &config.http)?;
        let store = ReqwestObjectStore::new(&config.http)?;
        Ok(Self::with_backends(
            Arc::new(issuer),
            Arc::new(store),
            config,
            output_dir,
        ))
    }

    pub fn with_backends(
        issuer: Arc<dyn GrantIssuer>,
        store: Arc<dyn ObjectStore>,
        config: EngineConfig,
        output_dir: PathBuf,
    ) -> Self {
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let backends = Arc::new(Backends {
            issuer,
            store,
            config,
            output_dir,
        });

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    remedy_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let sink = ChannelProgressSink::new(event_tx);
            runtime.block_on(run_commands(cmd_rx, backends, sink));
        });

        Self { cmd_tx, event_rx }
    }

    pub fn upload(&self, job_id: JobId, source_path: PathBuf, source_name: impl Into<String>) {
        self.send(EngineCommand::Upload {
            job_id,
            source_path,
            source_name: source_name.into(),
        });
    }

    pub fn poll(&self, job_id: JobId, result_name: impl Into<String>) {
        self.send(EngineCommand::Poll {
            job_id,
            result_name: result_name.into(),
        });
    }

    pub fn start_timeline(&self, job_id: JobId) {
        self.send(EngineCommand::Timeline { job_id });
    }

    pub fn save(&self, job_id: JobId, result_name: impl Into<String>, payload: String) {
        self.send(EngineCommand::Save {
            job_id,
            result_name: result_name.into(),
            payload,
        });
    }

    pub fn cancel(&self, job_id: JobId) {
        self.send(EngineCommand::Cancel { job_id });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            remedy_error!("Engine runtime is gone; command dropped");
        }
    }
}

/// Per-job cancellation tokens. Only one job is live at a time: handing out a
/// token for a new job cancels every other one.
#[derive(Default)]
struct JobTokens {
    tokens: HashMap<JobId, CancellationToken>,
}

impl JobTokens {
    fn token_for(&mut self, job_id: JobId) -> CancellationToken {
        self.tokens.retain(|&id, token| {
            if id == job_id {
                return !token.is_cancelled();
            }
            if !token.is_cancelled() {
                remedy_info!("Job {} superseded by job {}", id, job_id);
                token.cancel();
            }
            false
        });
        self.tokens.entry(job_id).or_default().clone()
    }

    fn cancel(&mut self, job_id: JobId) {
        if let Some(token) = self.tokens.remove(&job_id) {
            remedy_info!("Cancelling job {}", job_id);
            token.cancel();
        }
    }
}

async fn run_commands(
    mut cmd_rx: async_mpsc::UnboundedReceiver<EngineCommand>,
    backends: Arc<Backends>,
    sink: ChannelProgressSink,
) {
    let mut jobs = JobTokens::default();

    while let Some(command) = cmd_rx.recv().await {
        match command {
            EngineCommand::Cancel { job_id } => jobs.cancel(job_id),
            EngineCommand::Upload {
                job_id,
                source_path,
                source_name,
            } => {
                let token = jobs.token_for(job_id);
                let backends = backends.clone();
                let sink = sink.clone();
                tokio::spawn(async move {
                    let result = tokio::select! {
                        biased;
                        _ = token.cancelled() => return,
                        result = upload_job(&backends, &source_path, source_name) => result,
                    };
                    sink.emit(EngineEvent::UploadCompleted { job_id, result });
                });
            }
            EngineCommand::Poll {
                job_id,
                result_name,
            } => {
                let token = jobs.token_for(job_id);
                let backends = backends.clone();
                let sink = sink.clone();
                tokio::spawn(async move {
                    let outcome = poll_for_result(
                        job_id,
                        &result_name,
                        backends.issuer.as_ref(),
                        backends.store.as_ref(),
                        &backends.config.poll,
                        &token,
                        &sink,
                    )
                    .await;
                    // The job is over either way; stop its timeline too.
                    token.cancel();
                    match outcome {
                        Ok(payload) => sink.emit(EngineEvent::ResultFetched { job_id, payload }),
                        Err(err) if err.kind == FailureKind::Cancelled => {}
                        Err(error) => sink.emit(EngineEvent::PollFailed { job_id, error }),
                    }
                });
            }
            EngineCommand::Timeline { job_id } => {
                let token = jobs.token_for(job_id);
                let backends = backends.clone();
                let sink = sink.clone();
                tokio::spawn(async move {
                    run_stage_timeline(job_id, &backends.config.timeline, &token, &sink).await;
                });
            }
            EngineCommand::Save {
                job_id,
                result_name,
                payload,
            } => {
                let result = save_result(&backends.output_dir, &result_name, &payload)
                    .map_err(|err| err.to_string());
                match &result {
                    Ok(path) => remedy_info!("Saved {} to {:?}", result_name, path),
                    Err(err) => remedy_error!("Failed to save {}: {}", result_name, err),
                }
                sink.emit(EngineEvent::ResultSaved { job_id, result });
            }
        }
    }

    remedy_debug!("Engine command channel closed");
}

async fn upload_job(
    backends: &Backends,
    source_path: &std::path::Path,
    source_name: String,
) -> Result<(), TransferError> {
    let source = SourceFile::load(source_path, source_name)?;
    upload_source(backends.issuer.as_ref(), backends.store.as_ref(), &source).await
}
