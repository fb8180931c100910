use std::path::PathBuf;

use crate::{JobId, Phase, Stage};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub job_id: Option<JobId>,
    pub phase: Phase,
    pub source_name: Option<String>,
    pub result_name: Option<String>,
    pub stages: Vec<StageView>,
    pub poll_attempts: u32,
    pub payload: Option<String>,
    pub failure: Option<String>,
    pub advice: Option<String>,
    pub saved_path: Option<PathBuf>,
    pub save_error: Option<String>,
    pub start_enabled: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    pub stage: Stage,
    pub label: &'static str,
    pub reached: bool,
}
