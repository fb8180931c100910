//! Remedy core: pure job state machine and view-model helpers.
mod effect;
mod msg;
mod naming;
mod stage;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use naming::{derive_result_name, source_name_of, RESULT_EXTENSION, SOURCE_EXTENSION};
pub use stage::Stage;
pub use state::{AppState, Job, JobFailure, JobId, Phase};
pub use update::update;
pub use view_model::{AppViewModel, StageView};
