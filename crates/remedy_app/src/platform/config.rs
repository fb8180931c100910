//! Optional RON configuration layered over the engine defaults.
//!
//! Every field is optional; anything left out keeps its built-in value.
//!
//! ```ron
//! (
//!     signing_endpoint: Some("https://example.com/firmar-url"),
//!     poll_interval_ms: Some(3000),
//!     max_poll_attempts: Some(30),
//! )
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use remedy_engine::{EngineConfig, TimelineSettings, TimelineStage};
use remedy_logging::remedy_info;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    signing_endpoint: Option<String>,
    poll_interval_ms: Option<u64>,
    max_poll_attempts: Option<u32>,
    connect_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    max_download_bytes: Option<u64>,
    /// Offsets for the analyst, strategist and generator stages.
    stage_offsets_ms: Option<[u64; 3]>,
}

pub fn load(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = parse(&text).with_context(|| format!("invalid config {}", path.display()))?;
    remedy_info!("Loaded configuration from {:?}", path);
    Ok(config)
}

fn parse(text: &str) -> anyhow::Result<EngineConfig> {
    let file: FileConfig = ron::from_str(text)?;
    apply(file, EngineConfig::default())
}

fn apply(file: FileConfig, mut config: EngineConfig) -> anyhow::Result<EngineConfig> {
    if let Some(endpoint) = file.signing_endpoint {
        config.signing_endpoint = url::Url::parse(&endpoint)
            .with_context(|| format!("signing_endpoint {endpoint:?}"))?;
    }
    if let Some(ms) = file.poll_interval_ms {
        if ms == 0 {
            bail!("poll_interval_ms must be positive");
        }
        config.poll.interval = Duration::from_millis(ms);
    }
    if let Some(attempts) = file.max_poll_attempts {
        if attempts == 0 {
            bail!("max_poll_attempts must be positive");
        }
        config.poll.max_attempts = attempts;
    }
    if let Some(ms) = file.connect_timeout_ms {
        config.http.connect_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = file.request_timeout_ms {
        config.http.request_timeout = Duration::from_millis(ms);
    }
    if let Some(bytes) = file.max_download_bytes {
        config.http.max_download_bytes = bytes;
    }
    if let Some([analyst, strategist, generator]) = file.stage_offsets_ms {
        if !(analyst <= strategist && strategist <= generator) {
            bail!("stage_offsets_ms must be non-decreasing");
        }
        config.timeline = TimelineSettings {
            steps: vec![
                (Duration::from_millis(analyst), TimelineStage::Analyst),
                (Duration::from_millis(strategist), TimelineStage::Strategist),
                (Duration::from_millis(generator), TimelineStage::Generator),
            ],
        };
    }
    Ok(config)
}
