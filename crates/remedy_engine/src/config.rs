use std::time::Duration;

use crate::TimelineStage;

/// Signing service the deployed pipeline listens on.
pub const DEFAULT_SIGNING_ENDPOINT: &str =
    "https://kjgsdv2xja.execute-api.us-east-1.amazonaws.com/firmar-url";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub signing_endpoint: url::Url,
    pub http: HttpSettings,
    pub poll: PollSettings,
    pub timeline: TimelineSettings,
}

impl EngineConfig {
    pub fn with_endpoint(signing_endpoint: url::Url) -> Self {
        Self {
            signing_endpoint,
            http: HttpSettings::default(),
            poll: PollSettings::default(),
            timeline: TimelineSettings::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let endpoint =
            url::Url::parse(DEFAULT_SIGNING_ENDPOINT).expect("default signing endpoint");
        Self::with_endpoint(endpoint)
    }
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_download_bytes: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_download_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    /// Spacing between attempts; the first attempt fires one interval after start.
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 30,
        }
    }
}

impl PollSettings {
    /// Total wall-clock budget before the poller gives up.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Offsets (from the start of processing) at which decorative stages light up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineSettings {
    pub steps: Vec<(Duration, TimelineStage)>,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            steps: vec![
                (Duration::from_secs(2), TimelineStage::Analyst),
                (Duration::from_secs(5), TimelineStage::Strategist),
                (Duration::from_secs(8), TimelineStage::Generator),
            ],
        }
    }
}
