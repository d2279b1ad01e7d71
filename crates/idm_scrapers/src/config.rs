use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("idm/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when probing a URL for PDF content fails at the network level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeFailurePolicy {
    /// Treat the URL as an HTML page; the HTML path then records the failure.
    #[default]
    FailOpen,
    /// Report a classification error to the caller.
    FailClosed,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub timeout: Duration,
    /// Directory that receives the per-call PDF scratch files.
    pub scratch_dir: PathBuf,
    pub probe_failures: ProbeFailurePolicy,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            scratch_dir: std::env::temp_dir(),
            probe_failures: ProbeFailurePolicy::default(),
        }
    }
}

impl ScraperConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir.into();
        self
    }

    pub fn with_probe_failures(mut self, policy: ProbeFailurePolicy) -> Self {
        self.probe_failures = policy;
        self
    }
}
