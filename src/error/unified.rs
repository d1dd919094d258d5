//! Error classification and recovery.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Protocol,
    Schema,
    ToolExecution,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    CheckCredentials,
    CheckConfiguration,
    IncreaseTimeout,
    InspectTranscript,
    CheckToolImplementation,
    ContactSupport,
}

impl RecoverySuggestion {
    /// Short advice shown next to an error.
    pub fn hint(self) -> &'static str {
        match self {
            Self::RetryWithBackoff => "the service is busy or unreachable; try again later",
            Self::CheckCredentials => "check OPENAI_API_KEY",
            Self::CheckConfiguration => "check the config file and SLEUTH_* variables",
            Self::IncreaseTimeout => "raise request_timeout_secs",
            Self::InspectTranscript => "the model produced an unusable reply; rerun with RUST_LOG=sleuth=debug",
            Self::CheckToolImplementation => "a tool definition or its output is invalid",
            Self::ContactSupport => "rerun with RUST_LOG=sleuth=debug for details",
        }
    }
}
