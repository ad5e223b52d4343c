// options.rs — Action server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The protocol default: terminal goals are kept available for result
/// requests for fifteen minutes before the expiry sweep may reap them.
pub const DEFAULT_RESULT_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Configuration for one action server instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionServerOptions {
    /// The advertised action name. Non-empty; used for registration and
    /// log context only — the engine never parses it.
    pub action_name: String,

    /// How long a terminal goal stays in the registry before the expiry
    /// sweep removes it.
    #[serde(default = "default_result_timeout")]
    pub result_timeout: Duration,
}

fn default_result_timeout() -> Duration {
    DEFAULT_RESULT_TIMEOUT
}

impl ActionServerOptions {
    /// Options with the default result timeout.
    pub fn new(action_name: impl Into<String>) -> Self {
        Self {
            action_name: action_name.into(),
            result_timeout: DEFAULT_RESULT_TIMEOUT,
        }
    }

    pub fn with_result_timeout(mut self, result_timeout: Duration) -> Self {
        self.result_timeout = result_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_fifteen_minutes() {
        let options = ActionServerOptions::new("fibonacci");
        assert_eq!(options.result_timeout, Duration::from_secs(900));
    }

    #[test]
    fn builder_overrides_timeout() {
        let options =
            ActionServerOptions::new("fibonacci").with_result_timeout(Duration::from_secs(1));
        assert_eq!(options.result_timeout, Duration::from_secs(1));
    }

    #[test]
    fn missing_timeout_deserializes_to_default() {
        let options: ActionServerOptions =
            serde_json::from_str(r#"{"action_name": "fibonacci"}"#).unwrap();
        assert_eq!(options.result_timeout, DEFAULT_RESULT_TIMEOUT);
    }
}
