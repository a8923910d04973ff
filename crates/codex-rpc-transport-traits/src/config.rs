//! Transport configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Size limits for framed messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum size of one inbound line in bytes.
    /// `None` = unlimited
    pub max_inbound_size: Option<usize>,

    /// Maximum size of one outbound message in bytes.
    /// `None` = unlimited
    pub max_outbound_size: Option<usize>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_inbound_size: Some(32 * 1024 * 1024), // 32MB, turn diffs can be large
            max_outbound_size: Some(8 * 1024 * 1024),  // 8MB
        }
    }
}

impl LimitsConfig {
    /// Create a configuration with no limits.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_inbound_size: None,
            max_outbound_size: None,
        }
    }

    /// Create a configuration with strict limits for untrusted peers.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            max_inbound_size: Some(1024 * 1024), // 1MB
            max_outbound_size: Some(256 * 1024), // 256KB
        }
    }
}

/// Configuration for request and write timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Single request round trip, enforced by the client.
    /// `None` = no timeout
    pub request: Option<Duration>,

    /// One framed write to the peer, enforced by the transport.
    /// `None` = no timeout
    pub write: Option<Duration>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Some(Duration::from_secs(60)),
            write: Some(Duration::from_secs(30)),
        }
    }
}

impl TimeoutConfig {
    /// Create a configuration with short timeouts for fast operations.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            request: Some(Duration::from_secs(10)),
            write: Some(Duration::from_secs(5)),
        }
    }

    /// Create a configuration with no timeouts.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            request: None,
            write: None,
        }
    }

    /// Create a configuration with long timeouts for slow operations.
    #[must_use]
    pub const fn patient() -> Self {
        Self {
            request: Some(Duration::from_secs(300)), // 5 minutes
            write: Some(Duration::from_secs(120)),   // 2 minutes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_config_default() {
        let config = LimitsConfig::default();
        assert_eq!(config.max_inbound_size, Some(32 * 1024 * 1024));
        assert_eq!(config.max_outbound_size, Some(8 * 1024 * 1024));
    }

    #[test]
    fn test_timeout_config_default() {
        let config = TimeoutConfig::default();
        assert_eq!(config.request, Some(Duration::from_secs(60)));
        assert_eq!(config.write, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_timeout_presets_order() {
        let fast = TimeoutConfig::fast();
        let patient = TimeoutConfig::patient();
        assert!(fast.request < patient.request);
        assert_eq!(TimeoutConfig::unlimited().request, None);
    }
}
