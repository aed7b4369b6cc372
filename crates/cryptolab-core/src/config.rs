use serde::{Deserialize, Serialize};

use cryptolab_limiter::LimiterConfig;

use crate::error::LabError;

/// Largest image or envelope accepted, in bytes.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabConfig {
    pub limiter: LimiterConfig,
    pub max_payload_bytes: usize,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            limiter: LimiterConfig::default(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl LabConfig {
    pub fn from_json(json: &str) -> Result<Self, LabError> {
        serde_json::from_str(json).map_err(|e| LabError::InvalidParameter(format!("config: {e}")))
    }

    pub(crate) fn check_size(&self, len: usize) -> Result<(), LabError> {
        if len > self.max_payload_bytes {
            return Err(LabError::InvalidParameter(format!(
                "payload is {:.2} MiB, the limit is {:.0} MiB",
                len as f64 / 1_048_576.0,
                self.max_payload_bytes as f64 / 1_048_576.0
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        assert_eq!(LabConfig::from_json("{}").unwrap(), LabConfig::default());
    }

    #[test]
    fn nested_limiter_overrides() {
        let config =
            LabConfig::from_json(r#"{"limiter":{"maxAttempts":2},"maxPayloadBytes":1024}"#).unwrap();
        assert_eq!(config.limiter.max_attempts, 2);
        assert_eq!(config.limiter.window_ms, 86_400_000);
        assert_eq!(config.max_payload_bytes, 1024);
    }

    #[test]
    fn bad_json_is_invalid_parameter() {
        assert!(matches!(
            LabConfig::from_json("{"),
            Err(LabError::InvalidParameter(_))
        ));
    }

    #[test]
    fn size_cap() {
        let config = LabConfig {
            max_payload_bytes: 10,
            ..LabConfig::default()
        };
        config.check_size(10).unwrap();
        assert!(config.check_size(11).is_err());
    }
}
