//! Kernel configuration.

use serde::{Deserialize, Serialize};
use tableforge_turn::LoopConfig;

use crate::TableforgeError;

/// Startup policy and game loop limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Refuse to boot if plugin or mode registration produced any warning.
    pub strict_registration: bool,
    /// Limits applied to every game started by a room.
    pub game_loop: LoopConfig,
}

impl KernelConfig {
    /// Parses a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TableforgeError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_partial() {
        let cfg = KernelConfig::from_json(r#"{"strict_registration": true, "game_loop": {"max_turns": 7}}"#).unwrap();
        assert!(cfg.strict_registration);
        assert_eq!(cfg.game_loop.max_turns, 7);
        assert_eq!(cfg.game_loop.max_phases_per_turn, 100);
    }

    #[test]
    fn test_from_json_empty_object_is_default() {
        assert_eq!(KernelConfig::from_json("{}").unwrap(), KernelConfig::default());
    }

    #[test]
    fn test_from_json_malformed_fails() {
        let err = KernelConfig::from_json("{").unwrap_err();
        assert!(matches!(err, TableforgeError::Config(_)));
    }
}
