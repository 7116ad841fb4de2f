//! Engine configuration, loaded from TOML.
//!
//! Every section is optional; anything left out falls back to the defaults
//! of the subsystem it configures.
//!
//! ```toml
//! genre = "mystery"
//!
//! [threads]
//! revelation_threshold = 65
//!
//! [orchestrator.cooldowns]
//! reveal_thread = 6
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::breath::BreathConfig;
use crate::crosstalk::CrossTalkConfig;
use crate::emergence::EmergenceConfig;
use crate::emotion::EmotionConfig;
use crate::error::Result;
use crate::evolution::EvolutionConfig;
use crate::memory::MemoryConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::tension::{Genre, TensionConfig};
use crate::threads::ThreadConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Genre used for new sessions and for trackers rebuilt on restore.
    pub genre: Genre,
    pub tension: TensionConfig,
    pub emotion: EmotionConfig,
    pub memory: MemoryConfig,
    pub threads: ThreadConfig,
    pub emergence: EmergenceConfig,
    pub evolution: EvolutionConfig,
    pub breath: BreathConfig,
    pub cross_talk: CrossTalkConfig,
    pub orchestrator: OrchestratorConfig,
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PacingError;

    #[test]
    fn test_empty_config_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.emergence.min_priority, 20);
        assert_eq!(config.memory.max_per_character, 100);
    }

    #[test]
    fn test_partial_sections() {
        let config = EngineConfig::from_toml_str(
            r#"
genre = "slice-of-life"

[threads]
revelation_threshold = 65

[orchestrator.cooldowns]
reveal_thread = 6
"#,
        )
        .unwrap();

        assert_eq!(config.genre, Genre::SliceOfLife);
        assert_eq!(config.threads.revelation_threshold, 65);
        assert_eq!(config.threads.building_threshold, ThreadConfig::default().building_threshold);
        assert_eq!(config.orchestrator.cooldowns.reveal_thread, 6);
        assert_eq!(config.orchestrator.cooldowns.take_breath, 3);
        assert_eq!(config.orchestrator.critical_debt, 70);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = EngineConfig::from_toml_str("genre = 12").unwrap_err();
        assert!(matches!(err, PacingError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineConfig::load("/definitely/not/here/pacing.toml").unwrap_err();
        assert!(matches!(err, PacingError::Io(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = EngineConfig::default();
        config.breath.max_exchanges = 9;
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
