use serde::{Deserialize, Serialize};

use crate::domain::identifiers::{SuffixRule, DEFAULT_CURRENT_SUFFIX, DEFAULT_LEGACY_SUFFIX};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub identifiers: IdentifierConfig,
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentifierConfig {
    pub legacy_suffix: String,
    pub current_suffix: String,
}

impl IdentifierConfig {
    pub fn suffix_rule(&self) -> SuffixRule {
        SuffixRule::new(&self.legacy_suffix, &self.current_suffix)
    }
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            legacy_suffix: DEFAULT_LEGACY_SUFFIX.to_owned(),
            current_suffix: DEFAULT_CURRENT_SUFFIX.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Handlers delivered inline; every other handler runs concurrently.
    pub synchronous_handlers: Vec<String>,
    /// How long the CLI waits for in-flight concurrent handlers on exit.
    pub shutdown_grace_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            synchronous_handlers: vec!["print".to_owned()],
            shutdown_grace_ms: 2_000,
        }
    }
}
