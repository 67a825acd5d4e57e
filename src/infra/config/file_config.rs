use serde::Deserialize;

use crate::infra::config::{AppConfig, DispatchConfig, IdentifierConfig, LogConfig};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub identifiers: Option<FileIdentifierConfig>,
    pub dispatch: Option<FileDispatchConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(identifiers) = self.identifiers {
            identifiers.merge_into(&mut config.identifiers);
        }

        if let Some(dispatch) = self.dispatch {
            dispatch.merge_into(&mut config.dispatch);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileIdentifierConfig {
    pub legacy_suffix: Option<String>,
    pub current_suffix: Option<String>,
}

impl FileIdentifierConfig {
    fn merge_into(self, config: &mut IdentifierConfig) {
        if let Some(legacy_suffix) = self.legacy_suffix {
            config.legacy_suffix = legacy_suffix;
        }

        if let Some(current_suffix) = self.current_suffix {
            config.current_suffix = current_suffix;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileDispatchConfig {
    pub synchronous_handlers: Option<Vec<String>>,
    pub shutdown_grace_ms: Option<u64>,
}

impl FileDispatchConfig {
    fn merge_into(self, config: &mut DispatchConfig) {
        if let Some(handlers) = self.synchronous_handlers {
            config.synchronous_handlers = handlers;
        }

        if let Some(grace_ms) = self.shutdown_grace_ms {
            config.shutdown_grace_ms = grace_ms;
        }
    }
}
