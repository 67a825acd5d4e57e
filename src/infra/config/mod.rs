mod app_config;
mod file_config;
mod loader;

pub use app_config::{AppConfig, DispatchConfig, IdentifierConfig, LogConfig};
pub use loader::load;
