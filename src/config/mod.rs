#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{Cli, Command, DocumentArgs};
pub use toml_config::{
    GenerationSettings, LoggingConfig, MedscribeConfig, ProviderChoice, ProviderConfig,
};
