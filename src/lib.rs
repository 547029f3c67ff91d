pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::Cli;

pub use adapters::build_provider;
pub use app::{Caller, DocumentService};
pub use config::MedscribeConfig;
pub use core::generator::{DocumentGenerator, GenerateOptions};
pub use core::rate_limit::{RateLimitStore, RateLimiter};
pub use domain::model::{
    CustomTemplate, DocumentKind, GenerationMode, GenerationRequest, PatientInfo, PromptPair,
    UserRole,
};
pub use domain::ports::TextCompletionProvider;
pub use utils::error::{Result, ScribeError};
