pub mod fallback;
pub mod generator;
pub mod prompt;
pub mod rate_limit;
pub mod specialty;
pub mod template;

pub use crate::domain::model::{DocumentKind, GenerationMode, GenerationRequest, PatientInfo};
pub use crate::domain::ports::{ModelBackend, TextCompletionProvider};
pub use crate::utils::error::Result;
