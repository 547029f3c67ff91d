pub mod service;

pub use service::{Caller, DocumentService};
