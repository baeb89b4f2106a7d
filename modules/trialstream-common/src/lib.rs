pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ExtractorStrategy};
pub use error::TrialStreamError;
pub use types::*;
