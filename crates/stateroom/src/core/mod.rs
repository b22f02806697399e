//! Shared infrastructure: errors, logging, and the convention tokenizer

mod error;
pub mod logging;
pub mod syntax;

pub use error::*;
pub use logging::*;
