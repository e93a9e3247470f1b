pub mod config;
pub mod error;
pub mod pacing;
pub mod text;
pub mod types;

pub use config::Config;
pub use error::FactGraphError;
pub use pacing::{Sleeper, TokioSleeper};
pub use text::*;
pub use types::*;
