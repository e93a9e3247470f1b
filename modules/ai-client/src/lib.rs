pub mod error;
pub mod groq;
pub mod traits;
pub mod util;

pub use error::AiError;
pub use groq::Groq;
pub use traits::{ChatModel, Message, MessageRole};
pub use util::{json_object_window, truncate_to_char_boundary};
