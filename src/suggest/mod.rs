pub mod prompt;
pub mod providers;
pub mod types;

pub use providers::{GeminiSuggester, HttpSuggester, MoveSuggester, RandomSuggester, create_suggester};
pub use types::{SuggestError, SuggestRequest};
