pub mod service;
pub mod types;
pub mod duolingo;

pub use duolingo::DuolingoClient;
pub use service::{MediaFetcher, VocabularyService};
pub use types::Language;
