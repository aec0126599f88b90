pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod model;
pub mod protocol;
pub mod services;

pub use error::CoreError;
pub use events::{CoreEvent, EventSink};
pub use model::credential::Credential;
pub use model::entry::{VocabKind, VocabularyEntry};
pub use model::filter::{GenerationFilter, KindSelection, Scope};
pub use model::run::{BatchCount, CollectionRun, RunEvent};
pub use services::session::Session;
