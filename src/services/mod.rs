pub mod completion;
pub mod profile_store;
pub mod profile_update;
pub mod prompts;
pub mod providers;
pub mod recommender;

pub use completion::{CompletionService, LlmClient};
pub use profile_store::ProfileStore;
pub use profile_update::ProfileUpdater;
pub use providers::CatalogProvider;
pub use recommender::{RecommendationOutcome, Recommender, SearchSettings};
