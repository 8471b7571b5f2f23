use std::sync::Arc;

use crate::services::Recommender;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
}

impl AppState {
    pub fn new(recommender: Arc<Recommender>) -> Self {
        Self { recommender }
    }
}
