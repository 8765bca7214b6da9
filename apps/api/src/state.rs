use std::sync::Arc;

use crate::generation::generator::CoverLetterGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Stateless between requests; shared behind an `Arc` only to avoid rebuilding it.
    pub generator: Arc<CoverLetterGenerator>,
}
