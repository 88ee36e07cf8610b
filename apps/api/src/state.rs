use crate::analysis::analyzer::Analyzer;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Built once at startup around the single model client.
    pub analyzer: Analyzer,
    pub config: Config,
}
