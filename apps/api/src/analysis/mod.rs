// Résumé analysis: prompt relay, tolerant JSON extraction, result normalisation.
// All model calls go through llm_client; nothing here talks to the API directly.

pub mod analyzer;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod pdf;
pub mod prompts;
