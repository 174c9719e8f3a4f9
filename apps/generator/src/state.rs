use std::sync::Arc;

use crate::config::Config;
use crate::curriculum::lookup::LookupService;
use crate::generation::orchestrator::AssemblyOptions;
use crate::generation::service::GenerationService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Curriculum reads. Default: PgLookupService.
    pub lookup: Arc<dyn LookupService>,
    /// Model-backed generation. Default: LlmGenerationService.
    pub generator: Arc<dyn GenerationService>,
    pub assembly: AssemblyOptions,
    pub config: Config,
}
