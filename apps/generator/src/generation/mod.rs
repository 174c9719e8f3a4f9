// Content generation: model-facing prompts and service, the assembly
// pipeline that turns a plan into a bundle, and its HTTP handlers.
// All model calls go through llm_client.

pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod service;
