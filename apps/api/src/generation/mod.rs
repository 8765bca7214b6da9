// Cover Letter Generation
// Implements: context extraction, prompt construction, token budget gate, model fallback chain.
// All provider calls go through llm_client — no direct HTTP calls here.

pub mod budget;
pub mod context;
pub mod fallback;
pub mod generator;
pub mod handlers;
pub mod prompts;

#[cfg(test)]
pub mod test_support;
