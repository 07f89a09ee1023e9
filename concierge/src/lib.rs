//! Brand Concierge request pipeline.
//!
//! Question + knowledge document in, normalized three-field answer out:
//!
//! 1. validate the question, pick the knowledge document ([`knowledge`])
//! 2. build the persona/system and user prompts ([`prompt`])
//! 3. one structured-output call through [`ai_llm_service::GenerationClient`]
//! 4. parse and normalize the reply ([`response`])
//!
//! [`Concierge`] wires the steps together and owns the process-wide state:
//! the cached default knowledge document and the lazily built client.

pub mod config;
pub mod errors;
pub mod handler;
pub mod knowledge;
pub mod prompt;
pub mod response;

pub use config::ConciergeConfig;
pub use errors::ConciergeError;
pub use handler::Concierge;
pub use knowledge::{KnowledgeDocument, KnowledgeSource};
pub use response::{ConciergeResponse, NO_LINK, Status};
