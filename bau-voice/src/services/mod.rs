//! Voice pipeline services
//!
//! classifier → entity_resolver → materializer, wired per mode by `pipeline`.

pub mod classifier;
pub mod entity_resolver;
pub mod materializer;
pub mod nlu_client;
pub mod pipeline;

pub use classifier::{Classifier, CommandSchema};
pub use entity_resolver::EntityResolver;
pub use materializer::Materializer;
pub use nlu_client::{
    api_key_handle, ApiKeyHandle, CompletionClient, NluError, OpenAiClient, Prompt,
};
pub use pipeline::VoicePipeline;
