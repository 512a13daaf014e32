pub mod model;
pub mod openai_adapter;
pub mod rotation;
pub mod router;
pub mod types;

pub use model::{ModelSpec, DEFAULT_MODEL};
pub use openai_adapter::{OpenAIAdapter, OpenAIConfig, OPENAI_BASE_URL};
pub use rotation::Rotator;
pub use router::LLMRouter;
pub use types::{CompletionRequest, LLMResponse, Message, ProviderAdapter, ProviderError, ToolCall};
