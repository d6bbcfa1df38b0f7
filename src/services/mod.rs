pub mod class_service;
pub mod document_service;
pub mod friend_service;
pub mod jupiter_service;
pub mod member_service;
pub mod openai_service;
pub mod prompts;

pub use jupiter_service::JupiterClient;
pub use openai_service::OpenAiClient;
