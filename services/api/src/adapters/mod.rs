pub mod anthropic_llm;
pub mod azure_llm;
pub mod db;

pub use anthropic_llm::AnthropicAdapter;
pub use azure_llm::AzureOpenAiAdapter;
pub use db::DbAdapter;
