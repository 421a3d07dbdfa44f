use crate::catalog::CatalogStore;
use crate::generation::{AzureChatClient, AzureSettings, TextGenerator, UnavailableGenerator};
use crate::mcp::contracts::{
    DEFAULT_AZURE_API_VERSION, DEFAULT_DATA_DIR, DEFAULT_GENERATION_TIMEOUT_SECS,
    DEFAULT_MAX_SAMPLE_CHARS,
};
use crate::tools::ToolRegistry;
use crate::tools::prompt::PromptBuilder;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Args, Clone, Debug)]
pub struct GenerationArgs {
    /// Azure OpenAI resource endpoint
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    pub azure_endpoint: Option<String>,
    /// Azure OpenAI API key
    #[arg(long, env = "AZURE_OPENAI_API_KEY", hide_env_values = true)]
    pub azure_api_key: Option<String>,
    /// Chat deployment name
    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT")]
    pub azure_deployment: Option<String>,
    /// Azure OpenAI API version
    #[arg(long, env = "AZURE_OPENAI_API_VERSION", default_value = DEFAULT_AZURE_API_VERSION)]
    pub azure_api_version: String,
    /// Timeout for one generation call, in seconds
    #[arg(
        long,
        env = "DESIGN_REPO_GENERATION_TIMEOUT_SECS",
        default_value_t = DEFAULT_GENERATION_TIMEOUT_SECS
    )]
    pub generation_timeout_secs: u64,
}

impl GenerationArgs {
    pub fn settings(&self) -> AzureSettings {
        AzureSettings {
            endpoint: self.azure_endpoint.clone(),
            api_key: self.azure_api_key.clone(),
            deployment: self.azure_deployment.clone(),
            api_version: self.azure_api_version.clone(),
            timeout: Duration::from_secs(self.generation_timeout_secs),
        }
    }

    /// Falls back to a generator that always fails when settings are incomplete.
    pub fn generator(&self) -> Arc<dyn TextGenerator> {
        match AzureChatClient::new(&self.settings()) {
            Ok(client) => Arc::new(client),
            Err(err) => {
                warn!(error = %err, "text generation unavailable; tools will return error envelopes");
                Arc::new(UnavailableGenerator::new(err.to_string()))
            }
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct ToolArgs {
    /// Directory holding the per-category catalog files
    #[arg(long, env = "DESIGN_REPO_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,
    /// Upper bound on catalog characters embedded in one prompt
    #[arg(
        long,
        env = "DESIGN_REPO_MAX_SAMPLE_CHARS",
        default_value_t = DEFAULT_MAX_SAMPLE_CHARS
    )]
    pub max_sample_chars: usize,
    #[command(flatten)]
    pub generation: GenerationArgs,
}

impl ToolArgs {
    pub fn registry(&self) -> ToolRegistry {
        ToolRegistry::new(
            CatalogStore::new(&self.data_dir),
            PromptBuilder::new(self.max_sample_chars),
            self.generation.generator(),
        )
    }
}
