use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub chat: ChatConfig,
    pub search_index: SearchIndexConfig,
    #[serde(default)]
    pub blob: BlobConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_max_tokens() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Nearest neighbours requested from the search service.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Results rendered into the analysis context. Independent of `top_k`
    /// on purpose: retrieving more than is rendered is valid.
    #[serde(default = "default_max_rendered")]
    pub max_rendered: usize,
    /// Character budget per rendered chunk excerpt.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_rendered: default_max_rendered(),
            snippet_chars: default_snippet_chars(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_max_rendered() -> usize {
    2
}
fn default_snippet_chars() -> usize {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// Base URL of the embeddings endpoint.
    pub endpoint: String,
    /// Model name (e.g. `text-embedding-3-small`).
    pub model: String,
    /// Expected vector dimensionality; vectors of any other length are
    /// rejected before upsert.
    pub dims: usize,
    /// Environment variable holding the API key.
    #[serde(default = "default_embedding_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Concurrent embedding calls during ingestion fan-out.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_embedding_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_concurrency() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Base URL of the chat-completions endpoint.
    pub endpoint: String,
    /// Model name (e.g. `gpt-4o-mini`).
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_embedding_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f64 {
    0.3
}
fn default_max_output_tokens() -> u32 {
    2000
}
fn default_chat_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchIndexConfig {
    /// Base URL of the search service.
    pub endpoint: String,
    /// Index name within the service.
    pub index_name: String,
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_search_key_env() -> String {
    "SEARCH_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct BlobConfig {
    #[serde(default = "default_container")]
    pub container: String,
    /// Local root for the filesystem-backed store.
    #[serde(default = "default_data_dir")]
    pub data_dir: std::path::PathBuf,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            container: default_container(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_container() -> String {
    "project-documents".to_string()
}

fn default_data_dir() -> std::path::PathBuf {
    std::path::PathBuf::from("./data")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.chunking.max_tokens == 0 {
        anyhow::bail!("chunking.max_tokens must be > 0");
    }

    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if config.retrieval.snippet_chars == 0 {
        anyhow::bail!("retrieval.snippet_chars must be > 0");
    }

    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }

    if config.embedding.concurrency == 0 {
        anyhow::bail!("embedding.concurrency must be >= 1");
    }

    if !(0.0..=2.0).contains(&config.chat.temperature) {
        anyhow::bail!("chat.temperature must be in [0.0, 2.0]");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    const VALID: &str = r#"
[chunking]
max_tokens = 800

[embedding]
endpoint = "https://api.example.com/v1/embeddings"
model = "text-embedding-3-small"
dims = 1536

[chat]
endpoint = "https://api.example.com/v1/chat/completions"
model = "gpt-4o-mini"

[search_index]
endpoint = "https://search.example.com"
index_name = "projects"
"#;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let f = write_config(VALID);
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.chunking.max_tokens, 800);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.max_rendered, 2);
        assert_eq!(config.retrieval.snippet_chars, 500);
        assert_eq!(config.embedding.concurrency, 4);
        assert!((config.chat.temperature - 0.3).abs() < 1e-9);
        assert_eq!(config.chat.max_output_tokens, 2000);
        assert_eq!(config.blob.container, "project-documents");
    }

    #[test]
    fn rejects_zero_max_tokens() {
        let f = write_config(&VALID.replace("max_tokens = 800", "max_tokens = 0"));
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn rejects_zero_dims() {
        let f = write_config(&VALID.replace("dims = 1536", "dims = 0"));
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn top_k_and_max_rendered_are_independent() {
        let body = format!("{VALID}\n[retrieval]\ntop_k = 10\nmax_rendered = 3\n");
        let f = write_config(&body);
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.retrieval.top_k, 10);
        assert_eq!(config.retrieval.max_rendered, 3);
    }
}
