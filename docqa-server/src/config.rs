//! Environment-driven configuration.
//!
//! Every setting is read once at startup. Required credentials that are
//! missing or empty, and optional values that fail to parse, are fatal.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `OPENAI_API_KEY` | *(required)* |
//! | `PINECONE_API_KEY` | *(required)* |
//! | `PINECONE_ENVIRONMENT` | *(required)* |
//! | `DOCQA_HOST` | `127.0.0.1` |
//! | `DOCQA_PORT` | `7071` |
//! | `DOCQA_FUNCTION_KEY` | *(none, auth disabled)* |
//! | `DOCQA_MAX_BODY_BYTES` | `10485760` |
//! | `PINECONE_INDEX` | `langchain` |
//! | `PINECONE_NAMESPACE` | *(default namespace)* |
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
//! | `OPENAI_EMBEDDING_MODEL` | `text-embedding-ada-002` |
//! | `OPENAI_EMBEDDING_DIMENSIONS` | *(model default, 1536)* |
//! | `OPENAI_CHAT_MODEL` | `gpt-4` |
//! | `DOCQA_CHUNK_SIZE` | `1000` |
//! | `DOCQA_CHUNK_OVERLAP` | `200` |
//! | `DOCQA_TOP_K` | `3` |
//! | `DOCQA_SIMILARITY_THRESHOLD` | `0.7` |
//! | `DOCQA_LOG_FORMAT` | `text` (or `json`) |

use std::fmt;
use std::str::FromStr;

use docqa_rag::RagConfig;
use docqa_rag::openai::{DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, OPENAI_API_BASE};
use docqa_rag::pinecone::DEFAULT_INDEX_NAME;
use thiserror::Error;

/// Default request body limit (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("invalid pipeline configuration: {0}")]
    Pipeline(String),
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret required on `/api/*` routes when set.
    pub function_key: Option<String>,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7071,
            function_key: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Output format of the log subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

#[derive(Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub embedding_dimensions: Option<usize>,
    pub chat_model: String,
}

impl fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dimensions", &self.embedding_dimensions)
            .field("chat_model", &self.chat_model)
            .finish()
    }
}

#[derive(Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    /// Serverless region used when the index has to be created.
    pub environment: String,
    pub index: String,
    pub namespace: Option<String>,
}

impl fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("api_key", &"<redacted>")
            .field("environment", &self.environment)
            .field("index", &self.index)
            .field("namespace", &self.namespace)
            .finish()
    }
}

/// Complete service configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub openai: OpenAIConfig,
    pub pinecone: PineconeConfig,
    pub rag: RagConfig,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = ServerConfig::default();
        let rag_defaults = RagConfig::default();

        let server = ServerConfig {
            host: env.optional("DOCQA_HOST").unwrap_or(defaults.host),
            port: env.parsed("DOCQA_PORT", defaults.port)?,
            function_key: env.optional("DOCQA_FUNCTION_KEY"),
            max_body_bytes: env.parsed("DOCQA_MAX_BODY_BYTES", defaults.max_body_bytes)?,
        };

        let openai = OpenAIConfig {
            api_key: env.required("OPENAI_API_KEY")?,
            base_url: env.optional("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            embedding_model: env
                .optional("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimensions: env.parsed_optional("OPENAI_EMBEDDING_DIMENSIONS")?,
            chat_model: env
                .optional("OPENAI_CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
        };

        let pinecone = PineconeConfig {
            api_key: env.required("PINECONE_API_KEY")?,
            environment: env.required("PINECONE_ENVIRONMENT")?,
            index: env.optional("PINECONE_INDEX").unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
            namespace: env.optional("PINECONE_NAMESPACE"),
        };

        let rag = RagConfig::builder()
            .chunk_size(env.parsed("DOCQA_CHUNK_SIZE", rag_defaults.chunk_size)?)
            .chunk_overlap(env.parsed("DOCQA_CHUNK_OVERLAP", rag_defaults.chunk_overlap)?)
            .top_k(env.parsed("DOCQA_TOP_K", rag_defaults.top_k)?)
            .similarity_threshold(
                env.parsed("DOCQA_SIMILARITY_THRESHOLD", rag_defaults.similarity_threshold)?,
            )
            .build()
            .map_err(|e| ConfigError::Pipeline(e.to_string()))?;

        let log_format = env.parsed("DOCQA_LOG_FORMAT", LogFormat::default())?;

        Ok(Self { server, openai, pinecone, rag, log_format })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// A set, non-blank value.
    fn optional(&self, var: &str) -> Option<String> {
        (self.0)(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn required(&self, var: &'static str) -> Result<String, ConfigError> {
        self.optional(var).ok_or(ConfigError::Missing(var))
    }

    fn parsed_optional<T: FromStr>(&self, var: &'static str) -> Result<Option<T>, ConfigError> {
        self.optional(var)
            .map(|value| value.parse().map_err(|_| ConfigError::Invalid { var, value }))
            .transpose()
    }

    fn parsed<T: FromStr>(&self, var: &'static str, default: T) -> Result<T, ConfigError> {
        Ok(self.parsed_optional(var)?.unwrap_or(default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |var| vars.get(var).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("OPENAI_API_KEY", "sk-test"),
        ("PINECONE_API_KEY", "pc-test"),
        ("PINECONE_ENVIRONMENT", "us-east-1"),
    ];

    fn with_required(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        REQUIRED.iter().copied().chain(extra.iter().copied()).collect()
    }

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7071);
        assert_eq!(config.server.function_key, None);
        assert_eq!(config.server.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.openai.embedding_model, "text-embedding-ada-002");
        assert_eq!(config.openai.embedding_dimensions, None);
        assert_eq!(config.openai.chat_model, "gpt-4");
        assert_eq!(config.pinecone.index, "langchain");
        assert_eq!(config.pinecone.namespace, None);
        assert_eq!(config.rag, RagConfig::default());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn missing_credentials_are_reported_by_name() {
        let err = AppConfig::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("PINECONE_ENVIRONMENT"));
        assert!(err.to_string().contains("PINECONE_ENVIRONMENT"));

        let blank = [("OPENAI_API_KEY", "  "), REQUIRED[1], REQUIRED[2]];
        let err = AppConfig::from_lookup(lookup(&blank)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENAI_API_KEY"));
    }

    #[test]
    fn overrides_are_parsed() {
        let vars = with_required(&[
            ("DOCQA_PORT", "8080"),
            ("DOCQA_FUNCTION_KEY", "secret"),
            ("PINECONE_NAMESPACE", "docs"),
            ("OPENAI_EMBEDDING_DIMENSIONS", "256"),
            ("DOCQA_TOP_K", "5"),
            ("DOCQA_SIMILARITY_THRESHOLD", "0.5"),
            ("DOCQA_LOG_FORMAT", "JSON"),
        ]);
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.function_key.as_deref(), Some("secret"));
        assert_eq!(config.pinecone.namespace.as_deref(), Some("docs"));
        assert_eq!(config.openai.embedding_dimensions, Some(256));
        assert_eq!(config.rag.top_k, 5);
        assert_eq!(config.rag.similarity_threshold, 0.5);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn unparseable_values_are_fatal() {
        let vars = with_required(&[("DOCQA_PORT", "seventy")]);
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { var: "DOCQA_PORT", value: "seventy".into() });

        let vars = with_required(&[("DOCQA_LOG_FORMAT", "xml")]);
        assert!(matches!(
            AppConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { var: "DOCQA_LOG_FORMAT", .. })
        ));
    }

    #[test]
    fn inconsistent_chunking_is_rejected() {
        let vars = with_required(&[("DOCQA_CHUNK_SIZE", "100"), ("DOCQA_CHUNK_OVERLAP", "100")]);
        assert!(matches!(AppConfig::from_lookup(lookup(&vars)), Err(ConfigError::Pipeline(_))));
    }

    #[test]
    fn debug_output_hides_credentials() {
        let config = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-test"));
        assert!(!rendered.contains("pc-test"));
    }
}
