use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("no pdf payloads were provided")]
    EmptyBatch,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("{endpoint} returned {status}")]
    Status { endpoint: String, status: String },

    #[error("malformed response from {endpoint}: {details}")]
    MalformedResponse { endpoint: String, details: String },

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("no api key configured (set OPENAI_API_KEY)")]
    MissingApiKey,
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("embedding dimension {got} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no documents have been processed; the index has not been built")]
    IndexNotBuilt,

    #[error("no document text is available for this session")]
    NoDocument,

    #[error("chat provider failed: {0}")]
    Provider(#[from] ProviderError),
}

impl From<EmbeddingError> for GenerationError {
    fn from(value: EmbeddingError) -> Self {
        match value {
            EmbeddingError::Provider(error) => GenerationError::Provider(error),
            EmbeddingError::DimensionMismatch { expected, got } => {
                GenerationError::Provider(ProviderError::MalformedResponse {
                    endpoint: "embeddings".to_string(),
                    details: format!("dimension {got} does not match index dimension {expected}"),
                })
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("index build failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),
}
