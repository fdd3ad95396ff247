pub mod chunking;
pub mod error;
pub mod extractor;
pub mod index;
pub mod ingest;
pub mod models;
pub mod providers;
pub mod session;

pub use chunking::{split_text, ChunkingConfig};
pub use error::{
    EmbeddingError, ExtractionError, GenerationError, ProcessError, ProviderError,
};
pub use extractor::{extract_document, LopdfExtractor, PageText, PdfExtractor};
pub use index::{cosine_similarity, EmbeddingIndex, RetrievedChunk};
pub use ingest::{discover_pdf_files, read_pdf_payloads};
pub use models::{ChatMessage, ConversationTurn, Role, SessionOptions};
pub use providers::{ChatProvider, EmbeddingProvider, OpenAiClient, OpenAiConfig};
pub use session::ChatSession;
