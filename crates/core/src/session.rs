use crate::chunking::{split_text, ChunkingConfig};
use crate::error::{GenerationError, ProcessError};
use crate::extractor::extract_document;
use crate::index::{EmbeddingIndex, RetrievedChunk};
use crate::models::{ChatMessage, ConversationTurn, SessionOptions};
use crate::providers::{ChatProvider, EmbeddingProvider};
use chrono::Utc;

const GROUNDING_PREAMBLE: &str = "You are answering questions about documents the user uploaded. \
Use only the excerpts below to answer. If the excerpts do not contain the answer, say so \
instead of guessing.";

/// One user's document-chat state: the current embedding index, the
/// extracted document text, and the append-only conversation history.
///
/// All state lives here rather than in process-wide globals; the caller owns
/// the session and passes it into every pipeline operation. A new process
/// action replaces the index and document wholesale, and only after the new
/// build has succeeded.
pub struct ChatSession<E, C> {
    embeddings: E,
    chat: C,
    chunking: ChunkingConfig,
    options: SessionOptions,
    index: Option<EmbeddingIndex>,
    document: Option<String>,
    history: Vec<ConversationTurn>,
}

impl<E, C> ChatSession<E, C>
where
    E: EmbeddingProvider + Sync,
    C: ChatProvider + Sync,
{
    pub fn new(embeddings: E, chat: C) -> Self {
        Self::with_options(embeddings, chat, ChunkingConfig::default(), SessionOptions::default())
    }

    pub fn with_options(
        embeddings: E,
        chat: C,
        chunking: ChunkingConfig,
        options: SessionOptions,
    ) -> Self {
        Self {
            embeddings,
            chat,
            chunking,
            options,
            index: None,
            document: None,
            history: Vec::new(),
        }
    }

    /// Runs the full ingestion pipeline over a batch of uploaded PDFs:
    /// extract, chunk, embed, index. Returns the number of indexed chunks.
    pub async fn process_documents<P: AsRef<[u8]>>(
        &mut self,
        payloads: &[P],
    ) -> Result<usize, ProcessError> {
        let document = extract_document(payloads)?;
        self.process_text(document).await
    }

    /// Chunks and indexes an already-extracted document. The previous index
    /// and document survive untouched if the build fails.
    pub async fn process_text(&mut self, document: String) -> Result<usize, ProcessError> {
        self.chunking.validate()?;

        let chunks = split_text(&document, &self.chunking);
        tracing::info!(
            document_chars = document.chars().count(),
            chunk_count = chunks.len(),
            "processing document"
        );

        let index = EmbeddingIndex::build(chunks, &self.embeddings).await?;
        let indexed = index.len();

        self.index = Some(index);
        self.document = Some(document);
        Ok(indexed)
    }

    /// Answers a question grounded in the indexed documents and records the
    /// exchange in the conversation history.
    pub async fn ask(&mut self, question: &str) -> Result<String, GenerationError> {
        let index = self.index.as_ref().ok_or(GenerationError::IndexNotBuilt)?;

        let retrieved = index
            .query(question, self.options.retrieval_width, &self.embeddings)
            .await?;
        tracing::debug!(retrieved = retrieved.len(), "grounding chunks retrieved");

        let messages = self.build_prompt(&retrieved, question);
        let answer = self.chat.complete(&messages).await?;

        self.history.push(ConversationTurn {
            question: question.to_string(),
            answer: answer.clone(),
            asked_at: Utc::now(),
        });

        Ok(answer)
    }

    fn build_prompt(&self, retrieved: &[RetrievedChunk], question: &str) -> Vec<ChatMessage> {
        let mut grounding = String::from(GROUNDING_PREAMBLE);
        for (number, chunk) in retrieved.iter().enumerate() {
            grounding.push_str(&format!("\n\n[excerpt {}]\n{}", number + 1, chunk.text));
        }

        let mut messages = vec![ChatMessage::system(grounding)];

        let replay_from = self
            .history
            .len()
            .saturating_sub(self.options.prompt_history_turns);
        for turn in &self.history[replay_from..] {
            messages.push(ChatMessage::user(turn.question.clone()));
            messages.push(ChatMessage::assistant(turn.answer.clone()));
        }

        messages.push(ChatMessage::user(question));
        messages
    }

    /// One-shot summary of the extracted document text.
    pub async fn summarize(&self) -> Result<String, GenerationError> {
        let document = self.document.as_deref().ok_or(GenerationError::NoDocument)?;

        let messages = vec![
            ChatMessage::system(
                "Summarize the following document in a few short sentences.",
            ),
            ChatMessage::user(document.to_string()),
        ];
        Ok(self.chat.complete(&messages).await?)
    }

    /// Generates example questions a reader might ask about the document,
    /// one per line.
    pub async fn suggest_questions(&self, count: usize) -> Result<Vec<String>, GenerationError> {
        let document = self.document.as_deref().ok_or(GenerationError::NoDocument)?;

        let messages = vec![
            ChatMessage::system(format!(
                "Generate {count} example questions a reader might ask about the following \
document. Reply with one question per line and nothing else.",
            )),
            ChatMessage::user(document.to_string()),
        ];
        let reply = self.chat.complete(&messages).await?;

        Ok(reply
            .lines()
            .map(strip_list_marker)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .take(count)
            .collect())
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn index(&self) -> Option<&EmbeddingIndex> {
        self.index.as_ref()
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Clears history, index, and document. The only way history shrinks.
    pub fn reset(&mut self) {
        self.index = None;
        self.document = None;
        self.history.clear();
    }
}

fn strip_list_marker(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(['.', ')', '-', '*'])
        .trim_start()
}

#[cfg(test)]
mod tests {
    use super::{strip_list_marker, ChatSession};
    use crate::error::{GenerationError, ProviderError};
    use crate::models::{ChatMessage, Role};
    use crate::providers::{ChatProvider, EmbeddingProvider};
    use async_trait::async_trait;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    struct HashingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for HashingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
            let mut vector = vec![0.0f32; 64];
            for token in text.split_whitespace() {
                let mut hasher = DefaultHasher::new();
                token.to_lowercase().hash(&mut hasher);
                vector[(hasher.finish() as usize) % 64] += 1.0;
            }
            Ok(vector)
        }
    }

    /// Echoes the last user message so tests can see what was asked.
    struct EchoChat;

    #[async_trait]
    impl ChatProvider for EchoChat {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
            let last_user = messages
                .iter()
                .rev()
                .find(|message| message.role == Role::User)
                .map(|message| message.content.clone())
                .unwrap_or_default();
            Ok(format!("answer to: {last_user}"))
        }
    }

    struct ScriptedChat {
        reply: String,
    }

    #[async_trait]
    impl ChatProvider for ScriptedChat {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, ProviderError> {
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn ask_before_process_is_a_precondition_violation() {
        let mut session = ChatSession::new(HashingEmbedder, EchoChat);
        let result = session.ask("what is this about?").await;
        assert!(matches!(result, Err(GenerationError::IndexNotBuilt)));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn sequential_asks_append_turns_in_call_order() {
        let mut session = ChatSession::new(HashingEmbedder, EchoChat);
        session
            .process_text("cats are great\ndogs are loyal".to_string())
            .await
            .expect("processing succeeds");

        let first = session.ask("first question").await.expect("ask succeeds");
        let second = session.ask("second question").await.expect("ask succeeds");

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "first question");
        assert_eq!(history[0].answer, first);
        assert_eq!(history[1].question, "second question");
        assert_eq!(history[1].answer, second);
    }

    #[tokio::test]
    async fn reprocessing_replaces_the_index_wholesale() {
        let mut session = ChatSession::new(HashingEmbedder, EchoChat);
        session
            .process_text("one\ntwo".to_string())
            .await
            .expect("processing succeeds");
        let first_build = session.index().expect("index exists").build_id();

        session
            .process_text("three\nfour".to_string())
            .await
            .expect("processing succeeds");
        let second_build = session.index().expect("index exists").build_id();

        assert_ne!(first_build, second_build);
    }

    #[tokio::test]
    async fn summarize_without_document_fails() {
        let session = ChatSession::new(HashingEmbedder, EchoChat);
        let result = session.summarize().await;
        assert!(matches!(result, Err(GenerationError::NoDocument)));
    }

    #[tokio::test]
    async fn suggested_questions_are_parsed_one_per_line() {
        let mut session = ChatSession::new(
            HashingEmbedder,
            ScriptedChat {
                reply: "1. What is a cat?\n2) Why are dogs loyal?\n- Do birds fly?".to_string(),
            },
        );
        session
            .process_text("cats and dogs and birds".to_string())
            .await
            .expect("processing succeeds");

        let questions = session.suggest_questions(3).await.expect("suggestion succeeds");
        assert_eq!(
            questions,
            vec![
                "What is a cat?".to_string(),
                "Why are dogs loyal?".to_string(),
                "Do birds fly?".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn reset_clears_history_index_and_document() {
        let mut session = ChatSession::new(HashingEmbedder, EchoChat);
        session
            .process_text("some text".to_string())
            .await
            .expect("processing succeeds");
        session.ask("a question").await.expect("ask succeeds");

        session.reset();
        assert!(session.history().is_empty());
        assert!(session.index().is_none());
        assert!(session.document().is_none());
    }

    #[tokio::test]
    async fn oversized_page_text_yields_two_chunks_end_to_end() {
        let payload = crate::extractor::test_pdf_with_text(&"A".repeat(1_500));
        let mut session = ChatSession::new(HashingEmbedder, EchoChat);
        let indexed = session
            .process_documents(&[payload])
            .await
            .expect("processing succeeds");
        assert_eq!(indexed, 2);
    }

    #[test]
    fn list_markers_are_stripped() {
        assert_eq!(strip_list_marker("3. Why?"), "Why?");
        assert_eq!(strip_list_marker("- Why?"), "Why?");
        assert_eq!(strip_list_marker("Why?"), "Why?");
    }
}
