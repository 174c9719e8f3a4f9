//! Generation Service: trait-based boundary to the language model.
//!
//! Default: `LlmGenerationService` (prompt templates + `LlmClient`).
//! The orchestrator only sees `&dyn GenerationService`, so tests substitute fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::generation::prompts::{ANSWER_PROMPT, PASSAGE_PROMPT, QUESTION_PROMPT};
use crate::llm_client::prompts::{JSON_BLOCK_SYSTEM, KOREAN_OUTPUT_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::bundle::{Answer, Question};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("response did not match the expected schema: {0}")]
    Malformed(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

// ────────────────────────────────────────────────────────────────────────────
// Parameters
// ────────────────────────────────────────────────────────────────────────────

/// Inputs for one work item's passage/sentence call.
#[derive(Debug, Clone, Serialize)]
pub struct PassageParams {
    pub level: String,
    pub passage_count: u32,
    pub passage_length: u32,
    pub sentence_count: u32,
    pub sentence_length: u32,
    pub word_list: String,
    pub grammar_point: String,
    pub reading_type: String,
    pub topic: String,
}

/// Inputs for the single integrated question call.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionParams {
    pub passages: String,
    pub sentences: String,
    pub question_count: u32,
    pub question_type: String,
    pub learning_objective: String,
}

/// Inputs for the single integrated answer call.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerParams {
    pub passages: String,
    pub sentences: String,
    pub questions: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Payloads (schema the model must return)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPassage {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub korean_translation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSentence {
    pub english: String,
    #[serde(default)]
    pub korean: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassagePayload {
    pub passages: Vec<GeneratedPassage>,
    pub sentences: Vec<GeneratedSentence>,
}

#[derive(Debug, Deserialize)]
struct QuestionPayload {
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct AnswerPayload {
    answers: Vec<Answer>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate_passages_and_sentences(
        &self,
        params: &PassageParams,
    ) -> Result<PassagePayload, GenerationError>;

    async fn generate_questions(
        &self,
        params: &QuestionParams,
    ) -> Result<Vec<Question>, GenerationError>;

    async fn generate_answers(&self, params: &AnswerParams)
        -> Result<Vec<Answer>, GenerationError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LlmGenerationService
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmGenerationService {
    llm: LlmClient,
}

impl LlmGenerationService {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl GenerationService for LlmGenerationService {
    async fn generate_passages_and_sentences(
        &self,
        params: &PassageParams,
    ) -> Result<PassagePayload, GenerationError> {
        let prompt = PASSAGE_PROMPT.fill(&[
            ("level", params.level.as_str()),
            ("passage_count", params.passage_count.to_string().as_str()),
            ("passage_length", params.passage_length.to_string().as_str()),
            ("sentence_count", params.sentence_count.to_string().as_str()),
            ("sentence_length", params.sentence_length.to_string().as_str()),
            ("word_list", params.word_list.as_str()),
            ("grammar_point", params.grammar_point.as_str()),
            ("reading_type", params.reading_type.as_str()),
            ("topic", params.topic.as_str()),
            ("language_instruction", KOREAN_OUTPUT_INSTRUCTION),
        ]);

        let payload: PassagePayload = self.call_structured(&prompt).await?;
        info!(
            "Passage call returned {} passages, {} sentences",
            payload.passages.len(),
            payload.sentences.len()
        );
        Ok(payload)
    }

    async fn generate_questions(
        &self,
        params: &QuestionParams,
    ) -> Result<Vec<Question>, GenerationError> {
        let prompt = QUESTION_PROMPT.fill(&[
            ("passages", params.passages.as_str()),
            ("sentences", params.sentences.as_str()),
            ("question_count", params.question_count.to_string().as_str()),
            ("question_type", params.question_type.as_str()),
            ("learning_objective", params.learning_objective.as_str()),
        ]);

        let payload: QuestionPayload = self.call_structured(&prompt).await?;
        Ok(payload.questions)
    }

    async fn generate_answers(
        &self,
        params: &AnswerParams,
    ) -> Result<Vec<Answer>, GenerationError> {
        let prompt = ANSWER_PROMPT.fill(&[
            ("passages", params.passages.as_str()),
            ("sentences", params.sentences.as_str()),
            ("questions", params.questions.as_str()),
            ("language_instruction", KOREAN_OUTPUT_INSTRUCTION),
        ]);

        let payload: AnswerPayload = self.call_structured(&prompt).await?;
        Ok(payload.answers)
    }
}

impl LlmGenerationService {
    async fn call_structured<T: serde::de::DeserializeOwned>(
        &self,
        prompt: &str,
    ) -> Result<T, GenerationError> {
        self.llm
            .call_json(prompt, JSON_BLOCK_SYSTEM)
            .await
            .map_err(|e| match e {
                LlmError::Parse(parse) => GenerationError::Malformed(parse.to_string()),
                other => GenerationError::Llm(other),
            })
    }
}
