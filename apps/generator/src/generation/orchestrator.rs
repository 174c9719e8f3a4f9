//! Content Assembly: turns a plan into a bundle of passages, sentences,
//! questions and answers.
//!
//! Flow: per-item passage generation (plan order, bounded concurrency) →
//!       pool validation → one integrated question call → one integrated answer call.
//!
//! Never fails: every error is logged, recorded in `bundle.failures`, and the
//! partial bundle is returned.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::{timeout_at, Instant};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::curriculum::hints::{learner_level, GenerationSizes};
use crate::curriculum::lookup::{words_or_default, LookupService};
use crate::generation::service::{
    AnswerParams, GenerationError, GenerationService, PassageParams, PassagePayload,
    QuestionParams,
};
use crate::models::bundle::{GeneratedBundle, Passage, Question, Sentence, SourceTag, Stage};
use crate::models::curriculum::WordLevel;
use crate::models::request::ContentRequest;
use crate::planning::aggregator::summarize;
use crate::planning::planner::{Plan, WorkItem};

/// Words from the level list included in each passage prompt.
const WORD_HINT_LIMIT: usize = 20;

/// Concurrency and time limits for one run.
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    /// Work items generated at once. 1 reproduces strictly sequential behaviour.
    pub concurrency: usize,
    pub item_timeout: Duration,
    /// Applies to each of the two integrated calls.
    pub stage_timeout: Duration,
    pub run_deadline: Duration,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            item_timeout: Duration::from_secs(120),
            stage_timeout: Duration::from_secs(300),
            run_deadline: Duration::from_secs(1800),
        }
    }
}

impl AssemblyOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.generation_concurrency.max(1),
            item_timeout: Duration::from_secs(config.item_timeout_secs),
            stage_timeout: Duration::from_secs(config.stage_timeout_secs),
            run_deadline: Duration::from_secs(config.run_deadline_secs),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Assembly pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs the full assembly for a planned request.
pub async fn assemble(
    request: &ContentRequest,
    plan: Plan,
    lookup: &dyn LookupService,
    generator: &dyn GenerationService,
    options: &AssemblyOptions,
) -> GeneratedBundle {
    let deadline = Instant::now() + options.run_deadline;
    let summary = summarize(&plan.items);
    let mut bundle = GeneratedBundle::new(plan, summary);

    // Stage 1: per-item generation. `buffered` yields in plan order regardless
    // of completion order, so pooling stays deterministic.
    info!(
        "Generating material for {} work items (concurrency {})",
        bundle.plan.items.len(),
        options.concurrency
    );
    // Built eagerly; a lazy stream `map` closure breaks the `Send` bound axum needs.
    let item_calls: Vec<_> = bundle
        .plan
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            generate_item(index, item, request, lookup, generator, options, deadline)
        })
        .collect();
    let outcomes: Vec<Result<PassagePayload, GenerationError>> = stream::iter(item_calls)
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(payload) => {
                let tag = SourceTag::from(&bundle.plan.items[index]);
                pool_payload(&mut bundle, payload, &tag);
            }
            Err(e) => {
                bundle.record_failure(Stage::PerItemGeneration, Some(index), e.to_string());
            }
        }
    }
    info!(
        "Pooled {} passages and {} sentences",
        bundle.passages.len(),
        bundle.sentences.len()
    );

    // Stage 2: pool validation
    if bundle.passages.is_empty() || bundle.sentences.is_empty() {
        warn!(
            "Pool has {} passages and {} sentences; skipping question generation",
            bundle.passages.len(),
            bundle.sentences.len()
        );
        bundle.record_failure(
            Stage::PoolValidation,
            None,
            "no source material: need at least one passage and one sentence".to_string(),
        );
        return bundle;
    }

    let combined_passages = combine_passages(&bundle.passages);
    let combined_sentences = combine_sentences(&bundle.sentences);

    // Stage 3: one question call over the whole pool
    let question_params = QuestionParams {
        passages: combined_passages.clone(),
        sentences: combined_sentences.clone(),
        question_count: request.total_questions,
        question_type: request.question_type.clone(),
        learning_objective: learning_objective(request),
    };
    let questions = run_stage(
        Stage::QuestionGeneration,
        options.stage_timeout,
        deadline,
        generator.generate_questions(&question_params),
    )
    .await;
    match questions {
        Ok(questions) => {
            info!(
                "Generated {} questions (requested {})",
                questions.len(),
                request.total_questions
            );
            bundle.questions = questions;
        }
        Err(e) => {
            bundle.record_failure(Stage::QuestionGeneration, None, e.to_string());
            return bundle;
        }
    }

    if bundle.questions.is_empty() {
        warn!("Question generation returned no questions; skipping answers");
        return bundle;
    }

    // Stage 4: one answer call for all questions
    let answer_params = AnswerParams {
        passages: combined_passages,
        sentences: combined_sentences,
        questions: serialize_questions(&bundle.questions),
    };
    let answers = run_stage(
        Stage::AnswerGeneration,
        options.stage_timeout,
        deadline,
        generator.generate_answers(&answer_params),
    )
    .await;
    match answers {
        Ok(answers) => {
            info!("Generated {} answers", answers.len());
            bundle.answers = answers;
        }
        Err(e) => bundle.record_failure(Stage::AnswerGeneration, None, e.to_string()),
    }

    bundle
}

/// Builds the passage call for one work item and runs it under its deadline.
async fn generate_item(
    index: usize,
    item: &WorkItem,
    request: &ContentRequest,
    lookup: &dyn LookupService,
    generator: &dyn GenerationService,
    options: &AssemblyOptions,
    run_deadline: Instant,
) -> Result<PassagePayload, GenerationError> {
    info!(
        "Item {}: {}/{} tier={} count={}",
        index + 1,
        item.category,
        item.subcategory,
        item.tier,
        item.count
    );

    let started = Instant::now();
    let item_deadline = (started + options.item_timeout).min(run_deadline);
    let params = build_passage_params(request, item, lookup);
    let result = match timeout_at(item_deadline, async {
        let params = params.await;
        generator.generate_passages_and_sentences(&params).await
    })
    .await
    {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout(
            item_deadline.saturating_duration_since(started),
        )),
    };

    if let Err(e) = &result {
        error!(
            "Item {} ({}/{} {}) failed: {e}",
            index + 1,
            item.category,
            item.subcategory,
            item.tier
        );
    }
    result
}

async fn build_passage_params(
    request: &ContentRequest,
    item: &WorkItem,
    lookup: &dyn LookupService,
) -> PassageParams {
    let words = words_or_default(lookup, WordLevel::from(item.tier)).await;
    let word_list = words
        .iter()
        .take(WORD_HINT_LIMIT)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let hints = item.category.resolve_hints(&item.subcategory);
    let sizes = GenerationSizes::for_item(item.count, item.tier);

    PassageParams {
        level: learner_level(request.grade),
        passage_count: sizes.passage_count,
        passage_length: sizes.passage_length,
        sentence_count: sizes.sentence_count,
        sentence_length: sizes.sentence_length,
        word_list,
        grammar_point: hints.grammar_point,
        reading_type: hints.reading_type,
        topic: hints.topic,
    }
}

/// Runs an integrated call under the stage timeout, capped by the run deadline.
async fn run_stage<T>(
    stage: Stage,
    stage_timeout: Duration,
    run_deadline: Instant,
    call: impl std::future::Future<Output = Result<T, GenerationError>>,
) -> Result<T, GenerationError> {
    let started = Instant::now();
    let stage_deadline = (started + stage_timeout).min(run_deadline);
    let result = match timeout_at(stage_deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout(
            stage_deadline.saturating_duration_since(started),
        )),
    };
    if let Err(e) = &result {
        error!("{:?} failed: {e}", stage);
    }
    result
}

/// Appends a payload to the pool, tagging everything with its work item.
fn pool_payload(bundle: &mut GeneratedBundle, payload: PassagePayload, tag: &SourceTag) {
    bundle
        .passages
        .extend(payload.passages.into_iter().map(|p| Passage {
            title: p.title,
            content: p.content,
            korean_translation: p.korean_translation,
            source: tag.clone(),
        }));
    bundle
        .sentences
        .extend(payload.sentences.into_iter().map(|s| Sentence {
            english: s.english,
            korean: s.korean,
            source: tag.clone(),
        }));
}

// ────────────────────────────────────────────────────────────────────────────
// Pool serialization
// ────────────────────────────────────────────────────────────────────────────

fn combine_passages(passages: &[Passage]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[Passage {}] {}\n{}", i + 1, p.title, p.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn combine_sentences(sentences: &[Sentence]) -> String {
    sentences
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s.english))
        .collect::<Vec<_>>()
        .join("\n")
}

fn serialize_questions(questions: &[Question]) -> String {
    questions
        .iter()
        .map(|q| {
            let mut block = format!("Question {}: {}\n", q.id, q.question);
            if let Some(modified) = q.modified_passage.as_deref().filter(|m| !m.is_empty()) {
                block.push_str(&format!("Modified passage: {modified}\n"));
            }
            for choice in &q.choices {
                block.push_str(choice);
                block.push('\n');
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// "reading (main idea, details); grammar (present perfect)" in request order.
fn learning_objective(request: &ContentRequest) -> String {
    request
        .categories
        .iter()
        .filter(|c| c.ratio > 0.0)
        .map(|c| format!("{} ({})", c.kind, c.subcategories.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
