use serde::{Deserialize, Serialize};

use crate::models::request::{CategoryKind, Tier};
use crate::planning::aggregator::PlanSummary;
use crate::planning::planner::{Plan, WorkItem};

/// Provenance of pooled material: the work item that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTag {
    pub category: CategoryKind,
    pub subcategory: String,
    pub tier: Tier,
}

impl From<&WorkItem> for SourceTag {
    fn from(item: &WorkItem) -> Self {
        Self {
            category: item.category,
            subcategory: item.subcategory.clone(),
            tier: item.tier,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub title: String,
    pub content: String,
    pub korean_translation: String,
    pub source: SourceTag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    pub english: String,
    pub korean: String,
    pub source: SourceTag,
}

/// A generated question. Choices carry their own labels, e.g. "(A) ...".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub question: String,
    #[serde(default)]
    pub modified_passage: Option<String>,
    pub choices: Vec<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub modification_type: String,
    #[serde(default)]
    pub learning_objective: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub main: String,
    #[serde(default)]
    pub distractors: String,
    #[serde(default)]
    pub learning_point: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: u32,
    pub correct_choice: String,
    pub explanation: Explanation,
}

/// Orchestration stage a failure was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PerItemGeneration,
    PoolValidation,
    QuestionGeneration,
    AnswerGeneration,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    /// Plan index of the work item, for per-item failures.
    pub item_index: Option<usize>,
    pub detail: String,
}

/// Final artifact of a run. Any subset of the content vectors may be empty
/// when a stage failed; `failures` says which and why.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedBundle {
    pub plan: Plan,
    pub summary: PlanSummary,
    pub passages: Vec<Passage>,
    pub sentences: Vec<Sentence>,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    pub failures: Vec<StageFailure>,
}

impl GeneratedBundle {
    pub fn new(plan: Plan, summary: PlanSummary) -> Self {
        Self {
            plan,
            summary,
            passages: Vec::new(),
            sentences: Vec::new(),
            questions: Vec::new(),
            answers: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, stage: Stage, item_index: Option<usize>, detail: String) {
        self.failures.push(StageFailure {
            stage,
            item_index,
            detail,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_optional_fields_default() {
        let json = r#"{
            "id": 3,
            "question": "What is the main idea?",
            "choices": ["(A) a", "(B) b", "(C) c", "(D) d"]
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.id, 3);
        assert!(q.modified_passage.is_none());
        assert!(q.source.is_empty());
        assert_eq!(q.choices.len(), 4);
    }

    #[test]
    fn test_answer_requires_explanation() {
        let json = r#"{"question_id": 1, "correct_choice": "(B)"}"#;
        let result: Result<Answer, _> = serde_json::from_str(json);
        assert!(result.is_err(), "Answer without explanation must fail deserialization");
    }

    #[test]
    fn test_source_tag_from_work_item() {
        let item = WorkItem {
            category: CategoryKind::Vocabulary,
            subcategory: "daily life".to_string(),
            count: 2,
            tier: Tier::Low,
        };
        let tag = SourceTag::from(&item);
        assert_eq!(tag.category, CategoryKind::Vocabulary);
        assert_eq!(tag.subcategory, "daily life");
        assert_eq!(tag.tier, Tier::Low);
    }
}
