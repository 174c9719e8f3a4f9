//! Per-item generation hints: what each category contributes to a passage prompt,
//! and how large the requested material should be.

use serde::Serialize;

use crate::models::request::{CategoryKind, Tier};

const DEFAULT_GRAMMAR_POINT: &str = "grammar structures appropriate to the learner level";
const DEFAULT_READING_TYPE: &str = "main idea and detail comprehension";
const DEFAULT_TOPIC: &str = "school, family, and community life of middle school students";

/// Passages are shared by up to this many questions.
const QUESTIONS_PER_PASSAGE: u32 = 3;
const MIN_SENTENCES: u32 = 2;

/// Category-specific inputs to the passage prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemHints {
    pub grammar_point: String,
    pub reading_type: String,
    pub topic: String,
}

impl CategoryKind {
    /// The subcategory fills the slot its category owns; the others get defaults.
    pub fn resolve_hints(&self, subcategory: &str) -> ItemHints {
        match self {
            CategoryKind::Grammar => ItemHints {
                grammar_point: subcategory.to_string(),
                reading_type: DEFAULT_READING_TYPE.to_string(),
                topic: DEFAULT_TOPIC.to_string(),
            },
            CategoryKind::Reading => ItemHints {
                grammar_point: DEFAULT_GRAMMAR_POINT.to_string(),
                reading_type: subcategory.to_string(),
                topic: DEFAULT_TOPIC.to_string(),
            },
            // Vocabulary subcategories are themes ("personal and everyday life", ...)
            CategoryKind::Vocabulary => ItemHints {
                grammar_point: DEFAULT_GRAMMAR_POINT.to_string(),
                reading_type: DEFAULT_READING_TYPE.to_string(),
                topic: subcategory.to_string(),
            },
        }
    }
}

/// How much source material to request for one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationSizes {
    pub passage_count: u32,
    pub passage_length: u32,
    pub sentence_count: u32,
    pub sentence_length: u32,
}

impl GenerationSizes {
    pub fn for_item(count: u32, tier: Tier) -> Self {
        let (passage_length, sentence_length) = match tier {
            Tier::Low => (80, 8),
            Tier::Medium => (120, 12),
            Tier::High => (160, 16),
        };
        Self {
            passage_count: count.div_ceil(QUESTIONS_PER_PASSAGE).max(1),
            passage_length,
            sentence_count: count.max(MIN_SENTENCES),
            sentence_length,
        }
    }
}

pub fn learner_level(grade: u32) -> String {
    format!("Korean middle school grade {grade}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_category_owns_one_hint_slot() {
        let grammar = CategoryKind::Grammar.resolve_hints("present perfect");
        assert_eq!(grammar.grammar_point, "present perfect");
        assert_eq!(grammar.reading_type, DEFAULT_READING_TYPE);

        let reading = CategoryKind::Reading.resolve_hints("title inference");
        assert_eq!(reading.reading_type, "title inference");
        assert_eq!(reading.grammar_point, DEFAULT_GRAMMAR_POINT);

        let vocabulary = CategoryKind::Vocabulary.resolve_hints("personal life");
        assert_eq!(vocabulary.topic, "personal life");
        assert_eq!(vocabulary.grammar_point, DEFAULT_GRAMMAR_POINT);
    }

    #[test]
    fn test_sizes_scale_with_count_and_tier() {
        let small = GenerationSizes::for_item(1, Tier::Low);
        assert_eq!(small.passage_count, 1);
        assert_eq!(small.sentence_count, 2);
        assert_eq!(small.passage_length, 80);

        let large = GenerationSizes::for_item(7, Tier::High);
        assert_eq!(large.passage_count, 3);
        assert_eq!(large.sentence_count, 7);
        assert_eq!(large.sentence_length, 16);
    }

    #[test]
    fn test_learner_level_mentions_grade() {
        assert_eq!(learner_level(2), "Korean middle school grade 2");
    }
}
