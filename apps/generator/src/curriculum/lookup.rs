//! Curriculum Lookup: read-only access to the curriculum tables.
//!
//! `AppState` holds an `Arc<dyn LookupService>`; `PgLookupService` is the
//! Postgres-backed implementation and tests substitute in-memory fakes.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use crate::errors::AppError;
use crate::models::curriculum::{
    GrammarAchievementRow, GrammarCategoryRow, GrammarTopicRow, ReadingTypeRow,
    VocabularyAchievementRow, VocabularyCategoryRow, WordLevel,
};

/// Read-only curriculum lookups. Every list comes back in curriculum order.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn words_by_level(&self, level: WordLevel) -> Result<Vec<String>, AppError>;

    async fn grammar_categories(&self) -> Result<Vec<GrammarCategoryRow>, AppError>;

    async fn grammar_topics_by_category(
        &self,
        category_id: i32,
    ) -> Result<Vec<GrammarTopicRow>, AppError>;

    async fn achievements_by_topic(
        &self,
        topic_id: i32,
    ) -> Result<Vec<GrammarAchievementRow>, AppError>;

    async fn reading_types(&self) -> Result<Vec<ReadingTypeRow>, AppError>;

    async fn vocabulary_categories(&self) -> Result<Vec<VocabularyCategoryRow>, AppError>;

    async fn vocabulary_achievements(
        &self,
        category_id: i32,
    ) -> Result<Vec<VocabularyAchievementRow>, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct PgLookupService {
    pool: PgPool,
}

impl PgLookupService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LookupService for PgLookupService {
    async fn words_by_level(&self, level: WordLevel) -> Result<Vec<String>, AppError> {
        let words = sqlx::query_scalar::<_, String>(
            "SELECT word FROM words WHERE level = $1 ORDER BY id",
        )
        .bind(level.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(words)
    }

    async fn grammar_categories(&self) -> Result<Vec<GrammarCategoryRow>, AppError> {
        let rows = sqlx::query_as::<_, GrammarCategoryRow>(
            "SELECT * FROM grammar_categories ORDER BY order_num, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn grammar_topics_by_category(
        &self,
        category_id: i32,
    ) -> Result<Vec<GrammarTopicRow>, AppError> {
        let rows = sqlx::query_as::<_, GrammarTopicRow>(
            "SELECT * FROM grammar_topics WHERE category_id = $1 ORDER BY order_num, id",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn achievements_by_topic(
        &self,
        topic_id: i32,
    ) -> Result<Vec<GrammarAchievementRow>, AppError> {
        let rows = sqlx::query_as::<_, GrammarAchievementRow>(
            "SELECT * FROM grammar_achievements WHERE topic_id = $1 ORDER BY id",
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn reading_types(&self) -> Result<Vec<ReadingTypeRow>, AppError> {
        let rows = sqlx::query_as::<_, ReadingTypeRow>(
            "SELECT * FROM reading_types ORDER BY order_num, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn vocabulary_categories(&self) -> Result<Vec<VocabularyCategoryRow>, AppError> {
        let rows = sqlx::query_as::<_, VocabularyCategoryRow>(
            "SELECT * FROM vocabulary_categories ORDER BY order_num, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn vocabulary_achievements(
        &self,
        category_id: i32,
    ) -> Result<Vec<VocabularyAchievementRow>, AppError> {
        let rows = sqlx::query_as::<_, VocabularyAchievementRow>(
            "SELECT * FROM vocabulary_achievements WHERE category_id = $1 ORDER BY id",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Degraded-mode word lists
// ────────────────────────────────────────────────────────────────────────────

const DEFAULT_BASIC_WORDS: &[&str] = &[
    "school", "friend", "family", "happy", "book", "play", "weekend", "lunch", "music", "walk",
];
const DEFAULT_MIDDLE_WORDS: &[&str] = &[
    "experience", "environment", "volunteer", "decide", "culture", "healthy", "improve",
    "project", "invite", "protect",
];
const DEFAULT_HIGH_WORDS: &[&str] = &[
    "responsibility", "opportunity", "consequence", "participate", "sustainable", "influence",
    "perspective", "achievement", "community", "efficient",
];

pub fn default_words(level: WordLevel) -> Vec<String> {
    let words = match level {
        WordLevel::Basic => DEFAULT_BASIC_WORDS,
        WordLevel::Middle => DEFAULT_MIDDLE_WORDS,
        WordLevel::High => DEFAULT_HIGH_WORDS,
    };
    words.iter().map(|w| w.to_string()).collect()
}

/// Words for `level`, or the built-in list when the lookup fails or is empty.
pub async fn words_or_default(lookup: &dyn LookupService, level: WordLevel) -> Vec<String> {
    match lookup.words_by_level(level).await {
        Ok(words) if !words.is_empty() => words,
        Ok(_) => {
            warn!("No words stored for level {}; using defaults", level.as_str());
            default_words(level)
        }
        Err(e) => {
            warn!(
                "Word lookup for level {} failed: {e}; using defaults",
                level.as_str()
            );
            default_words(level)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lookup fake: fixed words for `middle`, nothing for `basic`, error for `high`.
    struct PartialLookup;

    #[async_trait]
    impl LookupService for PartialLookup {
        async fn words_by_level(&self, level: WordLevel) -> Result<Vec<String>, AppError> {
            match level {
                WordLevel::Middle => Ok(vec!["orbit".to_string(), "planet".to_string()]),
                WordLevel::Basic => Ok(vec![]),
                WordLevel::High => Err(AppError::Lookup(sqlx::Error::PoolTimedOut)),
            }
        }
        async fn grammar_categories(&self) -> Result<Vec<GrammarCategoryRow>, AppError> {
            Ok(vec![])
        }
        async fn grammar_topics_by_category(
            &self,
            _category_id: i32,
        ) -> Result<Vec<GrammarTopicRow>, AppError> {
            Ok(vec![])
        }
        async fn achievements_by_topic(
            &self,
            _topic_id: i32,
        ) -> Result<Vec<GrammarAchievementRow>, AppError> {
            Ok(vec![])
        }
        async fn reading_types(&self) -> Result<Vec<ReadingTypeRow>, AppError> {
            Ok(vec![])
        }
        async fn vocabulary_categories(&self) -> Result<Vec<VocabularyCategoryRow>, AppError> {
            Ok(vec![])
        }
        async fn vocabulary_achievements(
            &self,
            _category_id: i32,
        ) -> Result<Vec<VocabularyAchievementRow>, AppError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_stored_words_are_used() {
        let words = words_or_default(&PartialLookup, WordLevel::Middle).await;
        assert_eq!(words, vec!["orbit", "planet"]);
    }

    #[tokio::test]
    async fn test_empty_result_falls_back_to_defaults() {
        let words = words_or_default(&PartialLookup, WordLevel::Basic).await;
        assert_eq!(words, default_words(WordLevel::Basic));
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_to_defaults() {
        let words = words_or_default(&PartialLookup, WordLevel::High).await;
        assert_eq!(words, default_words(WordLevel::High));
    }
}
