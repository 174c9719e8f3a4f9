//! Axum route handlers for the read-only Curriculum API.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::AppError;
use crate::models::curriculum::{
    GrammarAchievementRow, GrammarCategoryRow, GrammarTopicRow, ReadingTypeRow,
    VocabularyAchievementRow, VocabularyCategoryRow, WordLevel,
};
use crate::state::AppState;

/// GET /api/v1/curriculum/grammar-categories
pub async fn handle_grammar_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<GrammarCategoryRow>>, AppError> {
    Ok(Json(state.lookup.grammar_categories().await?))
}

/// GET /api/v1/curriculum/grammar-categories/:id/topics
pub async fn handle_grammar_topics(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> Result<Json<Vec<GrammarTopicRow>>, AppError> {
    Ok(Json(state.lookup.grammar_topics_by_category(category_id).await?))
}

/// GET /api/v1/curriculum/grammar-topics/:id/achievements
pub async fn handle_grammar_achievements(
    State(state): State<AppState>,
    Path(topic_id): Path<i32>,
) -> Result<Json<Vec<GrammarAchievementRow>>, AppError> {
    Ok(Json(state.lookup.achievements_by_topic(topic_id).await?))
}

/// GET /api/v1/curriculum/reading-types
pub async fn handle_reading_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReadingTypeRow>>, AppError> {
    Ok(Json(state.lookup.reading_types().await?))
}

/// GET /api/v1/curriculum/vocabulary-categories
pub async fn handle_vocabulary_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<VocabularyCategoryRow>>, AppError> {
    Ok(Json(state.lookup.vocabulary_categories().await?))
}

/// GET /api/v1/curriculum/vocabulary-categories/:id/achievements
pub async fn handle_vocabulary_achievements(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> Result<Json<Vec<VocabularyAchievementRow>>, AppError> {
    Ok(Json(state.lookup.vocabulary_achievements(category_id).await?))
}

/// GET /api/v1/curriculum/words/:level
///
/// `level` is basic, middle or high. Returns stored words only (no fallback list).
pub async fn handle_words(
    State(state): State<AppState>,
    Path(level): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    let level = WordLevel::parse(&level)
        .ok_or_else(|| AppError::Validation(format!("Unknown word level '{level}'")))?;
    Ok(Json(state.lookup.words_by_level(level).await?))
}
