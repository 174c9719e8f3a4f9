pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::curriculum::handlers as curriculum;
use crate::generation::handlers as content;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Content API
        .route("/api/v1/content/plan", post(content::handle_plan))
        .route("/api/v1/content/generate", post(content::handle_generate))
        // Curriculum API (read-only)
        .route(
            "/api/v1/curriculum/grammar-categories",
            get(curriculum::handle_grammar_categories),
        )
        .route(
            "/api/v1/curriculum/grammar-categories/:id/topics",
            get(curriculum::handle_grammar_topics),
        )
        .route(
            "/api/v1/curriculum/grammar-topics/:id/achievements",
            get(curriculum::handle_grammar_achievements),
        )
        .route(
            "/api/v1/curriculum/reading-types",
            get(curriculum::handle_reading_types),
        )
        .route(
            "/api/v1/curriculum/vocabulary-categories",
            get(curriculum::handle_vocabulary_categories),
        )
        .route(
            "/api/v1/curriculum/vocabulary-categories/:id/achievements",
            get(curriculum::handle_vocabulary_achievements),
        )
        .route(
            "/api/v1/curriculum/words/:level",
            get(curriculum::handle_words),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::curriculum::lookup::LookupService;
    use crate::errors::AppError;
    use crate::generation::orchestrator::AssemblyOptions;
    use crate::generation::service::{
        AnswerParams, GenerationError, GenerationService, PassageParams, PassagePayload,
        QuestionParams,
    };
    use crate::models::bundle::{Answer, Question};
    use crate::models::curriculum::{
        GrammarAchievementRow, GrammarCategoryRow, GrammarTopicRow, ReadingTypeRow,
        VocabularyAchievementRow, VocabularyCategoryRow, WordLevel,
    };

    struct EmptyLookup;

    #[async_trait]
    impl LookupService for EmptyLookup {
        async fn words_by_level(&self, level: WordLevel) -> Result<Vec<String>, AppError> {
            Ok(vec![format!("{}-word", level.as_str())])
        }
        async fn grammar_categories(&self) -> Result<Vec<GrammarCategoryRow>, AppError> {
            Ok(vec![])
        }
        async fn grammar_topics_by_category(&self, _: i32) -> Result<Vec<GrammarTopicRow>, AppError> {
            Ok(vec![])
        }
        async fn achievements_by_topic(&self, _: i32) -> Result<Vec<GrammarAchievementRow>, AppError> {
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
            _: i32,
        ) -> Result<Vec<VocabularyAchievementRow>, AppError> {
            Ok(vec![])
        }
    }

    /// Every call fails, so generate runs end with an empty pool.
    struct FailingGenerator;

    #[async_trait]
    impl GenerationService for FailingGenerator {
        async fn generate_passages_and_sentences(
            &self,
            _: &PassageParams,
        ) -> Result<PassagePayload, GenerationError> {
            Err(GenerationError::Malformed("offline".to_string()))
        }
        async fn generate_questions(&self, _: &QuestionParams) -> Result<Vec<Question>, GenerationError> {
            Err(GenerationError::Malformed("offline".to_string()))
        }
        async fn generate_answers(&self, _: &AnswerParams) -> Result<Vec<Answer>, GenerationError> {
            Err(GenerationError::Malformed("offline".to_string()))
        }
    }

    fn test_router() -> Router {
        let config = Config {
            database_url: "postgres://localhost/test".to_string(),
            gemini_api_key: "test-key".to_string(),
            gemini_model: "test-model".to_string(),
            port: 0,
            rust_log: "info".to_string(),
            generation_concurrency: 1,
            item_timeout_secs: 5,
            stage_timeout_secs: 5,
            run_deadline_secs: 30,
        };
        build_router(AppState {
            lookup: Arc::new(EmptyLookup),
            generator: Arc::new(FailingGenerator),
            assembly: AssemblyOptions::from_config(&config),
            config,
        })
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = test_router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_model() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "generator");
        assert_eq!(body["model"], "test-model");
    }

    #[tokio::test]
    async fn test_plan_route_rejects_invalid_request() {
        let (status, body) = send(post_json(
            "/api/v1/content/plan",
            r#"{"grade": 2, "categories": [], "difficulty": "low", "total_questions": 5}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_route_returns_partial_bundle() {
        let (status, body) = send(post_json(
            "/api/v1/content/generate",
            r#"{"grade": 2, "categories": [{"name": "grammar", "subcategories": ["tense"], "ratio": 100}],
                "difficulty": "medium", "total_questions": 3}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["questions"].as_array().unwrap().len(), 0);
        let stages: Vec<&str> = body["failures"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["stage"].as_str().unwrap())
            .collect();
        assert_eq!(stages, vec!["per_item_generation", "pool_validation"]);
    }

    #[tokio::test]
    async fn test_unknown_word_level_is_rejected() {
        let request = Request::builder()
            .uri("/api/v1/curriculum/words/expert")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
